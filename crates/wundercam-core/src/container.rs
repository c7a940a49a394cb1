// ── Resource container ──
//
// An immutable, point-in-time set of device files keyed by filename.
// Operations return new containers; nothing mutates one after
// construction, so containers are cheap to clone and share.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::metadata::{MediaKind, MetadataExtractor};
use crate::resource::{Resource, ResourceHandle, SequenceResource, SingleResource};

/// A listing entry that could not be turned into a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub filename: String,
    pub reason: String,
}

/// Result of [`ResourceContainer::from_listing`]: the container plus the
/// entries that were dropped.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub container: ResourceContainer,
    pub warnings: Vec<SkippedEntry>,
}

/// Snapshot of device files, ordered by capture time then sequence index.
#[derive(Debug, Clone, Default)]
pub struct ResourceContainer {
    resources: Arc<[SingleResource]>,
}

impl PartialEq for ResourceContainer {
    fn eq(&self, other: &Self) -> bool {
        self.resources.len() == other.resources.len()
            && self
                .resources
                .iter()
                .zip(other.resources.iter())
                .all(|(a, b)| a.identity() == b.identity())
    }
}

impl Eq for ResourceContainer {}

impl ResourceContainer {
    /// Build a container from raw directory entries.
    ///
    /// Entries that do not match the media kind's filename scheme are
    /// dropped and reported in [`Listing::warnings`].
    pub fn from_listing<I, S>(entries: I, kind: MediaKind, extractor: &MetadataExtractor) -> Listing
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut resources = Vec::new();
        let mut warnings = Vec::new();

        for entry in entries {
            let filename = entry.as_ref();
            match extractor.extract(filename, kind) {
                Ok(metadata) => {
                    let handle = ResourceHandle::new(kind.directory(), filename);
                    resources.push(SingleResource::with_handle(metadata, handle));
                }
                Err(err) => {
                    warn!(filename, %kind, error = %err, "skipping unrecognised file");
                    warnings.push(SkippedEntry {
                        filename: filename.to_owned(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        let container = Self::from_resources(resources);
        debug!(%kind, resources = container.len(), skipped = warnings.len(), "listing parsed");
        Listing {
            container,
            warnings,
        }
    }

    /// Build a container, dropping duplicate filenames (first wins).
    pub fn from_resources(resources: impl IntoIterator<Item = SingleResource>) -> Self {
        let mut seen = HashSet::new();
        let mut unique: Vec<_> = resources
            .into_iter()
            .filter(|r| seen.insert(r.identity().to_owned()))
            .collect();
        unique.sort_by(|a, b| {
            let ka = (a.metadata().captured_at, a.metadata().sequence_index, a.identity());
            let kb = (b.metadata().captured_at, b.metadata().sequence_index, b.identity());
            ka.cmp(&kb)
        });
        Self {
            resources: unique.into(),
        }
    }

    /// Resources in `after` whose filename is absent from `before`.
    ///
    /// This is `after - before`, not a symmetric difference. With the
    /// operands swapped the call is still valid, but when the card only
    /// gained files it returns an empty container: pass the newer
    /// snapshot first.
    pub fn difference(after: &Self, before: &Self) -> Self {
        let known: HashSet<&str> = before.resources.iter().map(SingleResource::identity).collect();
        let resources: Vec<_> = after
            .resources
            .iter()
            .filter(|r| !known.contains(r.identity()))
            .cloned()
            .collect();
        Self {
            resources: resources.into(),
        }
    }

    /// Merge two snapshots, e.g. the image and video listings.
    pub fn union(&self, other: &Self) -> Self {
        Self::from_resources(self.resources.iter().chain(other.resources.iter()).cloned())
    }

    /// Only the resources of one media kind.
    pub fn of_kind(&self, kind: MediaKind) -> Self {
        let resources: Vec<_> = self
            .resources
            .iter()
            .filter(|r| r.media_kind() == kind)
            .cloned()
            .collect();
        Self {
            resources: resources.into(),
        }
    }

    /// Partition into bursts and standalone files.
    ///
    /// Files sharing a session key collapse into a [`SequenceResource`];
    /// a session with a single file stays a [`Resource::Single`].
    /// Results are in session order.
    pub fn group(&self) -> Vec<Resource> {
        let mut sorted: Vec<&SingleResource> = self.resources.iter().collect();
        sorted.sort_by(|a, b| {
            (a.session_key(), a.metadata().sequence_index, a.identity()).cmp(&(
                b.session_key(),
                b.metadata().sequence_index,
                b.identity(),
            ))
        });

        let mut groups = Vec::new();
        let mut run: Vec<SingleResource> = Vec::new();
        for resource in sorted {
            if run.last().is_some_and(|last| last.session_key() != resource.session_key()) {
                groups.push(close_run(std::mem::take(&mut run)));
            }
            run.push(resource.clone());
        }
        if !run.is_empty() {
            groups.push(close_run(run));
        }
        groups
    }

    /// Stable iteration: capture time ascending, then sequence index.
    /// Each call starts from the beginning.
    pub fn items(&self) -> std::slice::Iter<'_, SingleResource> {
        self.resources.iter()
    }

    pub fn first(&self) -> Option<&SingleResource> {
        self.resources.first()
    }

    pub fn get(&self, filename: &str) -> Option<&SingleResource> {
        self.resources.iter().find(|r| r.identity() == filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.get(filename).is_some()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

fn close_run(mut run: Vec<SingleResource>) -> Resource {
    if run.len() == 1 {
        if let Some(single) = run.pop() {
            return Resource::Single(single);
        }
    }
    Resource::Sequence(SequenceResource::from_run(run))
}

impl<'a> IntoIterator for &'a ResourceContainer {
    type Item = &'a SingleResource;
    type IntoIter = std::slice::Iter<'a, SingleResource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items()
    }
}
