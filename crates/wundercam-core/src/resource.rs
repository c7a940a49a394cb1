// ── Resource model ──
//
// Device files as values. A `SingleResource` is one file; a
// `SequenceResource` is one burst, ordered by frame number. Retrieval
// and persistence go through the `Transport` seam.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::CoreError;
use crate::metadata::{MediaKind, ResourceMetadata, SessionKey};
use crate::transport::Transport;

/// Path of a file relative to the camera root, e.g. `DCIM/Image/Img_….jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn new(directory: &str, filename: &str) -> Self {
        let directory = directory.trim_end_matches('/');
        if directory.is_empty() {
            Self(filename.to_owned())
        } else {
            Self(format!("{directory}/{filename}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to hand a resource's content back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalView {
    /// Bytes as stored on the card, any media kind.
    #[default]
    Raw,
    /// A still image. Only valid for image resources served as JPEG.
    Image,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceData {
    Raw {
        content_type: Option<String>,
        bytes: Bytes,
    },
    /// Undecoded JPEG data.
    Jpeg(Bytes),
}

impl ResourceData {
    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Raw { bytes, .. } | Self::Jpeg(bytes) => bytes,
        }
    }
}

/// Where `persist` writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistTarget {
    /// Exactly this path.
    File(PathBuf),
    /// The device filename inside this directory.
    Directory(PathBuf),
}

// ── SingleResource ──────────────────────────────────────────────────

/// One file on the camera. Equality and hashing use the filename only.
#[derive(Debug, Clone)]
pub struct SingleResource {
    metadata: ResourceMetadata,
    handle: ResourceHandle,
}

impl PartialEq for SingleResource {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for SingleResource {}

impl Hash for SingleResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl SingleResource {
    /// A resource living in its media kind's standard directory.
    pub fn new(metadata: ResourceMetadata) -> Self {
        let handle = ResourceHandle::new(metadata.media_kind.directory(), &metadata.raw_filename);
        Self { metadata, handle }
    }

    pub fn with_handle(metadata: ResourceMetadata, handle: ResourceHandle) -> Self {
        Self { metadata, handle }
    }

    /// The device filename.
    pub fn identity(&self) -> &str {
        &self.metadata.raw_filename
    }

    pub fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    pub fn media_kind(&self) -> MediaKind {
        self.metadata.media_kind
    }

    pub fn session_key(&self) -> SessionKey {
        self.metadata.session_key()
    }

    /// Fetch the content in the requested view.
    ///
    /// `RetrievalView::Image` on a video fails with `NotSupported`
    /// without contacting the camera.
    pub async fn retrieve(
        &self,
        transport: &dyn Transport,
        view: RetrievalView,
    ) -> Result<ResourceData, CoreError> {
        if view == RetrievalView::Image && self.media_kind() != MediaKind::Image {
            return Err(CoreError::NotSupported {
                operation: format!("image view of {}", self.identity()),
                reason: format!("resource is a {}", self.media_kind()),
            });
        }

        let fetched = transport.fetch_bytes(&self.handle).await?;
        debug!(resource = self.identity(), size = fetched.bytes.len(), "retrieved");

        match view {
            RetrievalView::Raw => Ok(ResourceData::Raw {
                content_type: fetched.content_type,
                bytes: fetched.bytes,
            }),
            RetrievalView::Image => {
                let is_jpeg = fetched
                    .content_type
                    .as_deref()
                    .is_some_and(|ct| ct.starts_with("image/jpeg"));
                if is_jpeg {
                    Ok(ResourceData::Jpeg(fetched.bytes))
                } else {
                    Err(CoreError::NotSupported {
                        operation: format!("image view of {}", self.identity()),
                        reason: format!(
                            "camera served {}",
                            fetched.content_type.as_deref().unwrap_or("no content type")
                        ),
                    })
                }
            }
        }
    }

    /// Download the raw bytes to a local file, returning its path.
    pub async fn persist(
        &self,
        transport: &dyn Transport,
        target: &PersistTarget,
    ) -> Result<PathBuf, CoreError> {
        let path = match target {
            PersistTarget::File(path) => path.clone(),
            PersistTarget::Directory(dir) => dir.join(self.identity()),
        };
        let fetched = transport.fetch_bytes(&self.handle).await?;
        write_file(&path, &fetched.bytes).await?;
        debug!(resource = self.identity(), path = %path.display(), "persisted");
        Ok(path)
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let io_err = |source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_err)
}

// ── SequenceResource ────────────────────────────────────────────────

/// Frames of one burst, ordered by sequence index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceResource {
    members: Vec<SingleResource>,
}

impl SequenceResource {
    /// Build a sequence. Requires at least two members sharing one
    /// session key; members are sorted by sequence index.
    pub fn new(mut members: Vec<SingleResource>) -> Result<Self, CoreError> {
        let Some(first) = members.first() else {
            return Err(sequence_error("a sequence needs members"));
        };
        if members.len() < 2 {
            return Err(sequence_error("a sequence needs at least two members"));
        }
        let key = first.session_key();
        if members.iter().any(|m| m.session_key() != key) {
            return Err(sequence_error("members span more than one capture session"));
        }
        members.sort_by(|a, b| {
            (a.metadata.sequence_index, a.identity())
                .cmp(&(b.metadata.sequence_index, b.identity()))
        });
        Ok(Self { members })
    }

    /// Members already sorted and sharing one session key.
    pub(crate) fn from_run(members: Vec<SingleResource>) -> Self {
        Self { members }
    }

    /// Members in ascending sequence index.
    pub fn members(&self) -> &[SingleResource] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn session_key(&self) -> Option<SessionKey> {
        self.members.first().map(SingleResource::session_key)
    }

    /// Retrieve every member in order, stopping at the first failure.
    pub async fn retrieve(
        &self,
        transport: &dyn Transport,
        view: RetrievalView,
    ) -> Result<Vec<ResourceData>, CoreError> {
        let mut out = Vec::with_capacity(self.members.len());
        for member in &self.members {
            out.push(member.retrieve(transport, view).await?);
        }
        Ok(out)
    }

    /// Persist every member into `directory` under its device filename.
    pub async fn persist(
        &self,
        transport: &dyn Transport,
        directory: &Path,
    ) -> Result<Vec<PathBuf>, CoreError> {
        let target = PersistTarget::Directory(directory.to_path_buf());
        let mut paths = Vec::with_capacity(self.members.len());
        for member in &self.members {
            paths.push(member.persist(transport, &target).await?);
        }
        Ok(paths)
    }
}

fn sequence_error(reason: &str) -> CoreError {
    CoreError::NotSupported {
        operation: "build sequence".into(),
        reason: reason.into(),
    }
}

/// A grouped view of container contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Single(SingleResource),
    Sequence(SequenceResource),
}

impl Resource {
    /// Member files in order; one for a single resource.
    pub fn files(&self) -> &[SingleResource] {
        match self {
            Self::Single(single) => std::slice::from_ref(single),
            Self::Sequence(sequence) => sequence.members(),
        }
    }

    pub fn session_key(&self) -> Option<SessionKey> {
        self.files().first().map(SingleResource::session_key)
    }

    pub async fn retrieve(
        &self,
        transport: &dyn Transport,
        view: RetrievalView,
    ) -> Result<Vec<ResourceData>, CoreError> {
        match self {
            Self::Single(single) => Ok(vec![single.retrieve(transport, view).await?]),
            Self::Sequence(sequence) => sequence.retrieve(transport, view).await,
        }
    }

    /// Persist into `directory` under device filenames.
    pub async fn persist(
        &self,
        transport: &dyn Transport,
        directory: &Path,
    ) -> Result<Vec<PathBuf>, CoreError> {
        match self {
            Self::Single(single) => {
                let target = PersistTarget::Directory(directory.to_path_buf());
                Ok(vec![single.persist(transport, &target).await?])
            }
            Self::Sequence(sequence) => sequence.persist(transport, directory).await,
        }
    }
}
