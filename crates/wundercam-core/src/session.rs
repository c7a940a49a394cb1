// ── Camera session ──
//
// One explicit session per camera: the transport handle, the state
// store, the filename schemes in use and the last confirmed state.
// Nothing here is global; tests and callers can run independent sessions
// side by side.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::container::{Listing, ResourceContainer};
use crate::error::CoreError;
use crate::metadata::{MediaKind, MetadataExtractor};
use crate::resource::{Resource, ResourceData, RetrievalView, SingleResource};
use crate::state::{CamState, SdCardStatus, StateStore};
use crate::transport::{HttpTransport, Transport, TriggerAck};

/// A live session with one camera.
///
/// Holds the last state the camera confirmed. Edits are made on a copy
/// obtained from [`edit`](Self::edit) and sent back with
/// [`apply`](Self::apply).
pub struct CameraSession {
    transport: Arc<dyn Transport>,
    store: StateStore,
    extractor: MetadataExtractor,
    state: CamState,
    config: CameraConfig,
}

impl CameraSession {
    /// Connect over HTTP using `config`.
    pub async fn connect(config: CameraConfig) -> Result<Self, CoreError> {
        let transport = HttpTransport::new(&config)?;
        Self::open(Arc::new(transport), config).await
    }

    /// Open a session over an existing transport.
    ///
    /// Reads the full camera state and refuses to continue unless the SD
    /// card is ready.
    pub async fn open(
        transport: Arc<dyn Transport>,
        config: CameraConfig,
    ) -> Result<Self, CoreError> {
        let extractor = config
            .schemes
            .iter()
            .cloned()
            .try_fold(MetadataExtractor::default(), MetadataExtractor::with_scheme)?;

        let store = StateStore::new(Arc::clone(&transport));
        let state = store.read().await?;

        match state.sd_card_status() {
            Some(SdCardStatus::Ready) => {}
            other => {
                let status = other.map_or("unknown", SdCardStatus::label);
                warn!(status, "SD card not ready");
                return Err(CoreError::StorageUnavailable {
                    status: status.to_owned(),
                });
            }
        }

        info!(
            url = %config.url,
            serial = state.serial_number().unwrap_or("?"),
            firmware = state.firmware_version().unwrap_or("?"),
            "camera session open"
        );

        Ok(Self {
            transport,
            store,
            extractor,
            state,
            config,
        })
    }

    // ── State ────────────────────────────────────────────────────────

    /// Last state confirmed by the camera.
    pub fn state(&self) -> &CamState {
        &self.state
    }

    /// A copy of the current state in edit mode.
    pub fn edit(&self) -> CamState {
        self.state.clone().begin_edit()
    }

    /// Commit `edited` and adopt the camera's confirmed state.
    ///
    /// On `CoreError::PartialCommit` the session still adopts the state
    /// carried by the error before returning it.
    pub async fn apply(&mut self, edited: &CamState) -> Result<&CamState, CoreError> {
        match self.store.commit(edited).await {
            Ok(next) => {
                self.state = next;
                Ok(&self.state)
            }
            Err(CoreError::PartialCommit { state, rejected }) => {
                self.state = (*state).clone();
                Err(CoreError::PartialCommit { state, rejected })
            }
            Err(err) => Err(err),
        }
    }

    /// Re-read every parameter from the camera.
    pub async fn refresh(&mut self) -> Result<&CamState, CoreError> {
        self.state = self.store.read().await?;
        Ok(&self.state)
    }

    // ── Resources ────────────────────────────────────────────────────

    /// List one media directory.
    pub async fn snapshot(&self, kind: MediaKind) -> Result<Listing, CoreError> {
        let entries = self.transport.list_directory(kind.directory()).await?;
        Ok(ResourceContainer::from_listing(entries, kind, &self.extractor))
    }

    /// List both media directories into one container.
    pub async fn snapshots(&self) -> Result<Listing, CoreError> {
        let images = self.snapshot(MediaKind::Image).await?;
        let videos = self.snapshot(MediaKind::Video).await?;
        let mut warnings = images.warnings;
        warnings.extend(videos.warnings);
        Ok(Listing {
            container: images.container.union(&videos.container),
            warnings,
        })
    }

    /// Fire the capture action in the current shoot mode.
    pub async fn trigger(&self) -> Result<TriggerAck, CoreError> {
        let ack = self.transport.trigger().await?;
        if !ack.accepted {
            let code = ack.error_code.unwrap_or(-1);
            warn!(code, "trigger refused");
            return Err(CoreError::TriggerRejected { code });
        }
        Ok(ack)
    }

    /// Trigger and return the files the capture produced.
    ///
    /// Lists `kind` before and after the trigger (waiting
    /// `capture_settle` in between) and returns `after - before`.
    /// Never retries.
    pub async fn capture(&self, kind: MediaKind) -> Result<ResourceContainer, CoreError> {
        let before = self.snapshot(kind).await?.container;
        self.trigger().await?;
        tokio::time::sleep(self.config.capture_settle).await;
        let after = self.snapshot(kind).await?.container;

        let produced = ResourceContainer::difference(&after, &before);
        info!(%kind, produced = produced.len(), "capture complete");
        Ok(produced)
    }

    /// Fetch one resource in the requested view.
    pub async fn retrieve(
        &self,
        resource: &SingleResource,
        view: RetrievalView,
    ) -> Result<ResourceData, CoreError> {
        resource.retrieve(self.transport.as_ref(), view).await
    }

    /// Persist a resource into the configured download directory.
    pub async fn download(&self, resource: &Resource) -> Result<Vec<PathBuf>, CoreError> {
        let Some(dir) = self.config.download_dir.as_deref() else {
            return Err(CoreError::NotSupported {
                operation: "download".into(),
                reason: "no download directory configured".into(),
            });
        };
        let paths = resource.persist(self.transport.as_ref(), dir).await?;
        debug!(files = paths.len(), dir = %dir.display(), "download complete");
        Ok(paths)
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    pub fn extractor(&self) -> &MetadataExtractor {
        &self.extractor
    }
}
