//! Typed camera state and media snapshots on top of `wundercam-api`.
//!
//! This crate owns the domain logic for driving a Wunder 360 S1:
//!
//! - **[`CamState`] / [`StateStore`]**: parameter values validated against
//!   the static [`ParameterRegistry`]. Mutations are staged in an edit
//!   queue (last write wins) and sent to the camera as one batch by
//!   [`StateStore::commit`]; the resulting state always reflects what the
//!   camera acknowledged, and partial rejections surface as
//!   [`CoreError::PartialCommit`].
//!
//! - **[`MetadataExtractor`]**: data-driven filename schemes, one per
//!   [`MediaKind`], compiled to named-group regexes.
//!
//! - **[`ResourceContainer`]**: an immutable snapshot of the card.
//!   [`ResourceContainer::difference`] finds the files a capture produced
//!   and [`ResourceContainer::group`] collapses bursts into
//!   [`SequenceResource`]s.
//!
//! - **[`CameraSession`]**: the orchestrator owning one [`Transport`],
//!   one state store and the last confirmed state. [`HttpTransport`] is
//!   the production transport.

pub mod config;
pub mod container;
pub mod error;
pub mod metadata;
pub mod registry;
pub mod resource;
pub mod session;
pub mod state;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::CameraConfig;
pub use container::{Listing, ResourceContainer, SkippedEntry};
pub use error::{CoreError, RejectedParameter};
pub use metadata::{
    FilenameScheme, MediaKind, MetadataExtractor, ResourceMetadata, SchemeSpec, SessionKey,
};
pub use registry::{Domain, ParamValue, Parameter, ParameterRegistry, ParameterSpec};
pub use resource::{
    PersistTarget, Resource, ResourceData, ResourceHandle, RetrievalView, SequenceResource,
    SingleResource,
};
pub use session::CameraSession;
pub use state::{CamState, Iso, SdCardStatus, ShootMode, StateStore, WhiteBalance};
pub use transport::{FetchedBytes, HttpTransport, SetOutcome, Transport, TriggerAck};
