// wundercam-api: Async Rust client for the Wunder 360 S1 camera (control CGI + file server)

pub mod client;
pub mod control;
pub mod error;
pub mod files;
pub mod transport;

pub use client::{CameraClient, ControlData};
pub use error::Error;
pub use files::Download;
pub use transport::TransportConfig;
