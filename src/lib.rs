//! Render a single web page in headless Chrome and save it as a PDF
//! document or a full-page screenshot.
//!
//! The flow is linear: [`args::parse`] resolves a [`CaptureRequest`],
//! [`capture::run`] launches a browser and returns a [`CapturedArtifact`],
//! and [`output::write_artifact`] puts the bytes on disk.

pub mod args;
pub mod browser;
pub mod capture;
pub mod images;
pub mod output;
pub mod pdf;
pub mod request;
pub mod report;

pub use args::{ArgsError, Invocation};
pub use browser::BrowserError;
pub use capture::{CaptureError, CapturedArtifact};
pub use output::OutputError;
pub use request::{CaptureRequest, CaptureSettings, ImageFormat, OutputKind};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WebCaptureError {
    #[error("{0}")]
    Usage(#[from] ArgsError),
    #[error("{0}")]
    Capture(#[from] CaptureError),
    #[error("{0}")]
    Output(#[from] OutputError),
    #[error("Can't serialize capture report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("Can't format capture time: {0}")]
    Time(#[from] time::error::Format),
}

pub type Result<T> = std::result::Result<T, WebCaptureError>;
