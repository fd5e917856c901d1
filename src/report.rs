use crate::capture::CapturedArtifact;
use crate::request::{CaptureRequest, OutputKind};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Summary printed with `--json`.
#[derive(Serialize, Debug)]
pub struct CaptureReport {
    url: String,
    kind: OutputKind,
    path: String,
    bytes: usize,
    captured_at: String,
}

impl CaptureReport {
    pub fn new(
        request: &CaptureRequest,
        artifact: &CapturedArtifact,
    ) -> Result<Self, time::error::Format> {
        Self::at(request, artifact, OffsetDateTime::now_utc())
    }

    fn at(
        request: &CaptureRequest,
        artifact: &CapturedArtifact,
        now: OffsetDateTime,
    ) -> Result<Self, time::error::Format> {
        let captured_at = now.format(&Rfc3339)?;

        Ok(Self {
            url: request.url.to_string(),
            kind: artifact.kind,
            path: request.path.display().to_string(),
            bytes: artifact.bytes.len(),
            captured_at,
        })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
