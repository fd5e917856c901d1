use crate::browser::{Browser, BrowserError, LaunchProfile};
use crate::request::{CaptureRequest, CaptureSettings, OutputKind};
use crate::{images, pdf};
use headless_chrome::Tab;
use serde_json::Value;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Browser(#[from] BrowserError),
    #[error("'{selector}' did not become visible within {timeout:?}")]
    NotVisible { selector: String, timeout: Duration },
    #[error("Can't print page to PDF: {0}")]
    Pdf(anyhow::Error),
    #[error("Can't capture screenshot: {0}")]
    Screenshot(anyhow::Error),
    #[error("Can't measure page size: {0}")]
    Measure(anyhow::Error),
    #[error("Can't convert screenshot: {0}")]
    Transcode(#[from] image::ImageError),
    #[error("Browser returned an empty {0}")]
    Empty(OutputKind),
}
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Bytes produced by one capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedArtifact {
    pub bytes: Vec<u8>,
    pub kind: OutputKind,
}

/// Launches a browser, loads the page and captures it. The browser is
/// shut down before returning, whether the capture worked or not.
pub fn run(request: &CaptureRequest, settings: &CaptureSettings) -> Result<CapturedArtifact> {
    let browser = Browser::launch(LaunchProfile::for_kind(request.kind), settings)?;
    let tab = browser.open_tab(&request.url, settings.timeout)?;

    let bytes = match request.kind {
        OutputKind::Pdf => pdf::print(&tab, settings)?,
        OutputKind::Image => images::full_page_screenshot(&tab, request.image_format(), settings)?,
    };

    if bytes.is_empty() {
        return Err(CaptureError::Empty(request.kind));
    }
    info!(kind = %request.kind, bytes = bytes.len(), "capture finished");

    Ok(CapturedArtifact {
        bytes,
        kind: request.kind,
    })
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// Same rule as jQuery's :visible, plus CSS visibility.
const IS_VISIBLE_JS: &str = "function() { \
    return this.getClientRects().length > 0 \
        && window.getComputedStyle(this).visibility !== 'hidden'; \
}";

/// Waits until the first element matching `selector` is rendered and visible.
pub(crate) fn wait_until_visible(tab: &Tab, selector: &str, timeout: Duration) -> Result<()> {
    let not_visible = || CaptureError::NotVisible {
        selector: selector.to_string(),
        timeout,
    };
    let deadline = Instant::now() + timeout;

    let element = tab
        .wait_for_element_with_custom_timeout(selector, timeout)
        .map_err(|e| {
            debug!(selector, error = %e, "element never appeared");
            not_visible()
        })?;

    loop {
        match element.call_js_fn(IS_VISIBLE_JS, vec![], false) {
            Ok(result) if result.value == Some(Value::Bool(true)) => return Ok(()),
            Ok(_) => {}
            Err(e) => debug!(selector, error = %e, "visibility check failed"),
        }
        if Instant::now() >= deadline {
            return Err(not_visible());
        }
        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn request(kind: OutputKind, path: &str) -> CaptureRequest {
        CaptureRequest {
            url: Url::parse("https://example.com").unwrap(),
            kind,
            path: path.into(),
        }
    }

    #[test]
    fn not_visible_message() {
        let err = CaptureError::NotVisible {
            selector: "body".to_string(),
            timeout: Duration::from_secs(3),
        };
        assert_eq!(err.to_string(), "'body' did not become visible within 3s");
    }

    #[test]
    #[ignore = "needs a local Chrome and network access"]
    fn pdf_capture() {
        let artifact = run(&request(OutputKind::Pdf, "out.pdf"), &CaptureSettings::default()).unwrap();
        assert_eq!(artifact.kind, OutputKind::Pdf);
        assert!(artifact.bytes.starts_with(b"%PDF"));
    }

    #[test]
    #[ignore = "needs a local Chrome and network access"]
    fn png_capture() {
        let settings = CaptureSettings {
            settle_delay: Duration::from_millis(200),
            ..CaptureSettings::default()
        };
        let artifact = run(&request(OutputKind::Image, "out.png"), &settings).unwrap();
        assert!(artifact.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    #[ignore = "needs a local Chrome"]
    fn screenshot_covers_content_below_the_fold() {
        use image::GenericImageView;

        let request = CaptureRequest {
            url: Url::parse(
                "data:text/html,<body style='margin:0'><div style='height:3000px'>tall</div></body>",
            )
            .unwrap(),
            kind: OutputKind::Image,
            path: "tall.png".into(),
        };
        let settings = CaptureSettings {
            settle_delay: Duration::ZERO,
            ..CaptureSettings::default()
        };

        let artifact = run(&request, &settings).unwrap();
        let image = image::load_from_memory(&artifact.bytes).unwrap();
        assert!(image.height() >= 3000);
    }

    #[test]
    #[ignore = "needs a local Chrome"]
    fn unreachable_host_fails() {
        let request = CaptureRequest {
            url: Url::parse("http://nonexistent.invalid").unwrap(),
            kind: OutputKind::Pdf,
            path: "out.pdf".into(),
        };
        assert!(run(&request, &CaptureSettings::default()).is_err());
    }
}
