use crate::capture::{CaptureError, Result, wait_until_visible};
use crate::request::{CaptureSettings, ImageFormat};
use anyhow::anyhow;
use base64::Engine;
use headless_chrome::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::protocol::cdp::Page::{CaptureScreenshotFormatOption, Viewport};
use serde::Deserialize;
use std::io::Cursor;
use std::thread;
use tracing::debug;

const PAGE_SIZE_JS: &str = r#"
    (() => {
        const doc = document.documentElement;
        const body = document.body || doc;
        return JSON.stringify({
            width: Math.max(doc.scrollWidth, body.scrollWidth, doc.clientWidth),
            height: Math.max(doc.scrollHeight, body.scrollHeight, doc.clientHeight)
        });
    })()
"#;

/// Rendered size of the whole document in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct PageSize {
    width: f64,
    height: f64,
}

/// Screenshots the full document height, not only the viewport.
///
/// Sleeps `settings.settle_delay` first so late fonts and async content
/// get a chance to render. That delay is a guess, not a guarantee.
pub fn full_page_screenshot(
    tab: &Tab,
    format: ImageFormat,
    settings: &CaptureSettings,
) -> Result<Vec<u8>> {
    if !settings.settle_delay.is_zero() {
        debug!(delay = ?settings.settle_delay, "waiting for the page to settle");
        thread::sleep(settings.settle_delay);
    }
    wait_until_visible(tab, "body", settings.timeout)?;

    let size = page_size(tab)?;
    debug!(width = size.width, height = size.height, "page measured");

    let clip = Viewport {
        x: 0.0,
        y: 0.0,
        width: size.width,
        height: size.height,
        scale: 1.0,
    };
    let (cdp_format, quality) = match format {
        ImageFormat::Jpeg => (CaptureScreenshotFormatOption::Jpeg, Some(settings.jpeg_quality())),
        ImageFormat::Png | ImageFormat::Bmp => (CaptureScreenshotFormatOption::Png, None),
    };

    // Tab::capture_screenshot never asks for content past the viewport, so
    // the command is sent directly.
    let data = tab
        .call_method(Page::CaptureScreenshot {
            format: Some(cdp_format),
            quality,
            clip: Some(clip),
            from_surface: Some(true),
            capture_beyond_viewport: Some(true),
            optimize_for_speed: None,
        })
        .map_err(CaptureError::Screenshot)?
        .data;
    let bytes = decode_screenshot(&data)?;

    match format {
        ImageFormat::Bmp => Ok(png_to_bmp(&bytes)?),
        ImageFormat::Png | ImageFormat::Jpeg => Ok(bytes),
    }
}

fn page_size(tab: &Tab) -> Result<PageSize> {
    let value = tab
        .evaluate(PAGE_SIZE_JS, false)
        .map_err(CaptureError::Measure)?
        .value
        .ok_or_else(|| CaptureError::Measure(anyhow!("page size script returned nothing")))?;

    let json = value
        .as_str()
        .ok_or_else(|| CaptureError::Measure(anyhow!("page size is not a string: {}", value)))?;

    parse_page_size(json)
}

fn parse_page_size(json: &str) -> Result<PageSize> {
    let size: PageSize =
        serde_json::from_str(json).map_err(|e| CaptureError::Measure(anyhow!(e)))?;

    Ok(PageSize {
        width: size.width.max(1.0),
        height: size.height.max(1.0),
    })
}

fn decode_screenshot(data: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| CaptureError::Screenshot(anyhow!("base64 decode failed: {}", e)))
}

/// Chrome has no BMP encoder, so BMP output is captured as PNG and converted.
fn png_to_bmp(png: &[u8]) -> std::result::Result<Vec<u8>, image::ImageError> {
    let image = image::load_from_memory_with_format(png, image::ImageFormat::Png)?;

    let mut bmp = Cursor::new(Vec::new());
    image.write_to(&mut bmp, image::ImageFormat::Bmp)?;
    Ok(bmp.into_inner())
}
