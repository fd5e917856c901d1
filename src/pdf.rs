use crate::capture::{CaptureError, Result, wait_until_visible};
use crate::request::CaptureSettings;
use headless_chrome::Tab;
use headless_chrome::types::PrintToPdfOptions;
use tracing::debug;

/// Waits for a visible `body`, then prints the page with background graphics.
pub fn print(tab: &Tab, settings: &CaptureSettings) -> Result<Vec<u8>> {
    wait_until_visible(tab, "body", settings.timeout)?;

    debug!("printing to PDF");
    tab.print_to_pdf(Some(print_options()))
        .map_err(CaptureError::Pdf)
}

fn print_options() -> PrintToPdfOptions {
    PrintToPdfOptions {
        print_background: Some(true),
        ..Default::default()
    }
}
