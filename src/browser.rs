use crate::request::{CaptureSettings, OutputKind};
use anyhow::anyhow;
use headless_chrome::{LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("Can't launch browser: {0}")]
    Launch(anyhow::Error),
    #[error("Can't load {url}: {source}")]
    Navigation { url: String, source: anyhow::Error },
}
pub type Result<T> = std::result::Result<T, BrowserError>;

/// Flags for running Chrome in containers and other constrained hosts.
const HARDENED_FLAGS: [&str; 6] = [
    "--disable-gpu",
    "--disable-software-rasterizer",
    "--disable-dev-shm-usage",
    "--disable-setuid-sandbox",
    "--disable-web-security",
    "--hide-scrollbars",
];

const HARDENED_WINDOW: (u32, u32) = (1920, 1080);

/// Lower bound for the browser idle timeout, headless_chrome's own default.
const MIN_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchProfile {
    /// Headless Chrome with default options.
    Standard,
    /// No sandbox, no GPU, no web security, fixed 1920x1080 window.
    Hardened,
}

impl LaunchProfile {
    pub fn for_kind(kind: OutputKind) -> Self {
        match kind {
            OutputKind::Image => Self::Standard,
            OutputKind::Pdf => Self::Hardened,
        }
    }

    fn flags(self) -> Vec<&'static OsStr> {
        match self {
            Self::Standard => Vec::new(),
            Self::Hardened => HARDENED_FLAGS.iter().map(OsStr::new).collect(),
        }
    }

    fn window_size(self) -> Option<(u32, u32)> {
        match self {
            Self::Standard => None,
            Self::Hardened => Some(HARDENED_WINDOW),
        }
    }
}

/// A running headless browser. Dropping it kills the browser process.
pub struct Browser(headless_chrome::Browser);

impl Browser {
    pub fn launch(profile: LaunchProfile, settings: &CaptureSettings) -> Result<Self> {
        info!(?profile, "launching headless browser");

        let options = launch_options(profile, settings)?;
        let browser = headless_chrome::Browser::new(options).map_err(BrowserError::Launch)?;

        debug!(version = ?browser.get_version().ok().map(|v| v.product), "browser ready");
        Ok(Self(browser))
    }

    /// Opens a tab and waits until `url` has finished navigating.
    pub fn open_tab(&self, url: &Url, timeout: Duration) -> Result<Arc<Tab>> {
        let tab = self.0.new_tab().map_err(BrowserError::Launch)?;
        tab.set_default_timeout(timeout);

        info!(%url, "navigating");
        let navigation = |source| BrowserError::Navigation {
            url: url.to_string(),
            source,
        };
        tab.navigate_to(url.as_str()).map_err(navigation)?;
        tab.wait_until_navigated().map_err(navigation)?;

        Ok(tab)
    }
}

fn launch_options(
    profile: LaunchProfile,
    settings: &CaptureSettings,
) -> Result<LaunchOptions<'static>> {
    let idle_timeout = (settings.timeout + settings.settle_delay).max(MIN_IDLE_TIMEOUT);

    LaunchOptions::default_builder()
        .headless(true)
        .sandbox(profile == LaunchProfile::Standard)
        .window_size(profile.window_size())
        .args(profile.flags())
        .path(settings.chrome_path.clone())
        .idle_browser_timeout(idle_timeout)
        .build()
        .map_err(|e| BrowserError::Launch(anyhow!("Failed to build launch options: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_follows_kind() {
        assert_eq!(LaunchProfile::for_kind(OutputKind::Pdf), LaunchProfile::Hardened);
        assert_eq!(LaunchProfile::for_kind(OutputKind::Image), LaunchProfile::Standard);
    }

    #[test]
    fn hardened_options() {
        let options = launch_options(LaunchProfile::Hardened, &CaptureSettings::default()).unwrap();
        assert!(options.headless);
        assert!(!options.sandbox);
        assert_eq!(options.window_size, Some((1920, 1080)));
        assert!(options.args.contains(&OsStr::new("--disable-web-security")));
        assert!(options.args.contains(&OsStr::new("--hide-scrollbars")));
    }

    #[test]
    fn standard_options() {
        let mut settings = CaptureSettings::default();
        settings.timeout = Duration::from_secs(90);
        let options = launch_options(LaunchProfile::Standard, &settings).unwrap();
        assert!(options.headless);
        assert!(options.sandbox);
        assert!(options.args.is_empty());
        assert_eq!(options.idle_browser_timeout, Duration::from_secs(92));
    }

    #[test]
    #[ignore = "needs a local Chrome and network access"]
    fn open_tab() {
        let settings = CaptureSettings::default();
        let browser = Browser::launch(LaunchProfile::Standard, &settings).unwrap();
        let url = Url::parse("https://example.com").unwrap();
        let tab = browser.open_tab(&url, settings.timeout).unwrap();
        assert!(tab.get_url().starts_with("https://example.com"));
    }
}
