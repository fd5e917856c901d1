use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Extensions accepted for the output file, lower case.
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["pdf", "jpg", "jpeg", "png", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    Pdf,
    Image,
}

impl OutputKind {
    /// `pdf` or `image`, as typed on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pdf" => Some(Self::Pdf),
            "image" => Some(Self::Image),
            _ => None,
        }
    }

    /// `.pdf` means a PDF, every other extension an image.
    pub fn from_extension(extension: &str) -> Self {
        if extension.eq_ignore_ascii_case("pdf") {
            Self::Pdf
        } else {
            Self::Image
        }
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            Self::Pdf => "output.pdf",
            Self::Image => "output.jpg",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Encoding of a screenshot, picked from the output file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
}

impl ImageFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = extension_of(path)?;
        match extension.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }
}

/// Lower-cased extension of `path`, `None` when it has none.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

/// What to capture and where to put it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRequest {
    pub url: Url,
    pub kind: OutputKind,
    pub path: PathBuf,
}

impl CaptureRequest {
    /// Screenshot encoding for this request. Only meaningful for images;
    /// falls back to PNG if the path somehow has no image extension.
    pub fn image_format(&self) -> ImageFormat {
        ImageFormat::from_path(&self.path).unwrap_or(ImageFormat::Png)
    }
}

/// How the capture is carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Wait before a screenshot so late fonts and async content can paint.
    /// This is a heuristic, it does not guarantee the page is finished.
    pub settle_delay: Duration,
    /// Bound for navigation and for waiting on a visible `body`.
    pub timeout: Duration,
    /// Values of 100 and above mean lossless.
    pub quality: u32,
    pub chrome_path: Option<PathBuf>,
}

impl CaptureSettings {
    pub const DEFAULT_SETTLE_DELAY_MS: u64 = 2000;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_QUALITY: u32 = 500;

    /// JPEG quality handed to the browser, clamped to its 0..=100 range.
    pub fn jpeg_quality(&self) -> u32 {
        self.quality.min(100)
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(Self::DEFAULT_SETTLE_DELAY_MS),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            quality: Self::DEFAULT_QUALITY,
            chrome_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(OutputKind::from_extension("pdf"), OutputKind::Pdf);
        assert_eq!(OutputKind::from_extension("PDF"), OutputKind::Pdf);
        assert_eq!(OutputKind::from_extension("png"), OutputKind::Image);
        assert_eq!(OutputKind::from_extension("bmp"), OutputKind::Image);
    }

    #[test]
    fn image_format_follows_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("a.png")), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::from_path(Path::new("a.JPEG")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("dir/a.jpg")), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_path(Path::new("a.bmp")), Some(ImageFormat::Bmp));
        assert_eq!(ImageFormat::from_path(Path::new("a.pdf")), None);
        assert_eq!(ImageFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let mut settings = CaptureSettings::default();
        assert_eq!(settings.jpeg_quality(), 100);
        settings.quality = 80;
        assert_eq!(settings.jpeg_quality(), 80);
    }
}
