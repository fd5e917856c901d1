use crate::request::{
    CaptureRequest, CaptureSettings, OutputKind, SUPPORTED_EXTENSIONS, extension_of,
};
use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::{ParseError, Url};

const EXAMPLES: &str = "\
Examples:
  webcapture https://example.com pdf output.pdf
  webcapture https://example.com photo.png
  webcapture --url=https://example.com --type=image --filename=output.jpg";

/// Captures a webpage as a PDF or a full-page screenshot using a headless browser
#[derive(Parser, Debug)]
#[command(
    name = "webcapture",
    version,
    override_usage = "webcapture [OPTIONS] [URL] <pdf|image|FILENAME> [FILENAME]",
    after_help = EXAMPLES
)]
struct Cli {
    /// URL of the webpage to capture, then 'pdf' or 'image' (or an output
    /// filename), then an optional output filename
    #[arg(value_name = "ARGS", num_args = 0..=3)]
    positional: Vec<String>,

    /// URL of the webpage to capture
    #[arg(long = "url", value_name = "URL")]
    url: Option<String>,

    /// Specify 'pdf' to generate a PDF or 'image' to capture a screenshot
    #[arg(long = "type", value_name = "pdf|image")]
    kind: Option<String>,

    /// Output filename. Defaults to 'output.pdf' for PDF and 'output.jpg' for image
    #[arg(long = "filename", value_name = "PATH")]
    filename: Option<PathBuf>,

    /// Milliseconds to wait before taking a screenshot, for late content
    #[arg(
        long,
        value_name = "MS",
        env = "WEBCAPTURE_SETTLE_DELAY_MS",
        default_value_t = CaptureSettings::DEFAULT_SETTLE_DELAY_MS
    )]
    settle_delay: u64,

    /// Seconds to wait for navigation and for the page body to become visible
    #[arg(
        long,
        value_name = "SECS",
        env = "WEBCAPTURE_TIMEOUT_SECS",
        default_value_t = CaptureSettings::DEFAULT_TIMEOUT_SECS
    )]
    timeout: u64,

    /// Screenshot quality; below 100 sets the JPEG quality, 100 and above is lossless
    #[arg(
        long,
        value_name = "N",
        env = "WEBCAPTURE_QUALITY",
        default_value_t = CaptureSettings::DEFAULT_QUALITY
    )]
    quality: u32,

    /// Chrome or Chromium executable; detected automatically if not given
    #[arg(long = "chrome", value_name = "PATH", env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// Print a JSON summary of the capture on stdout
    #[arg(long)]
    json: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Error, Debug)]
pub enum ArgsError {
    #[error(transparent)]
    Cli(#[from] clap::Error),
    #[error("Missing required flags or positional arguments. Use '-h' or '--help' for usage information.")]
    MissingUrl,
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: ParseError,
    },
    #[error("Invalid output type '{0}', expected 'pdf' or 'image'")]
    UnknownKind(String),
    #[error("Invalid output filename {}: filename must have an extension", .0.display())]
    MissingExtension(PathBuf),
    #[error(
        "Invalid output filename {}: supported extensions are {}",
        .0.display(),
        SUPPORTED_EXTENSIONS.join(", ")
    )]
    UnsupportedExtension(PathBuf),
    #[error("Output type '{kind}' does not match output filename {}", .path.display())]
    KindMismatch { kind: OutputKind, path: PathBuf },
}

impl ArgsError {
    /// Clap errors already carry their own usage text.
    pub fn wants_usage(&self) -> bool {
        !matches!(self, ArgsError::Cli(_))
    }
}

pub type Result<T> = std::result::Result<T, ArgsError>;

/// A fully resolved run of the tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub request: CaptureRequest,
    pub settings: CaptureSettings,
    /// Print a [`crate::report::CaptureReport`] instead of the success line.
    pub json_report: bool,
    /// `tracing_subscriber::EnvFilter` directive picked by `-v` / `-q`.
    pub log_directive: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Help,
    Version,
    Capture(Capture),
}

/// Rendered help text.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

pub fn version() -> String {
    Cli::command().render_version()
}

/// Resolves the process tokens (program name first) into an [`Invocation`].
///
/// A named option always wins over a positional token, and a positional
/// token wins over a default.
pub fn parse<I, T>(tokens: I) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let tokens: Vec<OsString> = tokens.into_iter().map(Into::into).collect();

    if tokens.iter().skip(1).any(|t| t == "-h" || t == "--help") {
        return Ok(Invocation::Help);
    }

    let cli = match Cli::try_parse_from(tokens) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => return Ok(Invocation::Version),
        Err(e) => return Err(e.into()),
    };
    resolve(cli).map(Invocation::Capture)
}

fn resolve(cli: Cli) -> Result<Capture> {
    // Positional slots are fixed: URL, kind-or-path, path. A slot whose
    // named option is present is skipped without being looked at.
    let mut positional = cli.positional.into_iter();
    let url_slot = positional.next();
    let kind_slot = positional.next();
    let path_slot = positional.next();

    let raw_url = cli.url.or(url_slot).ok_or(ArgsError::MissingUrl)?;
    let url = parse_url(&raw_url)?;

    // The kind slot holds a path instead when the token has an extension.
    let mut positional_kind = None;
    let mut positional_path = None;
    if let (None, Some(token)) = (&cli.kind, kind_slot) {
        if extension_of(Path::new(&token)).is_some() {
            positional_path = Some(PathBuf::from(token));
        } else {
            positional_kind = Some(token);
        }
    }

    let named_kind = cli.kind.map(|k| parse_kind(&k)).transpose()?;
    let positional_kind = positional_kind.map(|k| parse_kind(&k)).transpose()?;

    let path = cli
        .filename
        .or(positional_path)
        .or(path_slot.map(PathBuf::from));
    let path_extension = match &path {
        Some(path) => Some(validate_filename(path)?),
        None => None,
    };

    let kind = named_kind
        .or(positional_kind)
        .or(path_extension.as_deref().map(OutputKind::from_extension))
        .unwrap_or(OutputKind::Pdf);

    let path = match (path, path_extension) {
        (Some(path), Some(extension)) => {
            if OutputKind::from_extension(&extension) != kind {
                return Err(ArgsError::KindMismatch { kind, path });
            }
            path
        }
        _ => PathBuf::from(kind.default_filename()),
    };

    let settings = CaptureSettings {
        settle_delay: Duration::from_millis(cli.settle_delay),
        timeout: Duration::from_secs(cli.timeout),
        quality: cli.quality,
        chrome_path: cli.chrome_path,
    };

    let log_directive = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    Ok(Capture {
        request: CaptureRequest { url, kind, path },
        settings,
        json_report: cli.json,
        log_directive,
    })
}

fn parse_kind(name: &str) -> Result<OutputKind> {
    OutputKind::from_name(name).ok_or_else(|| ArgsError::UnknownKind(name.to_string()))
}

/// Accepts bare hosts like `example.com` by assuming https.
fn parse_url(raw: &str) -> Result<Url> {
    match Url::parse(raw) {
        Ok(url) => Ok(url),
        Err(ParseError::RelativeUrlWithoutBase) => Url::parse(&format!("https://{raw}"))
            .map_err(|source| ArgsError::InvalidUrl {
                url: raw.to_string(),
                source,
            }),
        Err(source) => Err(ArgsError::InvalidUrl {
            url: raw.to_string(),
            source,
        }),
    }
}

/// Returns the lower-cased extension of a valid output filename.
fn validate_filename(path: &Path) -> Result<String> {
    let extension =
        extension_of(path).ok_or_else(|| ArgsError::MissingExtension(path.to_path_buf()))?;

    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ArgsError::UnsupportedExtension(path.to_path_buf()));
    }
    Ok(extension)
}
