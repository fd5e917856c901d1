use crate::capture::CapturedArtifact;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Can't write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}
pub type Result<T> = std::result::Result<T, OutputError>;

/// Creates or truncates `path` (rw-r--r-- on Unix) and writes the artifact to it.
pub fn write_artifact(artifact: &CapturedArtifact, path: &Path) -> Result<()> {
    let write_error = |source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path).map_err(write_error)?;
    file.write_all(&artifact.bytes).map_err(write_error)?;
    file.flush().map_err(write_error)?;

    debug!(path = %path.display(), bytes = artifact.bytes.len(), "artifact written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::OutputKind;

    fn artifact(bytes: &[u8]) -> CapturedArtifact {
        CapturedArtifact {
            bytes: bytes.to_vec(),
            kind: OutputKind::Pdf,
        }
    }

    #[test]
    fn writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");

        write_artifact(&artifact(b"%PDF-1.4 body"), &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 body");
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.pdf");
        std::fs::write(&path, b"a much longer previous content").unwrap();

        write_artifact(&artifact(b"short"), &path).unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[cfg(unix)]
    #[test]
    fn new_file_is_owner_writable_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shot.png");
        write_artifact(&artifact(b"png"), &path).unwrap();

        // umask may only remove bits
        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & !0o644, 0);
        assert_ne!(mode & 0o600, 0);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.pdf");

        let err = write_artifact(&artifact(b"x"), &path).unwrap_err();
        assert!(matches!(err, OutputError::Write { .. }));
        assert!(err.to_string().contains("out.pdf"));
    }
}
