use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::error::{MessageError, Result};

/// Load a message file verbatim.
///
/// Line 1 is the topic and the remaining lines are the body; the content is
/// returned unchanged so the sender adds no framing of its own.
pub fn load_message_file(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    let content = std::fs::read(path).map_err(|source| MessageError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(?path, len = content.len(), "loaded message file");
    Ok(Bytes::from(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("message.txt");
        std::fs::write(&path, b"aws/things/demo\n{\"state\":\"on\"}\n").unwrap();

        let content = load_message_file(&path).unwrap();
        assert_eq!(content.as_ref(), b"aws/things/demo\n{\"state\":\"on\"}\n");
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.txt");

        let err = load_message_file(&path).unwrap_err();
        match err {
            MessageError::FileRead { path: reported, source } => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
