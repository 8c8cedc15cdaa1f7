//! Input resolution: classify a file by extension and check its content.
//!
//! Classification happens before anything else so an unsupported file is
//! rejected without touching session state. Markup validation is a cheap
//! textual check for an `<svg` opening tag and a `</svg>` closing tag; the
//! full parse happens later, only when an export actually rasterises.

use crate::document::SourceDocument;
use crate::error::{ConvertError, DecodeFailureKind};
use crate::format::SourceKind;
use std::path::Path;
use tracing::debug;

/// A file read from disk, ready to be loaded.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Classify `file_name` into a [`SourceDocument`] for `byte_size` bytes.
pub fn classify(file_name: &str, byte_size: u64) -> Result<SourceDocument, ConvertError> {
    let kind =
        SourceKind::from_file_name(file_name).ok_or_else(|| ConvertError::UnsupportedFormat {
            file_name: file_name.to_string(),
        })?;
    Ok(SourceDocument::new(file_name, kind, byte_size))
}

/// Read a local file, mapping I/O failures to descriptive errors.
pub async fn read_local(path: &Path) -> Result<InputFile, ConvertError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ConvertError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let file_name = file_name_of(path);
    debug!("Read {} ({} bytes)", path.display(), bytes.len());
    Ok(InputFile { file_name, bytes })
}

/// Final path component as a string, or the whole path when there is none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Decode markup bytes as text and check for an SVG root element.
pub fn decode_markup(source: &SourceDocument, bytes: Vec<u8>) -> Result<String, ConvertError> {
    let text = String::from_utf8(bytes).map_err(|e| ConvertError::CorruptMarkup {
        file_name: source.file_name.clone(),
        detail: format!("not UTF-8 text ({})", e.utf8_error()),
    })?;

    let lower = text.to_ascii_lowercase();
    let has_open = lower.contains("<svg");
    let has_close = lower.contains("</svg>");
    if !(has_open && has_close) {
        let missing = match (has_open, has_close) {
            (false, false) => "no <svg> root element",
            (true, false) => "missing closing </svg> tag",
            _ => "missing opening <svg> tag",
        };
        return Err(ConvertError::CorruptMarkup {
            file_name: source.file_name.clone(),
            detail: missing.to_string(),
        });
    }

    Ok(text)
}

/// Reject paginated inputs larger than `max_bytes` before decoding.
pub fn check_input_size(source: &SourceDocument, max_bytes: u64) -> Result<(), ConvertError> {
    if source.byte_size > max_bytes {
        return Err(ConvertError::DecodeFailure {
            file_name: source.file_name.clone(),
            kind: DecodeFailureKind::Oversized,
            detail: format!(
                "{} bytes exceeds the {} byte input limit",
                source.byte_size, max_bytes
            ),
        });
    }
    Ok(())
}
