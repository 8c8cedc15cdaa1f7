//! Result types for exports.
//!
//! [`EncodedExport`] is what an encoder produces; [`SavedExport`] is what the
//! sink reported after storing it. One [`ExportOutcome`] per selected format
//! is collected into an [`ExportReport`], in selection order.

use crate::error::ExportError;
use crate::format::{ExportFormat, SourceKind};
use serde::{Deserialize, Serialize};

/// Summary of the loaded document, as shown in the file-information panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub file_name: String,
    pub kind: SourceKind,
    pub byte_size: u64,
    /// Size as `"12.34 KB"`.
    pub display_size: String,
    /// Rendered page surfaces (0 for markup sources).
    pub rendered_pages: usize,
    /// Page count reported by the decoder, for paginated sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    /// 1-based page under the cursor, for paginated sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<usize>,
    /// Formats that can be selected for this document.
    pub available_formats: Vec<ExportFormat>,
}

/// Encoded bytes for one format, not yet saved.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedExport {
    /// Format that was requested.
    pub format: ExportFormat,
    /// Target file name, e.g. `shape.png` or `report_page3.pdf`.
    pub file_name: String,
    /// MIME type of `bytes`; differs from `format.mime_type()` after a fallback.
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
    /// User-facing note about an approximation or fallback.
    pub notice: Option<String>,
}

/// A stored export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedExport {
    pub format: ExportFormat,
    pub file_name: String,
    pub mime_type: String,
    pub byte_len: usize,
    /// Where the sink put it (a path for [`crate::sink::DirectorySink`]).
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Outcome of one format's encode-and-save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportOutcome {
    pub format: ExportFormat,
    pub result: Result<SavedExport, ExportError>,
}

impl ExportOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcomes of one export request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    /// One entry per selected format, in canonical format order.
    pub outcomes: Vec<ExportOutcome>,
}

impl ExportReport {
    /// Successfully saved exports.
    pub fn saved(&self) -> impl Iterator<Item = &SavedExport> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Failed formats with their errors.
    pub fn failures(&self) -> impl Iterator<Item = &ExportError> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().err())
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(ExportOutcome::is_success)
    }

    /// Number of formats that were saved.
    pub fn saved_count(&self) -> usize {
        self.saved().count()
    }

    /// Number of formats that failed.
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// Outcome for `format`, if it was part of the request.
    pub fn get(&self, format: ExportFormat) -> Option<&ExportOutcome> {
        self.outcomes.iter().find(|o| o.format == format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn saved(format: ExportFormat, name: &str) -> ExportOutcome {
        ExportOutcome {
            format,
            result: Ok(SavedExport {
                format,
                file_name: name.to_string(),
                mime_type: format.mime_type().to_string(),
                byte_len: 3,
                location: name.to_string(),
                notice: None,
            }),
        }
    }

    #[test]
    fn report_counts_partial_failure() {
        let report = ExportReport {
            outcomes: vec![
                ExportOutcome {
                    format: ExportFormat::Svg,
                    result: Err(ExportError::FormatUnavailable {
                        format: ExportFormat::Svg,
                        reason: "no markup".into(),
                    }),
                },
                saved(ExportFormat::Png, "doc_page1.png"),
            ],
        };

        assert!(!report.all_succeeded());
        assert_eq!(report.saved_count(), 1);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(
            report.get(ExportFormat::Png).map(ExportOutcome::is_success),
            Some(true)
        );
        assert!(report.get(ExportFormat::Jpg).is_none());
    }

    #[test]
    fn report_serializes_to_json() {
        let report = ExportReport {
            outcomes: vec![saved(ExportFormat::Jpg, "shape.jpg")],
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"file_name\":\"shape.jpg\""));
        assert!(json.contains("\"Ok\""));
        assert!(!json.contains("notice"));
    }
}
