//! The set of formats the user picked for export.

use crate::error::ConvertError;
use crate::format::{ExportFormat, SourceKind};
use std::collections::BTreeSet;

/// Selected export formats for one loaded document.
///
/// Never contains the source's own format. Iterates in canonical format order
/// (svg, ai, pdf, png, jpg) regardless of toggle order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSelection {
    source: Option<SourceKind>,
    formats: BTreeSet<ExportFormat>,
}

impl ExportSelection {
    /// Empty selection bound to a source kind.
    pub fn for_source(source: SourceKind) -> Self {
        Self {
            source: Some(source),
            formats: BTreeSet::new(),
        }
    }

    /// Flip `format` in or out of the selection.
    ///
    /// Returns whether the format is selected afterwards.
    pub fn toggle(&mut self, format: ExportFormat) -> Result<bool, ConvertError> {
        let Some(source) = self.source else {
            return Err(ConvertError::NoDocument);
        };
        if source.as_export_format() == format {
            return Err(ConvertError::SourceFormatSelected { format });
        }
        if self.formats.remove(&format) {
            Ok(false)
        } else {
            self.formats.insert(format);
            Ok(true)
        }
    }

    pub fn contains(&self, format: ExportFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = ExportFormat> + '_ {
        self.formats.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<ExportFormat> {
        self.iter().collect()
    }
}
