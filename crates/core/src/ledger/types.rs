use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fileset_id::FilesetId;

/// Classification of a failed acquisition step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionErrorKind {
    /// The service had no content for the unit.
    NotAvailable,
    /// Network error or timeout.
    TransportFailure,
    /// The service answered with an error status or an unreadable body.
    ApiError,
    /// Content arrived but could not be stored.
    WriteFailed,
}

impl AcquisitionErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotAvailable => "not_available",
            Self::TransportFailure => "transport_failure",
            Self::ApiError => "api_error",
            Self::WriteFailed => "write_failed",
        }
    }
}

/// One failed attempt for one fileset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatError {
    pub timestamp: DateTime<Utc>,
    pub error_type: AcquisitionErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fileset: Option<FilesetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distinct_id: Option<String>,
    /// Declared fileset type, e.g. `audio_drama`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl FormatError {
    pub fn new(error_type: AcquisitionErrorKind) -> Self {
        Self {
            timestamp: Utc::now(),
            error_type,
            fileset: None,
            distinct_id: None,
            format: None,
            details: None,
        }
    }

    pub fn with_fileset(mut self, fileset: &FilesetId) -> Self {
        self.fileset = Some(fileset.clone());
        self
    }

    pub fn with_distinct_id(mut self, distinct_id: impl Into<String>) -> Self {
        self.distinct_id = Some(distinct_id.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        let format = format.into();
        if !format.is_empty() {
            self.format = Some(format);
        }
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// All failures for one (book, chapter), by content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionErrorEntry {
    /// Time of the most recent failure.
    pub timestamp: DateTime<Utc>,
    pub book: String,
    pub chapter: u32,
    #[serde(default)]
    pub audio_errors: Vec<FormatError>,
    #[serde(default)]
    pub text_errors: Vec<FormatError>,
    #[serde(default)]
    pub timing_errors: Vec<FormatError>,
}

impl AcquisitionErrorEntry {
    pub fn new(book: impl Into<String>, chapter: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            book: book.into(),
            chapter,
            audio_errors: Vec::new(),
            text_errors: Vec::new(),
            timing_errors: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        !(self.audio_errors.is_empty()
            && self.text_errors.is_empty()
            && self.timing_errors.is_empty())
    }
}

/// Persisted ledger document for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLedgerDocument {
    pub language: String,
    #[serde(default)]
    pub errors: Vec<AcquisitionErrorEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ErrorLedgerDocument {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            errors: Vec::new(),
            last_updated: None,
        }
    }
}

/// Error counts for a language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSummary {
    pub total_chapters_with_errors: usize,
    pub audio_errors: usize,
    pub text_errors: usize,
    pub timing_errors: usize,
}

impl ErrorSummary {
    pub fn total(&self) -> usize {
        self.audio_errors + self.text_errors + self.timing_errors
    }
}
