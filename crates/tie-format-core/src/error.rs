//! Error types for tie-format validation, resolution, and mutation.

use std::fmt;

/// Stable error kinds, as reported to callers that key on codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidTieFormat,
    InvalidCollectionDefinition,
    InvalidValues,
    MissingValue,
    NotFound,
    DuplicateValue,
    CannotModifyTieFormat,
    MissingTieFormat,
    MissingDrawDefinition,
    NotImplemented,
    NoModificationsApplied,
}

impl ErrorCode {
    /// The wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidTieFormat => "INVALID_TIE_FORMAT",
            ErrorCode::InvalidCollectionDefinition => "INVALID_COLLECTION_DEFINITION",
            ErrorCode::InvalidValues => "INVALID_VALUES",
            ErrorCode::MissingValue => "MISSING_VALUE",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::DuplicateValue => "DUPLICATE_VALUE",
            ErrorCode::CannotModifyTieFormat => "CANNOT_MODIFY_TIEFORMAT",
            ErrorCode::MissingTieFormat => "MISSING_TIE_FORMAT",
            ErrorCode::MissingDrawDefinition => "MISSING_DRAW_DEFINITION",
            ErrorCode::NotImplemented => "NOT_IMPLEMENTED",
            ErrorCode::NoModificationsApplied => "NO_MODIFICATIONS_APPLIED",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from tie-format validation, resolution, and mutation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TieFormatError {
    #[error("invalid tie format: {}", .errors.join("; "))]
    InvalidTieFormat { errors: Vec<String> },

    #[error("invalid collection definition {}: {}", display_id(.collection_id), .errors.join("; "))]
    InvalidCollectionDefinition {
        collection_id: Option<String>,
        errors: Vec<String>,
    },

    #[error("invalid values: {reason}")]
    InvalidValues { reason: String },

    #[error("missing value: {param}")]
    MissingValue { param: &'static str },

    #[error("collection {collection_id} not found")]
    CollectionNotFound { collection_id: String },

    #[error("collection group {group_number} not found")]
    CollectionGroupNotFound { group_number: u32 },

    #[error("event {event_id} not found")]
    EventNotFound { event_id: String },

    #[error("structure {structure_id} not found")]
    StructureNotFound { structure_id: String },

    #[error("match-up {match_up_id} not found")]
    MatchUpNotFound { match_up_id: String },

    #[error("collection id {collection_id} is already in use")]
    DuplicateValue { collection_id: String },

    #[error("cannot modify tie format of match-up {match_up_id}: {reason}")]
    CannotModifyTieFormat { match_up_id: String, reason: String },

    #[error("no tie format found for {context}")]
    MissingTieFormat { context: String },

    #[error("draw definition {} not found", display_id(.draw_id))]
    MissingDrawDefinition { draw_id: Option<String> },

    #[error("not implemented: {feature}")]
    NotImplemented { feature: String },

    #[error("no modifications applied for collection {collection_id}: {} locked match-up(s)", .locked_match_up_ids.len())]
    NoModificationsApplied {
        collection_id: String,
        locked_match_up_ids: Vec<String>,
    },
}

fn display_id(id: &Option<String>) -> &str {
    id.as_deref().unwrap_or("<unspecified>")
}

impl TieFormatError {
    /// Map this error onto its reported kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            TieFormatError::InvalidTieFormat { .. } => ErrorCode::InvalidTieFormat,
            TieFormatError::InvalidCollectionDefinition { .. } => {
                ErrorCode::InvalidCollectionDefinition
            }
            TieFormatError::InvalidValues { .. } => ErrorCode::InvalidValues,
            TieFormatError::MissingValue { .. } => ErrorCode::MissingValue,
            TieFormatError::CollectionNotFound { .. }
            | TieFormatError::CollectionGroupNotFound { .. }
            | TieFormatError::EventNotFound { .. }
            | TieFormatError::StructureNotFound { .. }
            | TieFormatError::MatchUpNotFound { .. } => ErrorCode::NotFound,
            TieFormatError::DuplicateValue { .. } => ErrorCode::DuplicateValue,
            TieFormatError::CannotModifyTieFormat { .. } => ErrorCode::CannotModifyTieFormat,
            TieFormatError::MissingTieFormat { .. } => ErrorCode::MissingTieFormat,
            TieFormatError::MissingDrawDefinition { .. } => ErrorCode::MissingDrawDefinition,
            TieFormatError::NotImplemented { .. } => ErrorCode::NotImplemented,
            TieFormatError::NoModificationsApplied { .. } => ErrorCode::NoModificationsApplied,
        }
    }

    /// Individual violations carried by a validation failure.
    pub fn violations(&self) -> &[String] {
        match self {
            TieFormatError::InvalidTieFormat { errors }
            | TieFormatError::InvalidCollectionDefinition { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Result type alias for tie-format operations.
pub type Result<T> = std::result::Result<T, TieFormatError>;
