//! Tie-format model and pure rules for team competitions.
//!
//! A tie is a team match-up made of several individual sub-match-ups,
//! grouped into collections of singles or doubles with a value assignment.
//! The [`TieFormat`] declares those collections and the win criteria derived
//! from them, and may be attached to an event, draw, structure, or team
//! match-up of a [`Tournament`].
//!
//! This crate holds everything that does not mutate a tournament:
//! - win-criteria derivation ([`calculate_win_criteria`])
//! - structural validation ([`validate_tie_format`])
//! - comparison ([`compare_tie_formats`])
//! - scope resolution ([`resolve_tie_format`])
//! - named templates ([`TieFormatTemplate`])

pub mod category;
pub mod collection;
pub mod compare;
pub mod error;
pub mod format_code;
pub mod hash;
pub mod model;
pub mod resolve;
pub mod templates;
pub mod tie_format;
pub mod validate;
pub mod win_criteria;

pub use category::{category_violations, gender_violations, Category};
pub use collection::{
    CollectionDefinition, CollectionGroup, CollectionId, Gender, MatchUpType, ValueAssignment,
    ValueKey, ValueProfile,
};
pub use compare::{compare_tie_formats, describe_tie_format, CompareConsiderations, TieFormatComparison};
pub use error::{ErrorCode, Result, TieFormatError};
pub use format_code::{parse_match_up_format, FormatCodeValidator, StandardFormatCodes};
pub use model::{
    CollectionAssignment, DrawDefinition, Event, Extension, LineUpEntry, MatchUp, MatchUpStatus,
    Score, SetScore, Side, Structure, TieMatchUp, Tournament,
};
pub use resolve::{
    effective_for_match_up, inherited_tie_format, resolve_tie_format, scope_nodes,
    ResolvedTieFormat, Scope, ScopeLevel, ScopeNodes, ScopeSelector,
};
pub use templates::TieFormatTemplate;
pub use tie_format::{copy_tie_format, TieFormat, WinCriteria};
pub use validate::{
    validate_collection_definition, validate_collection_definition_json, validate_tie_format,
    validate_tie_format_json, ValidationContext,
};
pub use win_criteria::{calculate_win_criteria, value_totals, ValueTotals};
