//! Mutation and propagation engine for tie formats.
//!
//! Builds on `tie-format-core` to change the format governing an event,
//! draw, structure, or team match-up, and carries each change down to the
//! team match-ups that inherit it.
//!
//! # Architecture
//!
//! Every operation on [`TieFormatEngine`] runs in two phases:
//! - **Plan** ([`plan_propagation`]) computes the sub-match-ups to add and
//!   remove, the formats to attach, and the match-ups to pin, without
//!   touching the tournament.
//! - **Apply** ([`apply_plan`]) commits that plan, recalculates tie scores,
//!   appends audit records, and returns batched [`Notification`]s.
//!
//! A match-up that has been won, completed, or scored is locked and keeps
//! the format it was playing under.

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod ids;
pub mod lock;
pub mod notify;
pub mod ops;
pub mod propagate;
pub mod score;

#[cfg(test)]
mod testing;

// Re-exports for convenience.
pub use audit::{modifications, TieFormatModification};
pub use config::{AuditConfig, EngineConfig, IdConfig, PropagationConfig, TIE_FORMAT_MODIFICATIONS};
pub use engine::{MutationOptions, MutationResult, TieFormatEngine};
pub use error::{EngineError, Result};
pub use ids::IdGenerator;
pub use lock::{is_unlocked, lock_reason, LockReason};
pub use notify::{publish, Notification, NotificationScope, NotificationSink};
pub use ops::{CollectionChanges, TieFormatReplacement};
pub use propagate::{
    apply_plan, governed_match_ups, plan_propagation, Effect, MatchUpLocation, PropagationMode,
    PropagationOptions, PropagationOutcome, PropagationPlan,
};
pub use score::{ScoreCalculator, TallyScoreCalculator};
