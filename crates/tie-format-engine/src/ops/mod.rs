//! Tie-format mutations.
//!
//! Each operation is an `impl TieFormatEngine` block in its own module.

mod bulk;
mod collections;
mod groups;
mod ordering;

pub use bulk::TieFormatReplacement;
pub use collections::CollectionChanges;

use tie_format_core::{Scope, Tournament};

use crate::error::Result;
use crate::propagate::governed_match_ups;

/// Ids of governed match-ups holding sub-match-ups of a collection.
fn match_ups_playing(
    tournament: &Tournament,
    scope: &Scope,
    collection_id: &str,
) -> Result<Vec<String>> {
    Ok(governed_match_ups(tournament, scope)?
        .into_iter()
        .filter(|g| g.match_up.collection_tie_match_ups(collection_id).next().is_some())
        .map(|g| g.match_up.match_up_id.clone())
        .collect())
}
