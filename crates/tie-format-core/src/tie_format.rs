//! The tie format: composition rules for a team match-up.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collection::{CollectionDefinition, CollectionGroup, CollectionId};
use crate::hash::{bytes_hash, content_hash, hash_hex};
use crate::win_criteria::calculate_win_criteria;

/// How the winner of a tie is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWinCriteria", into = "RawWinCriteria")]
pub enum WinCriteria {
    /// First side to reach this cumulative value wins.
    ValueGoal(u32),
    /// The side with the greater summed value wins once all sub-match-ups end.
    AggregateValue,
}

impl WinCriteria {
    pub fn value_goal(&self) -> Option<u32> {
        match self {
            WinCriteria::ValueGoal(goal) => Some(*goal),
            WinCriteria::AggregateValue => None,
        }
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, WinCriteria::AggregateValue)
    }
}

impl fmt::Display for WinCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinCriteria::ValueGoal(goal) => write!(f, "valueGoal {goal}"),
            WinCriteria::AggregateValue => write!(f, "aggregateValue"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWinCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value_goal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aggregate_value: Option<bool>,
}

impl TryFrom<RawWinCriteria> for WinCriteria {
    type Error = String;

    fn try_from(raw: RawWinCriteria) -> Result<Self, Self::Error> {
        match (raw.value_goal, raw.aggregate_value.unwrap_or(false)) {
            (Some(0), _) => Err("valueGoal must be a positive integer".into()),
            (Some(goal), false) => Ok(WinCriteria::ValueGoal(goal)),
            (None, true) => Ok(WinCriteria::AggregateValue),
            (Some(_), true) => Err("winCriteria cannot declare both valueGoal and aggregateValue".into()),
            (None, false) => Err("winCriteria requires valueGoal or aggregateValue".into()),
        }
    }
}

impl From<WinCriteria> for RawWinCriteria {
    fn from(criteria: WinCriteria) -> Self {
        match criteria {
            WinCriteria::ValueGoal(goal) => RawWinCriteria {
                value_goal: Some(goal),
                aggregate_value: None,
            },
            WinCriteria::AggregateValue => RawWinCriteria {
                value_goal: None,
                aggregate_value: Some(true),
            },
        }
    }
}

/// The declared composition rules for a tie.
///
/// Tie formats are never mutated where they are attached: operations clone,
/// change the clone, validate it, and only then replace the attached value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_format_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_format_name: Option<String>,
    pub win_criteria: WinCriteria,
    #[serde(default)]
    pub collection_definitions: Vec<CollectionDefinition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub collection_groups: Vec<CollectionGroup>,
}

#[derive(Debug, Serialize)]
struct Composition<'a> {
    win_criteria: &'a WinCriteria,
    collection_definitions: &'a [CollectionDefinition],
    collection_groups: &'a [CollectionGroup],
}

impl TieFormat {
    /// Build a tie format, deriving its win criteria from the collections.
    pub fn new(
        collection_definitions: Vec<CollectionDefinition>,
        collection_groups: Vec<CollectionGroup>,
    ) -> Self {
        let win_criteria = calculate_win_criteria(&collection_definitions, &collection_groups);
        Self {
            tie_format_id: None,
            tie_format_name: None,
            win_criteria,
            collection_definitions,
            collection_groups,
        }
    }

    /// Builder: set the tie format name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tie_format_name = Some(name.into());
        self
    }

    /// Look up a collection by id.
    pub fn collection(&self, collection_id: &str) -> Option<&CollectionDefinition> {
        self.collection_definitions
            .iter()
            .find(|c| c.collection_id == collection_id)
    }

    /// Look up a collection by id (mutable).
    pub fn collection_mut(&mut self, collection_id: &str) -> Option<&mut CollectionDefinition> {
        self.collection_definitions
            .iter_mut()
            .find(|c| c.collection_id == collection_id)
    }

    /// Look up a collection group by number.
    pub fn group(&self, group_number: u32) -> Option<&CollectionGroup> {
        self.collection_groups
            .iter()
            .find(|g| g.group_number == group_number)
    }

    /// Required sub-match-up count per collection.
    pub fn match_up_counts(&self) -> BTreeMap<CollectionId, u32> {
        let mut counts = BTreeMap::new();
        for c in &self.collection_definitions {
            if c.match_up_count > 0 {
                let count = counts.entry(c.collection_id.clone()).or_insert(0u32);
                *count = count.saturating_add(c.match_up_count);
            }
        }
        counts
    }

    /// Total number of sub-match-ups across all collections.
    pub fn total_match_up_count(&self) -> u32 {
        self.collection_definitions
            .iter()
            .map(|c| c.match_up_count)
            .fold(0, u32::saturating_add)
    }

    /// Re-derive win criteria from the current collections and groups.
    pub fn recalculate_win_criteria(&mut self) {
        self.win_criteria =
            calculate_win_criteria(&self.collection_definitions, &self.collection_groups);
    }

    /// The next unused group number.
    pub fn next_group_number(&self) -> u32 {
        self.collection_groups
            .iter()
            .map(|g| g.group_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Sort collections by `collection_order`, keeping insertion order for ties.
    pub fn sort_by_order(&mut self) {
        self.collection_definitions
            .sort_by_key(|c| c.collection_order);
    }

    /// Sort by order, then renumber orders densely from 1.
    pub fn renumber_orders(&mut self) {
        self.sort_by_order();
        for (i, c) in self.collection_definitions.iter_mut().enumerate() {
            c.collection_order = i as u32 + 1;
        }
    }

    /// Hex SHA-256 fingerprint of the composition, ignoring id and name.
    pub fn fingerprint(&self) -> String {
        let composition = Composition {
            win_criteria: &self.win_criteria,
            collection_definitions: &self.collection_definitions,
            collection_groups: &self.collection_groups,
        };
        let hash = content_hash(&composition).unwrap_or_else(|err| {
            warn!(%err, "tie format has no JSON form; fingerprinting its debug form");
            bytes_hash(format!("{composition:?}").as_bytes())
        });
        hash_hex(&hash)
    }
}

/// Deep, side-effect-free copy of a tie format.
pub fn copy_tie_format(tie_format: &TieFormat) -> TieFormat {
    tie_format.clone()
}
