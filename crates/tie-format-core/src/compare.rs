//! Structural comparison of two tie formats.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::collection::{CollectionDefinition, CollectionId};
use crate::tie_format::TieFormat;
use crate::win_criteria::value_totals;

/// Aspects that only count as differences when the caller asks for them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareConsiderations {
    pub collection_order: bool,
    pub collection_name: bool,
}

/// Result of comparing an ancestor tie format with a descendant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TieFormatComparison {
    pub different: bool,
    pub description_changed: bool,
    pub ancestor_description: String,
    pub descendant_description: String,
    /// Collections present only in the descendant.
    pub added_collection_ids: Vec<CollectionId>,
    /// Collections present only in the ancestor.
    pub removed_collection_ids: Vec<CollectionId>,
    pub ancestor_value: u32,
    pub descendant_value: u32,
    pub ancestor_match_up_count: u32,
    pub descendant_match_up_count: u32,
    pub order_changed: bool,
    pub names_changed: bool,
    /// Shared collections whose value assignment kind or content differs.
    pub value_changed_collection_ids: Vec<CollectionId>,
}

/// A human-readable description, insensitive to collection order and ids.
pub fn describe_tie_format(tie_format: &TieFormat) -> String {
    let mut collections: Vec<String> = tie_format
        .collection_definitions
        .iter()
        .map(describe_collection)
        .collect();
    collections.sort();

    let mut groups: Vec<String> = tie_format
        .collection_groups
        .iter()
        .map(|g| match g.group_value {
            Some(v) => format!("G{}={v}", g.group_number),
            None => format!("G{}", g.group_number),
        })
        .collect();
    groups.sort();

    let mut description = collections.join(" + ");
    if !groups.is_empty() {
        description.push_str(&format!(" [{}]", groups.join(", ")));
    }
    description.push_str(&format!(" ({})", tie_format.win_criteria));
    description
}

fn describe_collection(def: &CollectionDefinition) -> String {
    let mut s = format!("{}-{}", def.match_up_count, def.match_up_type);
    if let Some(format) = &def.match_up_format {
        s.push(':');
        s.push_str(format);
    }
    if let Some(code) = def
        .category
        .as_ref()
        .and_then(|c| c.age_category_code.as_deref())
    {
        s.push(':');
        s.push_str(code);
    }
    if let Some(gender) = def.gender {
        s.push_str(&format!(":{gender}"));
    }
    s
}

/// Compare two tie formats.
pub fn compare_tie_formats(
    ancestor: &TieFormat,
    descendant: &TieFormat,
    considerations: CompareConsiderations,
) -> TieFormatComparison {
    let ancestor_totals = value_totals(&ancestor.collection_definitions, &ancestor.collection_groups);
    let descendant_totals = value_totals(
        &descendant.collection_definitions,
        &descendant.collection_groups,
    );
    let ancestor_description = describe_tie_format(ancestor);
    let descendant_description = describe_tie_format(descendant);

    let mut comparison = TieFormatComparison {
        ancestor_value: ancestor_totals.total_value,
        descendant_value: descendant_totals.total_value,
        ancestor_match_up_count: ancestor_totals.match_up_count,
        descendant_match_up_count: descendant_totals.match_up_count,
        description_changed: ancestor_description != descendant_description,
        ancestor_description,
        descendant_description,
        ..Default::default()
    };

    if ancestor.fingerprint() == descendant.fingerprint() {
        return comparison;
    }

    let ancestor_ids: BTreeSet<&str> = ancestor
        .collection_definitions
        .iter()
        .map(|c| c.collection_id.as_str())
        .collect();
    let descendant_ids: BTreeSet<&str> = descendant
        .collection_definitions
        .iter()
        .map(|c| c.collection_id.as_str())
        .collect();
    comparison.added_collection_ids = descendant_ids
        .difference(&ancestor_ids)
        .map(|id| id.to_string())
        .collect();
    comparison.removed_collection_ids = ancestor_ids
        .difference(&descendant_ids)
        .map(|id| id.to_string())
        .collect();

    let order = |tf: &TieFormat| -> Vec<(String, u32)> {
        let mut sorted: Vec<&CollectionDefinition> = tf.collection_definitions.iter().collect();
        sorted.sort_by_key(|c| c.collection_order);
        sorted
            .into_iter()
            .map(|c| (c.collection_id.clone(), c.collection_order))
            .collect()
    };
    comparison.order_changed = order(ancestor) != order(descendant);

    let names = |tf: &TieFormat| -> BTreeMap<String, Option<String>> {
        tf.collection_definitions
            .iter()
            .map(|c| (c.collection_id.clone(), c.collection_name.clone()))
            .collect()
    };
    comparison.names_changed = names(ancestor) != names(descendant);

    for def in &descendant.collection_definitions {
        if let Some(prior) = ancestor.collection(&def.collection_id) {
            if prior.value != def.value {
                comparison
                    .value_changed_collection_ids
                    .push(def.collection_id.clone());
            }
        }
    }

    comparison.different = comparison.description_changed
        || (considerations.collection_order && comparison.order_changed)
        || (considerations.collection_name && comparison.names_changed)
        || !comparison.value_changed_collection_ids.is_empty();

    comparison
}
