//! Win-criteria derivation from collection values.
//!
//! Each collection outside a group contributes its collection value, the sum
//! of its positional profile values, or its match-up value times its count.
//! Each group contributes its group value once. Score and set values make
//! the total unpredictable, which forces aggregate scoring.

use std::collections::HashSet;

use crate::collection::{CollectionDefinition, CollectionGroup, ValueAssignment};
use crate::tie_format::WinCriteria;

/// Value and count totals of a set of collections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValueTotals {
    /// Summed fixed value available in the tie.
    pub total_value: u32,
    /// Summed sub-match-up count.
    pub match_up_count: u32,
    /// Some collection uses score or set values.
    pub aggregate_value_imperative: bool,
}

/// Accumulate the value available across collections and groups.
pub fn value_totals(
    collection_definitions: &[CollectionDefinition],
    collection_groups: &[CollectionGroup],
) -> ValueTotals {
    let group_numbers: HashSet<u32> = collection_groups.iter().map(|g| g.group_number).collect();
    let mut totals = ValueTotals::default();

    for def in collection_definitions {
        totals.match_up_count = totals.match_up_count.saturating_add(def.match_up_count);

        if def.value.is_unpredictable() {
            totals.aggregate_value_imperative = true;
            continue;
        }

        let grouped = def
            .collection_group_number
            .is_some_and(|n| group_numbers.contains(&n));
        if grouped {
            continue;
        }

        let value = match &def.value {
            ValueAssignment::CollectionValue(v) => *v,
            ValueAssignment::CollectionValueProfiles(profiles) => profiles
                .iter()
                .fold(0u32, |sum, p| sum.saturating_add(p.value)),
            ValueAssignment::MatchUpValue(v) => v.saturating_mul(def.match_up_count),
            ValueAssignment::ScoreValue(_) | ValueAssignment::SetValue(_) => 0,
        };
        totals.total_value = totals.total_value.saturating_add(value);
    }

    totals.total_value = collection_groups
        .iter()
        .filter_map(|g| g.group_value)
        .fold(totals.total_value, u32::saturating_add);

    totals
}

/// Derive the win criteria for a set of collections and groups.
pub fn calculate_win_criteria(
    collection_definitions: &[CollectionDefinition],
    collection_groups: &[CollectionGroup],
) -> WinCriteria {
    let totals = value_totals(collection_definitions, collection_groups);
    if totals.aggregate_value_imperative || totals.total_value == 0 {
        return WinCriteria::AggregateValue;
    }
    WinCriteria::ValueGoal(totals.total_value / 2 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{MatchUpType, ValueProfile};

    fn doubles(count: u32, value: ValueAssignment) -> CollectionDefinition {
        CollectionDefinition::new(MatchUpType::Doubles, count, value).with_id("doubles")
    }

    fn singles(count: u32, value: ValueAssignment) -> CollectionDefinition {
        CollectionDefinition::new(MatchUpType::Singles, count, value).with_id("singles")
    }

    #[test]
    fn collection_value_counts_once() {
        let defs = vec![
            doubles(3, ValueAssignment::CollectionValue(1)),
            singles(6, ValueAssignment::MatchUpValue(1)),
        ];
        assert_eq!(value_totals(&defs, &[]).total_value, 7);
        assert_eq!(calculate_win_criteria(&defs, &[]), WinCriteria::ValueGoal(4));
    }

    #[test]
    fn match_up_value_multiplies_by_count() {
        let defs = vec![
            doubles(3, ValueAssignment::MatchUpValue(1)),
            singles(6, ValueAssignment::MatchUpValue(1)),
        ];
        assert_eq!(value_totals(&defs, &[]).total_value, 9);
        assert_eq!(calculate_win_criteria(&defs, &[]), WinCriteria::ValueGoal(5));
    }

    #[test]
    fn set_value_forces_aggregate() {
        let defs = vec![
            doubles(3, ValueAssignment::SetValue(1)),
            singles(6, ValueAssignment::MatchUpValue(1)),
        ];
        assert_eq!(calculate_win_criteria(&defs, &[]), WinCriteria::AggregateValue);

        let defs = vec![singles(6, ValueAssignment::ScoreValue(1))];
        assert_eq!(calculate_win_criteria(&defs, &[]), WinCriteria::AggregateValue);
    }

    #[test]
    fn zero_total_is_aggregate() {
        let defs = vec![singles(2, ValueAssignment::MatchUpValue(0))];
        assert_eq!(calculate_win_criteria(&defs, &[]), WinCriteria::AggregateValue);
        assert_eq!(calculate_win_criteria(&[], &[]), WinCriteria::AggregateValue);
    }

    #[test]
    fn profiles_sum_their_values() {
        let profiles = (1..=3)
            .map(|p| ValueProfile {
                collection_position: p,
                value: p,
            })
            .collect();
        let defs = vec![singles(3, ValueAssignment::CollectionValueProfiles(profiles))];
        assert_eq!(value_totals(&defs, &[]).total_value, 6);
        assert_eq!(calculate_win_criteria(&defs, &[]), WinCriteria::ValueGoal(4));
    }

    #[test]
    fn groups_replace_member_values() {
        let defs = vec![
            doubles(3, ValueAssignment::MatchUpValue(1)).in_group(1),
            singles(4, ValueAssignment::MatchUpValue(1)).in_group(1),
            CollectionDefinition::new(MatchUpType::Singles, 2, ValueAssignment::MatchUpValue(1))
                .with_id("reverse"),
        ];
        let groups = vec![CollectionGroup {
            group_number: 1,
            group_value: Some(3),
            group_name: None,
        }];
        let totals = value_totals(&defs, &groups);
        assert_eq!(totals.total_value, 5);
        assert_eq!(totals.match_up_count, 9);
        assert_eq!(calculate_win_criteria(&defs, &groups), WinCriteria::ValueGoal(3));
    }

    #[test]
    fn huge_values_saturate() {
        let defs = vec![
            singles(3, ValueAssignment::MatchUpValue(2_000_000_000)),
            doubles(1, ValueAssignment::CollectionValue(u32::MAX)),
        ];
        assert_eq!(value_totals(&defs, &[]).total_value, u32::MAX);
        assert_eq!(
            calculate_win_criteria(&defs, &[]),
            WinCriteria::ValueGoal(u32::MAX / 2 + 1)
        );
    }

    #[test]
    fn dangling_group_number_counts_individually() {
        let defs = vec![singles(4, ValueAssignment::MatchUpValue(1)).in_group(9)];
        assert_eq!(value_totals(&defs, &[]).total_value, 4);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn fixed_value() -> impl Strategy<Value = ValueAssignment> {
            prop_oneof![
                (0u32..5).prop_map(ValueAssignment::CollectionValue),
                (0u32..5).prop_map(ValueAssignment::MatchUpValue),
            ]
        }

        fn definitions() -> impl Strategy<Value = Vec<CollectionDefinition>> {
            prop::collection::vec((1u32..8, fixed_value()), 1..6).prop_map(|specs| {
                specs
                    .into_iter()
                    .enumerate()
                    .map(|(i, (count, value))| {
                        CollectionDefinition::new(MatchUpType::Singles, count, value)
                            .with_id(format!("c{i}"))
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn goal_is_majority_of_total(defs in definitions()) {
                let total = value_totals(&defs, &[]).total_value;
                match calculate_win_criteria(&defs, &[]) {
                    WinCriteria::ValueGoal(goal) => prop_assert_eq!(goal, total / 2 + 1),
                    WinCriteria::AggregateValue => prop_assert_eq!(total, 0),
                }
            }

            #[test]
            fn stable_under_reordering(defs in definitions(), rotation in 0usize..6) {
                let mut reordered = defs.clone();
                let len = reordered.len();
                reordered.rotate_left(rotation % len);
                reordered.reverse();
                prop_assert_eq!(
                    calculate_win_criteria(&defs, &[]),
                    calculate_win_criteria(&reordered, &[])
                );
            }
        }
    }
}
