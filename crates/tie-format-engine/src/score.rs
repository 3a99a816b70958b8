//! Tie score recalculation after sub-match-ups change.

use std::collections::{BTreeMap, HashSet};

use tie_format_core::{MatchUp, Score, TieFormat, ValueAssignment, WinCriteria};

/// Refreshes a team match-up's score from its sub-match-ups.
pub trait ScoreCalculator {
    fn recalculate(&self, match_up: &mut MatchUp, tie_format: &TieFormat);
}

/// Sums the value each side has earned under the tie format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TallyScoreCalculator;

/// Values earned by side 1 and side 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideValues {
    pub side1: u32,
    pub side2: u32,
}

impl SideValues {
    fn add(&mut self, side: u8, value: u32) {
        match side {
            1 => self.side1 = self.side1.saturating_add(value),
            2 => self.side2 = self.side2.saturating_add(value),
            _ => {}
        }
    }

    fn majority(&self, count: u32) -> Option<u8> {
        let count = u64::from(count);
        if u64::from(self.side1) * 2 > count {
            Some(1)
        } else if u64::from(self.side2) * 2 > count {
            Some(2)
        } else {
            None
        }
    }
}

impl TallyScoreCalculator {
    /// Value earned by each side so far.
    pub fn tally(match_up: &MatchUp, tie_format: &TieFormat) -> SideValues {
        let mut values = SideValues::default();
        let groups: HashSet<u32> = tie_format
            .collection_groups
            .iter()
            .map(|g| g.group_number)
            .collect();
        let mut group_wins: BTreeMap<u32, (SideValues, u32)> = BTreeMap::new();

        for def in &tie_format.collection_definitions {
            let ties: Vec<_> = match_up.collection_tie_match_ups(&def.collection_id).collect();
            let mut wins = SideValues::default();
            for tie in &ties {
                if let Some(side) = tie.winning_side {
                    wins.add(side, 1);
                }
            }

            if let Some(number) = def
                .collection_group_number
                .filter(|n| groups.contains(n))
            {
                let entry = group_wins.entry(number).or_default();
                entry.0.add(1, wins.side1);
                entry.0.add(2, wins.side2);
                entry.1 = entry.1.saturating_add(def.match_up_count);
                continue;
            }

            match &def.value {
                ValueAssignment::CollectionValue(v) => {
                    if let Some(side) = wins.majority(def.match_up_count) {
                        values.add(side, *v);
                    }
                }
                ValueAssignment::MatchUpValue(_) | ValueAssignment::CollectionValueProfiles(_) => {
                    for tie in &ties {
                        if let (Some(side), Some(v)) =
                            (tie.winning_side, def.value.position_value(tie.collection_position))
                        {
                            values.add(side, v);
                        }
                    }
                }
                ValueAssignment::SetValue(v) => {
                    for set in ties.iter().filter_map(|t| t.score.as_ref()).flat_map(|s| &s.sets) {
                        if let Some(side) = set.winning_side {
                            values.add(side, *v);
                        }
                    }
                }
                ValueAssignment::ScoreValue(v) => {
                    for set in ties.iter().filter_map(|t| t.score.as_ref()).flat_map(|s| &s.sets) {
                        values.add(1, set.side1_score.unwrap_or(0).saturating_mul(*v));
                        values.add(2, set.side2_score.unwrap_or(0).saturating_mul(*v));
                    }
                }
            }
        }

        for group in &tie_format.collection_groups {
            let (Some(value), Some((wins, count))) =
                (group.group_value, group_wins.get(&group.group_number))
            else {
                continue;
            };
            if let Some(side) = wins.majority(*count) {
                values.add(side, value);
            }
        }

        values
    }
}

impl ScoreCalculator for TallyScoreCalculator {
    fn recalculate(&self, match_up: &mut MatchUp, tie_format: &TieFormat) {
        let values = Self::tally(match_up, tie_format);
        let decided = match_up
            .tie_match_ups
            .iter()
            .any(|t| t.winning_side.is_some() || t.has_score());

        match_up.score = decided.then(|| Score {
            score_string_side1: Some(format!("{}-{}", values.side1, values.side2)),
            score_string_side2: Some(format!("{}-{}", values.side2, values.side1)),
            sets: Vec::new(),
        });

        match_up.winning_side = match tie_format.win_criteria {
            WinCriteria::ValueGoal(goal) if values.side1 >= goal => Some(1),
            WinCriteria::ValueGoal(goal) if values.side2 >= goal => Some(2),
            WinCriteria::ValueGoal(_) => None,
            WinCriteria::AggregateValue => {
                let all_complete = !match_up.tie_match_ups.is_empty()
                    && match_up
                        .tie_match_ups
                        .iter()
                        .all(|t| t.winning_side.is_some() || t.match_up_status.is_completed());
                match values.side1.cmp(&values.side2) {
                    std::cmp::Ordering::Greater if all_complete => Some(1),
                    std::cmp::Ordering::Less if all_complete => Some(2),
                    _ => None,
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tie_format_core::{
        CollectionDefinition, CollectionGroup, MatchUpStatus, MatchUpType, SetScore, TieMatchUp,
    };

    fn match_up_for(tf: &TieFormat) -> MatchUp {
        let mut n = 0;
        let mut m = MatchUp::team("m1");
        m.tie_match_ups = TieMatchUp::generate_for(tf, || {
            n += 1;
            format!("t{n}")
        });
        m
    }

    fn win(m: &mut MatchUp, collection_id: &str, position: u32, side: u8) {
        if let Some(tie) = m
            .tie_match_ups
            .iter_mut()
            .find(|t| t.collection_id == collection_id && t.collection_position == position)
        {
            tie.winning_side = Some(side);
            tie.match_up_status = MatchUpStatus::Completed;
        }
    }

    fn college_default() -> TieFormat {
        TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Doubles, 3, ValueAssignment::CollectionValue(1))
                    .with_id("doubles"),
                CollectionDefinition::new(MatchUpType::Singles, 6, ValueAssignment::MatchUpValue(1))
                    .with_id("singles"),
            ],
            vec![],
        )
    }

    #[test]
    fn collection_value_needs_majority() {
        let tf = college_default();
        let mut m = match_up_for(&tf);
        win(&mut m, "doubles", 1, 1);
        assert_eq!(TallyScoreCalculator::tally(&m, &tf), SideValues::default());
        win(&mut m, "doubles", 2, 1);
        assert_eq!(TallyScoreCalculator::tally(&m, &tf).side1, 1);
    }

    #[test]
    fn goal_sets_winning_side() {
        let tf = college_default();
        let mut m = match_up_for(&tf);
        for position in 1..=4 {
            win(&mut m, "singles", position, 2);
        }
        TallyScoreCalculator.recalculate(&mut m, &tf);
        assert_eq!(m.winning_side, Some(2));
        assert_eq!(
            m.score.as_ref().and_then(|s| s.score_string_side1.as_deref()),
            Some("0-4")
        );
    }

    #[test]
    fn nothing_decided_clears_score() {
        let tf = college_default();
        let mut m = match_up_for(&tf);
        m.score = Some(Score::default());
        TallyScoreCalculator.recalculate(&mut m, &tf);
        assert!(m.score.is_none());
        assert!(m.winning_side.is_none());
    }

    #[test]
    fn set_and_score_values() {
        let tf = TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Singles, 1, ValueAssignment::SetValue(1))
                    .with_id("sets"),
                CollectionDefinition::new(MatchUpType::Doubles, 1, ValueAssignment::ScoreValue(1))
                    .with_id("games"),
            ],
            vec![],
        );
        let mut m = match_up_for(&tf);
        let set = |n, a, b, w| SetScore {
            set_number: n,
            side1_score: Some(a),
            side2_score: Some(b),
            winning_side: Some(w),
        };
        m.tie_match_ups[0].score = Some(Score {
            sets: vec![set(1, 6, 3, 1), set(2, 4, 6, 2), set(3, 6, 1, 1)],
            ..Default::default()
        });
        m.tie_match_ups[1].score = Some(Score {
            sets: vec![set(1, 5, 3, 1)],
            ..Default::default()
        });
        let values = TallyScoreCalculator::tally(&m, &tf);
        assert_eq!(values, SideValues { side1: 7, side2: 4 });
    }

    #[test]
    fn group_value_awarded_once() {
        let tf = TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Doubles, 1, ValueAssignment::MatchUpValue(1))
                    .with_id("doubles")
                    .in_group(1),
                CollectionDefinition::new(MatchUpType::Singles, 2, ValueAssignment::MatchUpValue(1))
                    .with_id("singles")
                    .in_group(1),
            ],
            vec![CollectionGroup {
                group_number: 1,
                group_value: Some(2),
                group_name: None,
            }],
        );
        let mut m = match_up_for(&tf);
        win(&mut m, "doubles", 1, 1);
        win(&mut m, "singles", 1, 1);
        assert_eq!(TallyScoreCalculator::tally(&m, &tf), SideValues { side1: 2, side2: 0 });
    }

    #[test]
    fn large_score_values_saturate() {
        let tf = TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Singles, 1, ValueAssignment::ScoreValue(u32::MAX))
                    .with_id("games"),
            ],
            vec![],
        );
        let mut m = match_up_for(&tf);
        m.tie_match_ups[0].score = Some(Score {
            sets: vec![SetScore {
                set_number: 1,
                side1_score: Some(6),
                side2_score: Some(0),
                winning_side: Some(1),
            }],
            ..Default::default()
        });
        let values = TallyScoreCalculator::tally(&m, &tf);
        assert_eq!(values, SideValues { side1: u32::MAX, side2: 0 });
        assert_eq!(values.majority(u32::MAX), Some(1));
    }
}
