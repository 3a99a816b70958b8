use tracing::{debug, info};

use tie_format_core::{
    compare_tie_formats, validate_tie_format, CompareConsiderations, ScopeSelector, TieFormat,
    TieFormatComparison, TieFormatError, Tournament,
};

use super::CollectionChanges;
use crate::audit::TieFormatModification;
use crate::engine::{MutationOptions, MutationResult, TieFormatEngine};
use crate::error::Result;
use crate::propagate::{PropagationMode, PropagationOutcome};

/// Result of replacing the format at a scope.
#[derive(Debug, Clone, PartialEq)]
pub struct TieFormatReplacement {
    pub comparison: TieFormatComparison,
    /// `None` when the replacement matched the current format.
    pub result: Option<MutationResult>,
}

impl TieFormatEngine {
    /// Replace the format at a scope with `replacement`.
    ///
    /// Shared collections are modified, new ones added, and missing ones
    /// removed, then the replacement itself is propagated. All steps run
    /// against a working copy of the tournament, which replaces the
    /// original only when every step succeeds.
    pub fn modify_tie_format(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        mut replacement: TieFormat,
        options: &MutationOptions,
    ) -> Result<TieFormatReplacement> {
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, "modifying tie format");
        replacement.recalculate_win_criteria();
        let ctx = self
            .validation_context(current.category.as_ref())
            .with_reference_gender(current.gender);
        validate_tie_format(&replacement, &ctx)?;

        let comparison = compare_tie_formats(
            &current.tie_format,
            &replacement,
            CompareConsiderations {
                collection_order: true,
                collection_name: true,
            },
        );
        if current.tie_format.fingerprint() == replacement.fingerprint()
            && current.tie_format.tie_format_name == replacement.tie_format_name
        {
            debug!(scope = %current.scope, "replacement matches current format");
            return Ok(TieFormatReplacement {
                comparison,
                result: None,
            });
        }

        let step_options = MutationOptions {
            tie_format_name: None,
            ..options.clone()
        };
        let mut scratch = tournament.clone();
        let result = self.transact(|engine| {
            let mut outcome = PropagationOutcome::default();

            for def in &replacement.collection_definitions {
                let Some(prior) = current.tie_format.collection(&def.collection_id) else {
                    continue;
                };
                let changes = CollectionChanges::between(prior, def);
                if !changes.is_empty() {
                    let step = engine.modify_collection_definition(
                        &mut scratch,
                        selector,
                        &def.collection_id,
                        changes,
                        &step_options,
                    )?;
                    outcome.absorb(step.outcome);
                }
            }

            for collection_id in &comparison.added_collection_ids {
                let mut def = replacement
                    .collection(collection_id)
                    .cloned()
                    .ok_or_else(|| TieFormatError::CollectionNotFound {
                        collection_id: collection_id.clone(),
                    })?;
                // Groups are settled by the final propagation.
                def.collection_group_number = None;
                let step =
                    engine.add_collection_definition(&mut scratch, selector, def, &step_options)?;
                outcome.absorb(step.outcome);
            }

            for collection_id in &comparison.removed_collection_ids {
                let step = engine.remove_collection_definition(
                    &mut scratch,
                    selector,
                    collection_id,
                    &step_options,
                )?;
                outcome.absorb(step.outcome);
            }

            let mut final_format = replacement;
            match &options.tie_format_name {
                Some(name) => final_format.tie_format_name = Some(name.clone()),
                None if final_format.win_criteria != current.tie_format.win_criteria
                    && final_format.tie_format_name == current.tie_format.tie_format_name =>
                {
                    final_format.tie_format_name = None;
                }
                None => {}
            }
            let plan = engine.plan(
                &scratch,
                &current.scope,
                &final_format,
                options,
                PropagationMode::Reconcile,
            )?;
            let record = TieFormatModification::new("modifyTieFormat", &current.scope)
                .with_detail("comparison", &comparison);
            let last = engine.apply(&mut scratch, plan, final_format, record)?;
            outcome.absorb(last.outcome);
            Ok(MutationResult {
                scope: last.scope,
                tie_format: last.tie_format,
                outcome,
            })
        })?;

        *tournament = scratch;
        Ok(TieFormatReplacement {
            comparison,
            result: Some(result),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, tie_format_with_singles, DRAW_ID, EVENT_ID};
    use tie_format_core::{
        CollectionDefinition, ErrorCode, MatchUpStatus, MatchUpType, ValueAssignment,
        WinCriteria,
    };

    fn event() -> ScopeSelector {
        ScopeSelector::event(EVENT_ID)
    }

    #[test]
    fn identical_replacement_is_a_no_op() {
        let mut t = fixture();
        let snapshot = t.clone();
        let replacement = t.events[0].tie_format.clone().unwrap();
        let replaced = TieFormatEngine::default()
            .modify_tie_format(&mut t, &event(), replacement, &MutationOptions::default())
            .unwrap();
        assert!(replaced.result.is_none());
        assert!(!replaced.comparison.different);
        assert_eq!(t, snapshot);
    }

    #[test]
    fn reduce_singles_through_replacement() {
        let mut t = fixture();
        let replaced = TieFormatEngine::default()
            .modify_tie_format(
                &mut t,
                &event(),
                tie_format_with_singles(2).with_name("Short"),
                &MutationOptions::default(),
            )
            .unwrap();
        let result = replaced.result.unwrap();
        assert_eq!(result.outcome.modified_match_ups_count, 4);
        assert_eq!(result.outcome.removed_match_ups_count, 4);
        assert!(replaced.comparison.different);

        let tf = t.events[0].tie_format.as_ref().unwrap();
        assert_eq!(tf.tie_format_name.as_deref(), Some("Short"));
        assert_eq!(tf.total_match_up_count(), 5);
    }

    #[test]
    fn adds_and_removes_collections() {
        let mut t = fixture();
        let replacement = TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Doubles, 3, ValueAssignment::MatchUpValue(1))
                    .with_id("doubles")
                    .with_name("Doubles")
                    .with_order(1),
                CollectionDefinition::new(MatchUpType::Singles, 2, ValueAssignment::MatchUpValue(2))
                    .with_id("top")
                    .with_order(2),
            ],
            vec![],
        );
        let replaced = TieFormatEngine::default()
            .modify_tie_format(&mut t, &event(), replacement, &MutationOptions::default())
            .unwrap();
        assert_eq!(replaced.comparison.added_collection_ids, vec!["top"]);
        assert_eq!(replaced.comparison.removed_collection_ids, vec!["singles"]);
        let outcome = replaced.result.unwrap().outcome;
        assert_eq!(outcome.added_match_ups_count, 8);
        assert_eq!(outcome.removed_match_ups_count, 12);

        let tf = t.events[0].tie_format.as_ref().unwrap();
        assert_eq!(tf.win_criteria, WinCriteria::ValueGoal(4));
        for m in &t.events[0].draw_definitions[0].structures[0].match_ups {
            assert_eq!(m.tie_match_ups.len(), 5);
        }
    }

    #[test]
    fn failing_step_leaves_tournament_untouched() {
        let mut t = fixture();
        let m1 = &mut t.events[0].draw_definitions[0].structures[0].match_ups[0];
        let played = m1
            .tie_match_ups
            .iter_mut()
            .find(|tie| tie.collection_id == "singles")
            .unwrap();
        played.match_up_status = MatchUpStatus::Completed;
        played.winning_side = Some(1);
        let snapshot = t.clone();

        // Renaming doubles succeeds, removing singles cannot.
        let replacement = TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Doubles, 3, ValueAssignment::MatchUpValue(1))
                    .with_id("doubles")
                    .with_name("Pairs")
                    .with_order(1),
            ],
            vec![],
        );
        let err = TieFormatEngine::default()
            .modify_tie_format(
                &mut t,
                &ScopeSelector::match_up(DRAW_ID, "m1"),
                replacement,
                &MutationOptions::default().allow_in_progress(),
            )
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NoModificationsApplied));
        assert_eq!(t, snapshot);
    }

    #[test]
    fn invalid_replacement_is_rejected() {
        let mut t = fixture();
        let mut replacement = tie_format_with_singles(3);
        replacement.collection_definitions[1].match_up_count = 0;
        let err = TieFormatEngine::default()
            .modify_tie_format(&mut t, &event(), replacement, &MutationOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidTieFormat));
    }

    #[test]
    fn declared_win_criteria_are_rederived() {
        let mut t = fixture();
        let mut replacement = tie_format_with_singles(2);
        replacement.win_criteria = WinCriteria::ValueGoal(1);
        TieFormatEngine::default()
            .modify_tie_format(&mut t, &event(), replacement, &MutationOptions::default())
            .unwrap();
        let tf = t.events[0].tie_format.as_ref().unwrap();
        assert_eq!(tf.win_criteria, WinCriteria::ValueGoal(3));
    }

    #[test]
    fn stale_name_is_cleared_when_goal_changes() {
        let mut t = fixture();
        t.events[0].tie_format.as_mut().unwrap().tie_format_name = Some("Standard".into());
        TieFormatEngine::default()
            .modify_tie_format(
                &mut t,
                &event(),
                tie_format_with_singles(2).with_name("Standard"),
                &MutationOptions::default(),
            )
            .unwrap();
        let tf = t.events[0].tie_format.as_ref().unwrap();
        assert!(tf.tie_format_name.is_none());
        assert_eq!(tf.win_criteria, WinCriteria::ValueGoal(3));
    }
}
