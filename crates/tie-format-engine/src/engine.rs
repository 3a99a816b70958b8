//! The engine facade.
//!
//! Every mutation follows the same path: resolve the current format at the
//! selected scope, change a copy, re-derive win criteria, settle the name,
//! validate against the owning event, then plan and apply propagation.
//! Identifiers drawn while planning are returned to the pool when the
//! operation fails.

use tracing::info;

use tie_format_core::{
    resolve_tie_format, validate_tie_format, Category, FormatCodeValidator, Gender,
    ResolvedTieFormat, Scope, ScopeSelector, StandardFormatCodes, TieFormat, TieFormatError,
    Tournament, ValidationContext,
};

use crate::audit::{audit_effects, TieFormatModification};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::ids::IdGenerator;
use crate::propagate::{
    apply_plan, plan_propagation, PropagationMode, PropagationOptions, PropagationOutcome,
    PropagationPlan,
};
use crate::score::{ScoreCalculator, TallyScoreCalculator};

/// Per-call options shared by every mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationOptions {
    /// Name to give the changed format. Without one, the name is cleared
    /// whenever the win criteria change.
    pub tie_format_name: Option<String>,
    /// Overrides `propagation.update_in_progress_match_ups`.
    pub update_in_progress_match_ups: Option<bool>,
}

impl MutationOptions {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.tie_format_name = Some(name.into());
        self
    }

    pub fn allow_in_progress(mut self) -> Self {
        self.update_in_progress_match_ups = Some(true);
        self
    }
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationResult {
    pub scope: Scope,
    /// The format now attached at the scope.
    pub tie_format: TieFormat,
    pub outcome: PropagationOutcome,
}

/// The format governing a scope, detached from the tournament.
#[derive(Debug, Clone)]
pub(crate) struct Current {
    pub scope: Scope,
    pub tie_format: TieFormat,
    pub gender: Option<Gender>,
    pub category: Option<Category>,
}

impl Current {
    fn from_resolved(scope: Scope, resolved: ResolvedTieFormat<'_>) -> Self {
        Self {
            scope,
            tie_format: resolved.tie_format.clone(),
            gender: resolved.nodes.event.gender,
            category: resolved.nodes.event.category.clone(),
        }
    }
}

/// Validates, mutates, and propagates tie formats.
pub struct TieFormatEngine {
    config: EngineConfig,
    ids: IdGenerator,
    format_codes: Box<dyn FormatCodeValidator>,
    scorer: Box<dyn ScoreCalculator>,
}

impl Default for TieFormatEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl TieFormatEngine {
    pub fn new(config: EngineConfig) -> Self {
        let ids = IdGenerator::new(config.ids.pool.clone());
        Self {
            config,
            ids,
            format_codes: Box::new(StandardFormatCodes),
            scorer: Box::new(TallyScoreCalculator),
        }
    }

    /// Builder: replace the match-up format code grammar.
    pub fn with_format_codes(mut self, format_codes: Box<dyn FormatCodeValidator>) -> Self {
        self.format_codes = format_codes;
        self
    }

    /// Builder: replace the tie score calculator.
    pub fn with_score_calculator(mut self, scorer: Box<dyn ScoreCalculator>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Resolve the format governing a selected scope.
    pub fn resolve<'a>(
        &self,
        tournament: &'a Tournament,
        selector: &ScopeSelector,
    ) -> Result<(Scope, ResolvedTieFormat<'a>)> {
        Ok(resolve_tie_format(tournament, selector)?)
    }

    /// Attach `tie_format` at a scope and reconcile everything it governs.
    pub fn propagate(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        mut tie_format: TieFormat,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        tie_format.recalculate_win_criteria();
        let scope = selector.to_scope(tournament)?;
        info!(%scope, "propagating tie format");
        let event = tournament
            .event(scope.event_id())
            .ok_or_else(|| TieFormatError::EventNotFound {
                event_id: scope.event_id().to_string(),
            })?;
        let ctx = self
            .validation_context(event.category.as_ref())
            .with_reference_gender(event.gender);
        validate_tie_format(&tie_format, &ctx)?;

        let record = TieFormatModification::new("propagateTieFormat", &scope)
            .with_detail("tieFormat", &tie_format);
        self.transact(|engine| {
            let plan =
                engine.plan(tournament, &scope, &tie_format, options, PropagationMode::Reconcile)?;
            engine.apply(tournament, plan, tie_format, record)
        })
    }

    pub(crate) fn next_id(&mut self) -> String {
        self.ids.next_id()
    }

    pub(crate) fn current(
        &self,
        tournament: &Tournament,
        selector: &ScopeSelector,
    ) -> Result<Current> {
        let (scope, resolved) = resolve_tie_format(tournament, selector)?;
        Ok(Current::from_resolved(scope, resolved))
    }

    pub(crate) fn validation_context<'a>(
        &'a self,
        category: Option<&'a Category>,
    ) -> ValidationContext<'a> {
        ValidationContext::new(self.format_codes.as_ref()).with_reference_category(category)
    }

    fn update_in_progress(&self, options: &MutationOptions) -> bool {
        options
            .update_in_progress_match_ups
            .unwrap_or(self.config.propagation.update_in_progress_match_ups)
    }

    /// Re-derive win criteria, settle the name, and validate.
    pub(crate) fn finish(
        &self,
        current: &Current,
        mut updated: TieFormat,
        options: &MutationOptions,
    ) -> Result<TieFormat> {
        updated.recalculate_win_criteria();
        match &options.tie_format_name {
            Some(name) => updated.tie_format_name = Some(name.clone()),
            None if updated.win_criteria != current.tie_format.win_criteria => {
                updated.tie_format_name = None;
            }
            None => {}
        }
        let ctx = self
            .validation_context(current.category.as_ref())
            .with_reference_gender(current.gender);
        validate_tie_format(&updated, &ctx)?;
        Ok(updated)
    }

    /// Run `f`, returning drawn identifiers to the pool if it fails.
    pub(crate) fn transact<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let checkpoint = self.ids.clone();
        let result = f(self);
        if result.is_err() {
            self.ids.restore(checkpoint);
        }
        result
    }

    pub(crate) fn plan(
        &mut self,
        tournament: &Tournament,
        scope: &Scope,
        tie_format: &TieFormat,
        options: &MutationOptions,
        mode: PropagationMode,
    ) -> Result<PropagationPlan> {
        let options = PropagationOptions {
            mode,
            update_in_progress: self.update_in_progress(options),
        };
        Ok(plan_propagation(
            tournament,
            scope,
            tie_format,
            options,
            &mut self.ids,
        )?)
    }

    pub(crate) fn apply(
        &self,
        tournament: &mut Tournament,
        mut plan: PropagationPlan,
        tie_format: TieFormat,
        record: TieFormatModification,
    ) -> Result<MutationResult> {
        if self.config.audit.enabled {
            let record = record
                .with_detail("addedMatchUpsCount", plan.added_match_ups_count())
                .with_detail("removedMatchUpsCount", plan.removed_match_ups_count());
            let effects = audit_effects(
                tournament,
                &plan.scope,
                &self.config.audit.extension_name,
                &record,
            );
            plan.effects.extend(effects);
        }
        let scope = plan.scope.clone();
        let outcome = apply_plan(tournament, plan, self.scorer.as_ref())?;
        info!(
            %scope,
            modified = outcome.modified_match_ups_count,
            added = outcome.added_match_ups_count,
            removed = outcome.removed_match_ups_count,
            "tie format applied"
        );
        Ok(MutationResult {
            scope,
            tie_format,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::modifications;
    use crate::config::TIE_FORMAT_MODIFICATIONS;
    use crate::testing::{fixture, tie_format_with_singles, DRAW_ID, EVENT_ID};
    use tie_format_core::{ErrorCode, ScopeLevel, WinCriteria};

    #[test]
    fn scenario_reduce_singles_across_event() {
        let mut t = fixture();
        let mut engine = TieFormatEngine::default();
        let result = engine
            .propagate(
                &mut t,
                &ScopeSelector::event(EVENT_ID),
                tie_format_with_singles(2),
                &MutationOptions::default(),
            )
            .unwrap();
        assert_eq!(result.outcome.modified_match_ups_count, 4);
        assert_eq!(result.outcome.removed_match_ups_count, 4);
        for m in &t.events[0].draw_definitions[0].structures[0].match_ups {
            assert_eq!(m.tie_match_ups.len(), 5);
            assert!(m.tie_format.is_none());
        }
    }

    #[test]
    fn propagated_win_criteria_are_rederived() {
        let mut t = fixture();
        let mut tie_format = tie_format_with_singles(2);
        tie_format.win_criteria = WinCriteria::ValueGoal(1);
        let result = TieFormatEngine::default()
            .propagate(
                &mut t,
                &ScopeSelector::event(EVENT_ID),
                tie_format,
                &MutationOptions::default(),
            )
            .unwrap();
        assert_eq!(result.tie_format.win_criteria, WinCriteria::ValueGoal(3));
        assert_eq!(
            t.events[0].tie_format.as_ref().unwrap().win_criteria,
            WinCriteria::ValueGoal(3)
        );
    }

    #[test]
    fn resolve_through_engine() {
        let t = fixture();
        let engine = TieFormatEngine::default();
        let (scope, resolved) = engine.resolve(&t, &ScopeSelector::draw(DRAW_ID)).unwrap();
        assert_eq!(scope.level(), ScopeLevel::Draw);
        assert_eq!(resolved.source, ScopeLevel::Event);
    }

    #[test]
    fn invalid_format_is_rejected_before_mutation() {
        let mut t = fixture();
        let snapshot = t.clone();
        let mut engine = TieFormatEngine::default();
        let mut bad = tie_format_with_singles(2);
        bad.collection_definitions[1].collection_id = "doubles".into();
        let err = engine
            .propagate(&mut t, &ScopeSelector::event(EVENT_ID), bad, &MutationOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::InvalidTieFormat));
        assert_eq!(t, snapshot);
    }

    #[test]
    fn failed_operation_returns_ids_to_pool() {
        let mut t = fixture();
        // m4 is locked with no usable fallback, so planning fails after ids
        // were drawn for m1 to m3.
        let m = &mut t.events[0].draw_definitions[0].structures[0].match_ups[3];
        m.winning_side = Some(1);
        m.tie_match_ups.pop();

        let config = EngineConfig::default().with_id_pool(vec!["p1".into(), "p2".into()]);
        let mut engine = TieFormatEngine::new(config);
        let err = engine
            .propagate(
                &mut t,
                &ScopeSelector::event(EVENT_ID),
                tie_format_with_singles(4),
                &MutationOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MissingTieFormat));
        assert_eq!(engine.next_id(), "p1");
    }

    #[test]
    fn audit_records_when_enabled() {
        let mut t = fixture();
        let mut engine = TieFormatEngine::new(EngineConfig::default().with_audit());
        engine
            .propagate(
                &mut t,
                &ScopeSelector::draw(DRAW_ID),
                tie_format_with_singles(4),
                &MutationOptions::default(),
            )
            .unwrap();
        let records = modifications(&t.events[0].draw_definitions[0], TIE_FORMAT_MODIFICATIONS);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].action, "propagateTieFormat");
        assert_eq!(records[0].detail["addedMatchUpsCount"], 4);

        let mut quiet = fixture();
        TieFormatEngine::default()
            .propagate(
                &mut quiet,
                &ScopeSelector::draw(DRAW_ID),
                tie_format_with_singles(4),
                &MutationOptions::default(),
            )
            .unwrap();
        assert!(quiet.events[0].draw_definitions[0].extensions.is_empty());
    }
}
