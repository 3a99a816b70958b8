//! Two-phase propagation of a tie format through the hierarchy.
//!
//! [`plan_propagation`] walks every team match-up governed by the target
//! scope, decides how each one is reconciled against the new format, and
//! records the outcome as a list of [`Effect`]s. Nothing is changed while
//! planning, so any failure leaves the tournament untouched.
//! [`apply_plan`] then commits the effects.
//!
//! A container that declares its own tie format is an override: the walk
//! stops there. An inheriting match-up that cannot follow the new format,
//! because it is locked or its sub-match-ups cannot be reconciled, is
//! pinned to the format it was playing under.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use tie_format_core::{
    compare_tie_formats, effective_for_match_up, scope_nodes, CollectionId, CompareConsiderations,
    DrawDefinition, Event, MatchUp, Result, Scope, Structure, TieFormat, TieFormatError,
    TieMatchUp, Tournament,
};

use crate::ids::IdGenerator;
use crate::lock::lock_reason;
use crate::score::ScoreCalculator;

/// Full address of a team match-up.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpLocation {
    pub event_id: String,
    pub draw_id: String,
    pub structure_id: String,
    pub match_up_id: String,
}

impl MatchUpLocation {
    fn of(event: &Event, draw: &DrawDefinition, structure: &Structure, match_up: &MatchUp) -> Self {
        Self {
            event_id: event.event_id.clone(),
            draw_id: draw.draw_id.clone(),
            structure_id: structure.structure_id.clone(),
            match_up_id: match_up.match_up_id.clone(),
        }
    }

    pub fn scope(&self) -> Scope {
        Scope::MatchUp {
            event_id: self.event_id.clone(),
            draw_id: self.draw_id.clone(),
            structure_id: self.structure_id.clone(),
            match_up_id: self.match_up_id.clone(),
        }
    }
}

/// A single change to the tournament.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Declare a tie format at a container.
    AttachTieFormat { target: Scope, tie_format: TieFormat },
    AddTieMatchUps {
        location: MatchUpLocation,
        tie_match_ups: Vec<TieMatchUp>,
    },
    /// Delete sub-match-ups and the line-up assignments to their positions.
    RemoveTieMatchUps {
        location: MatchUpLocation,
        match_up_ids: Vec<String>,
        positions: Vec<(CollectionId, u32)>,
    },
    RecalculateScore { location: MatchUpLocation },
    AppendAudit {
        draw_id: String,
        extension_name: String,
        record: serde_json::Value,
    },
}

/// How far propagation goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagationMode {
    /// Add and remove sub-match-ups to match the new counts.
    Reconcile,
    /// Only attach the format. Used when counts cannot change.
    AttachOnly,
}

/// Options for one propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOptions {
    pub mode: PropagationMode,
    pub update_in_progress: bool,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            mode: PropagationMode::Reconcile,
            update_in_progress: false,
        }
    }
}

/// A team match-up reached by the walk, with its containers.
#[derive(Debug, Clone, Copy)]
pub struct GovernedMatchUp<'a> {
    pub event: &'a Event,
    pub draw: &'a DrawDefinition,
    pub structure: &'a Structure,
    pub match_up: &'a MatchUp,
}

impl<'a> GovernedMatchUp<'a> {
    pub fn location(&self) -> MatchUpLocation {
        MatchUpLocation::of(self.event, self.draw, self.structure, self.match_up)
    }

    /// The format this match-up currently plays under.
    pub fn effective_tie_format(&self) -> Option<&'a TieFormat> {
        effective_for_match_up(self.event, self.draw, self.structure, self.match_up)
    }
}

/// Team match-ups whose effective format is decided at `scope`.
///
/// Containers and match-ups below the scope that declare their own format
/// are skipped. At match-up scope the target itself is returned.
pub fn governed_match_ups<'a>(
    tournament: &'a Tournament,
    scope: &Scope,
) -> Result<Vec<GovernedMatchUp<'a>>> {
    let nodes = scope_nodes(tournament, scope)?;
    let event = nodes.event;
    let mut governed = Vec::new();

    if let (Some(draw), Some(structure), Some(match_up)) =
        (nodes.draw, nodes.structure, nodes.match_up)
    {
        governed.push(GovernedMatchUp {
            event,
            draw,
            structure,
            match_up,
        });
        return Ok(governed);
    }

    let draws: Vec<&DrawDefinition> = match nodes.draw {
        Some(draw) => vec![draw],
        None => event.draw_definitions.iter().collect(),
    };
    for draw in draws {
        if nodes.draw.is_none() && draw.tie_format.is_some() {
            debug!(draw_id = %draw.draw_id, "draw overrides tie format, skipping");
            continue;
        }
        let structures: Vec<&Structure> = match nodes.structure {
            Some(structure) => vec![structure],
            None => draw.structures.iter().collect(),
        };
        for structure in structures {
            if nodes.structure.is_none() && structure.tie_format.is_some() {
                debug!(structure_id = %structure.structure_id, "structure overrides tie format, skipping");
                continue;
            }
            for match_up in structure.match_ups.iter().filter(|m| m.is_team()) {
                if match_up.tie_format.is_some() {
                    debug!(match_up_id = %match_up.match_up_id, "match-up overrides tie format, skipping");
                    continue;
                }
                governed.push(GovernedMatchUp {
                    event,
                    draw,
                    structure,
                    match_up,
                });
            }
        }
    }
    Ok(governed)
}

/// Computed changes for one propagation, not yet applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationPlan {
    pub scope: Scope,
    pub effects: Vec<Effect>,
    pub modified_match_ups: Vec<MatchUpLocation>,
    /// `(draw_id, structure_id)` of every structure whose match-ups or
    /// effective format change.
    pub modified_structures: BTreeSet<(String, String)>,
    /// `draw_id -> event_id` of every affected draw.
    pub modified_draws: BTreeMap<String, String>,
    /// Match-ups left on their prior format.
    pub pinned_match_up_ids: Vec<String>,
}

impl PropagationPlan {
    fn new(scope: Scope) -> Self {
        Self {
            scope,
            effects: Vec::new(),
            modified_match_ups: Vec::new(),
            modified_structures: BTreeSet::new(),
            modified_draws: BTreeMap::new(),
            pinned_match_up_ids: Vec::new(),
        }
    }

    pub fn added_match_ups_count(&self) -> usize {
        self.effects
            .iter()
            .map(|e| match e {
                Effect::AddTieMatchUps { tie_match_ups, .. } => tie_match_ups.len(),
                _ => 0,
            })
            .sum()
    }

    pub fn removed_match_ups_count(&self) -> usize {
        self.effects
            .iter()
            .map(|e| match e {
                Effect::RemoveTieMatchUps { match_up_ids, .. } => match_up_ids.len(),
                _ => 0,
            })
            .sum()
    }

    fn touch(&mut self, location: &MatchUpLocation) {
        self.modified_structures
            .insert((location.draw_id.clone(), location.structure_id.clone()));
        self.modified_draws
            .insert(location.draw_id.clone(), location.event_id.clone());
    }

    fn mark_modified(&mut self, location: MatchUpLocation) {
        self.touch(&location);
        if !self.modified_match_ups.contains(&location) {
            self.modified_match_ups.push(location);
        }
    }
}

/// Sub-match-up changes bringing a match-up in line with a format.
#[derive(Debug, Default)]
struct Reconciliation {
    added: Vec<TieMatchUp>,
    removed: Vec<(String, CollectionId, u32)>,
}

impl Reconciliation {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Work out additions and removals, or `None` when a required removal would
/// touch a sub-match-up that has been played.
fn reconcile(
    match_up: &MatchUp,
    tie_format: &TieFormat,
    ids: &mut IdGenerator,
) -> Option<Reconciliation> {
    let required = tie_format.match_up_counts();
    let existing = match_up.tie_match_up_counts();
    let mut plan = Reconciliation::default();

    for def in &tie_format.collection_definitions {
        let want = required.get(&def.collection_id).copied().unwrap_or(0);
        let have = existing.get(&def.collection_id).copied().unwrap_or(0);
        if want <= have {
            continue;
        }
        let next_position = match_up
            .collection_tie_match_ups(&def.collection_id)
            .map(|t| t.collection_position)
            .max()
            .unwrap_or(0)
            + 1;
        for position in next_position..next_position + (want - have) {
            plan.added.push(TieMatchUp::new(
                ids.next_id(),
                def.collection_id.clone(),
                position,
                def.match_up_type,
            ));
        }
    }

    for (collection_id, &have) in &existing {
        let want = required.get(collection_id).copied().unwrap_or(0);
        if have <= want {
            continue;
        }
        let excess = (have - want) as usize;
        let mut candidates: Vec<&TieMatchUp> = match_up
            .collection_tie_match_ups(collection_id)
            .filter(|t| t.is_not_yet_played())
            .collect();
        if candidates.len() < excess {
            return None;
        }
        candidates.sort_by(|a, b| b.collection_position.cmp(&a.collection_position));
        plan.removed.extend(candidates.into_iter().take(excess).map(|t| {
            (
                t.match_up_id.clone(),
                t.collection_id.clone(),
                t.collection_position,
            )
        }));
    }

    Some(plan)
}

fn materially_differs(a: &TieFormat, b: &TieFormat) -> bool {
    compare_tie_formats(a, b, CompareConsiderations::default()).different
}

fn push_reconciliation(
    plan: &mut PropagationPlan,
    location: &MatchUpLocation,
    changes: Reconciliation,
) {
    if !changes.added.is_empty() {
        plan.effects.push(Effect::AddTieMatchUps {
            location: location.clone(),
            tie_match_ups: changes.added,
        });
    }
    if !changes.removed.is_empty() {
        let (match_up_ids, positions) = changes
            .removed
            .into_iter()
            .map(|(id, collection_id, position)| (id, (collection_id, position)))
            .unzip();
        plan.effects.push(Effect::RemoveTieMatchUps {
            location: location.clone(),
            match_up_ids,
            positions,
        });
    }
}

/// Compute the effects of attaching `tie_format` at `scope`.
pub fn plan_propagation(
    tournament: &Tournament,
    scope: &Scope,
    tie_format: &TieFormat,
    options: PropagationOptions,
    ids: &mut IdGenerator,
) -> Result<PropagationPlan> {
    let mut plan = PropagationPlan::new(scope.clone());
    let governed = governed_match_ups(tournament, scope)?;
    let fingerprint = tie_format.fingerprint();

    if let Some(match_up_id) = scope.match_up_id() {
        let Some(target) = governed.first() else {
            return Err(TieFormatError::MatchUpNotFound {
                match_up_id: match_up_id.to_string(),
            });
        };
        plan_match_up_target(&mut plan, target, tie_format, options, ids)?;
        return Ok(plan);
    }

    plan.effects.push(Effect::AttachTieFormat {
        target: scope.clone(),
        tie_format: tie_format.clone(),
    });
    if let Scope::Structure {
        draw_id,
        structure_id,
        event_id,
    } = scope
    {
        plan.modified_structures
            .insert((draw_id.clone(), structure_id.clone()));
        plan.modified_draws.insert(draw_id.clone(), event_id.clone());
    }
    if let Scope::Draw { draw_id, event_id } = scope {
        plan.modified_draws.insert(draw_id.clone(), event_id.clone());
    }

    for governed in &governed {
        let location = governed.location();
        let prior = governed.effective_tie_format();
        let effective_changes = prior.map(TieFormat::fingerprint).as_ref() != Some(&fingerprint);

        let counts = governed.match_up.tie_match_up_counts();
        if options.mode == PropagationMode::AttachOnly || counts == tie_format.match_up_counts() {
            let locked = lock_reason(governed.match_up, options.update_in_progress).is_some();
            let keep_prior = options.mode == PropagationMode::Reconcile
                && locked
                && prior.is_some_and(|p| {
                    materially_differs(p, tie_format) && p.match_up_counts() == counts
                });
            if keep_prior {
                pin_prior(&mut plan, governed, prior, tie_format, "locked")?;
            } else if effective_changes {
                if !locked {
                    plan.effects.push(Effect::RecalculateScore {
                        location: location.clone(),
                    });
                }
                plan.mark_modified(location);
            }
            continue;
        }

        if let Some(reason) = lock_reason(governed.match_up, options.update_in_progress) {
            debug!(match_up_id = %location.match_up_id, %reason, "match-up is locked");
            pin_prior(&mut plan, governed, prior, tie_format, "locked")?;
            continue;
        }

        match reconcile(governed.match_up, tie_format, ids) {
            Some(changes) => {
                push_reconciliation(&mut plan, &location, changes);
                plan.effects.push(Effect::RecalculateScore {
                    location: location.clone(),
                });
                plan.mark_modified(location);
            }
            None => {
                warn!(
                    match_up_id = %location.match_up_id,
                    "played sub-match-ups prevent reconciliation"
                );
                pin_prior(&mut plan, governed, prior, tie_format, "unreconcilable")?;
            }
        }
    }

    Ok(plan)
}

/// Keep an inheriting match-up on the format it was playing under.
fn pin_prior(
    plan: &mut PropagationPlan,
    governed: &GovernedMatchUp<'_>,
    prior: Option<&TieFormat>,
    tie_format: &TieFormat,
    why: &str,
) -> Result<()> {
    let location = governed.location();
    let counts = governed.match_up.tie_match_up_counts();
    let Some(prior) = prior.filter(|p| materially_differs(p, tie_format) && p.match_up_counts() == counts)
    else {
        warn!(match_up_id = %location.match_up_id, why, "no format to fall back on");
        return Err(TieFormatError::MissingTieFormat {
            context: format!("{why} match-up {}", location.match_up_id),
        });
    };

    debug!(match_up_id = %location.match_up_id, why, "pinning prior tie format");
    plan.effects.push(Effect::AttachTieFormat {
        target: location.scope(),
        tie_format: prior.clone(),
    });
    plan.pinned_match_up_ids.push(location.match_up_id.clone());
    plan.mark_modified(location);
    Ok(())
}

fn plan_match_up_target(
    plan: &mut PropagationPlan,
    target: &GovernedMatchUp<'_>,
    tie_format: &TieFormat,
    options: PropagationOptions,
    ids: &mut IdGenerator,
) -> Result<()> {
    let location = target.location();
    if let Some(reason) = lock_reason(target.match_up, options.update_in_progress) {
        warn!(match_up_id = %location.match_up_id, %reason, "refusing to modify locked match-up");
        return Err(TieFormatError::CannotModifyTieFormat {
            match_up_id: location.match_up_id,
            reason: reason.to_string(),
        });
    }

    plan.effects.push(Effect::AttachTieFormat {
        target: location.scope(),
        tie_format: tie_format.clone(),
    });

    if options.mode == PropagationMode::Reconcile {
        let changes = reconcile(target.match_up, tie_format, ids).ok_or_else(|| {
            TieFormatError::CannotModifyTieFormat {
                match_up_id: location.match_up_id.clone(),
                reason: "played sub-match-ups cannot be removed".to_string(),
            }
        })?;
        if !changes.is_empty() {
            push_reconciliation(plan, &location, changes);
        }
    }

    plan.effects.push(Effect::RecalculateScore {
        location: location.clone(),
    });
    plan.mark_modified(location);
    Ok(())
}

/// Counts and notifications from an applied plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationOutcome {
    pub modified_match_ups_count: usize,
    pub modified_structures_count: usize,
    pub added_match_ups_count: usize,
    pub removed_match_ups_count: usize,
    pub pinned_match_up_ids: Vec<String>,
    #[serde(skip)]
    pub notifications: Vec<crate::notify::Notification>,
}

impl PropagationOutcome {
    /// Fold a later step of the same operation into this outcome.
    pub fn absorb(&mut self, later: PropagationOutcome) {
        self.modified_match_ups_count = self
            .modified_match_ups_count
            .max(later.modified_match_ups_count);
        self.modified_structures_count = self
            .modified_structures_count
            .max(later.modified_structures_count);
        self.added_match_ups_count += later.added_match_ups_count;
        self.removed_match_ups_count += later.removed_match_ups_count;
        for id in later.pinned_match_up_ids {
            if !self.pinned_match_up_ids.contains(&id) {
                self.pinned_match_up_ids.push(id);
            }
        }
        self.notifications.extend(later.notifications);
    }
}

fn missing(scope: &Scope) -> TieFormatError {
    match scope.draw_id() {
        None => TieFormatError::EventNotFound {
            event_id: scope.event_id().to_string(),
        },
        Some(draw_id) => TieFormatError::MissingDrawDefinition {
            draw_id: Some(draw_id.to_string()),
        },
    }
}

/// The format slot of the container a scope addresses.
fn tie_format_slot<'a>(
    tournament: &'a mut Tournament,
    scope: &Scope,
) -> Option<&'a mut Option<TieFormat>> {
    match scope {
        Scope::Event { event_id } => tournament.event_mut(event_id).map(|e| &mut e.tie_format),
        Scope::Draw { draw_id, .. } => tournament.draw_mut(draw_id).map(|d| &mut d.tie_format),
        Scope::Structure {
            draw_id,
            structure_id,
            ..
        } => tournament
            .structure_mut(draw_id, structure_id)
            .map(|s| &mut s.tie_format),
        Scope::MatchUp {
            draw_id,
            structure_id,
            match_up_id,
            ..
        } => tournament
            .match_up_mut(draw_id, structure_id, match_up_id)
            .map(|m| &mut m.tie_format),
    }
}

fn match_up_at<'a>(tournament: &'a mut Tournament, location: &MatchUpLocation) -> Result<&'a mut MatchUp> {
    tournament
        .match_up_mut(&location.draw_id, &location.structure_id, &location.match_up_id)
        .ok_or_else(|| TieFormatError::MatchUpNotFound {
            match_up_id: location.match_up_id.clone(),
        })
}

/// Check every effect addresses something that exists.
fn check_targets(tournament: &Tournament, plan: &PropagationPlan) -> Result<()> {
    for effect in &plan.effects {
        match effect {
            Effect::AttachTieFormat { target, .. } => {
                scope_nodes(tournament, target)?;
            }
            Effect::AddTieMatchUps { location, .. }
            | Effect::RemoveTieMatchUps { location, .. }
            | Effect::RecalculateScore { location } => {
                scope_nodes(tournament, &location.scope())?;
            }
            Effect::AppendAudit { draw_id, .. } => {
                if tournament.event_of_draw(draw_id).is_none() {
                    return Err(TieFormatError::MissingDrawDefinition {
                        draw_id: Some(draw_id.clone()),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Commit a plan computed against this tournament.
///
/// Targets are checked before anything is written.
pub fn apply_plan(
    tournament: &mut Tournament,
    plan: PropagationPlan,
    scorer: &dyn ScoreCalculator,
) -> Result<PropagationOutcome> {
    check_targets(tournament, &plan)?;
    let notifications = crate::notify::notifications_for(&tournament.tournament_id, &plan);
    let added_match_ups_count = plan.added_match_ups_count();
    let removed_match_ups_count = plan.removed_match_ups_count();

    for effect in plan.effects {
        match effect {
            Effect::AttachTieFormat { target, tie_format } => {
                let slot = tie_format_slot(tournament, &target).ok_or_else(|| missing(&target))?;
                *slot = Some(tie_format);
            }
            Effect::AddTieMatchUps {
                location,
                tie_match_ups,
            } => {
                match_up_at(tournament, &location)?
                    .tie_match_ups
                    .extend(tie_match_ups);
            }
            Effect::RemoveTieMatchUps {
                location,
                match_up_ids,
                positions,
            } => {
                let match_up = match_up_at(tournament, &location)?;
                match_up
                    .tie_match_ups
                    .retain(|t| !match_up_ids.contains(&t.match_up_id));
                for entry in match_up.sides.iter_mut().flat_map(|s| s.line_up.iter_mut()) {
                    entry.collection_assignments.retain(|a| {
                        !positions.iter().any(|(collection_id, position)| {
                            a.collection_id == *collection_id && a.collection_position == *position
                        })
                    });
                }
            }
            Effect::RecalculateScore { location } => {
                let nodes = scope_nodes(tournament, &location.scope())?;
                let effective = nodes.effective_tie_format().map(|(tf, _)| tf.clone());
                if let Some(tie_format) = effective {
                    scorer.recalculate(match_up_at(tournament, &location)?, &tie_format);
                }
            }
            Effect::AppendAudit {
                draw_id,
                extension_name,
                record,
            } => {
                let draw = tournament.draw_mut(&draw_id).ok_or_else(|| {
                    TieFormatError::MissingDrawDefinition {
                        draw_id: Some(draw_id.clone()),
                    }
                })?;
                crate::audit::append_record(draw, &extension_name, record);
            }
        }
    }

    Ok(PropagationOutcome {
        modified_match_ups_count: plan.modified_match_ups.len(),
        modified_structures_count: plan.modified_structures.len(),
        added_match_ups_count,
        removed_match_ups_count,
        pinned_match_up_ids: plan.pinned_match_up_ids,
        notifications,
    })
}
