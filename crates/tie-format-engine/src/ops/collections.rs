use serde::Serialize;
use tracing::info;

use tie_format_core::{
    copy_tie_format, Category, CollectionDefinition, Gender, MatchUpType, ScopeSelector,
    TieFormatError, Tournament, ValueAssignment,
};

use super::match_ups_playing;
use crate::audit::TieFormatModification;
use crate::engine::{MutationOptions, MutationResult, TieFormatEngine};
use crate::error::{EngineError, Result};
use crate::propagate::PropagationMode;

/// Fields to change on an existing collection. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_up_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_up_type: Option<MatchUpType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_up_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<ValueAssignment>,
}

impl CollectionChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Changes turning `from` into `to`, leaving count and type alone.
    pub(crate) fn between(from: &CollectionDefinition, to: &CollectionDefinition) -> Self {
        fn changed<T: PartialEq + Clone>(a: &T, b: &T) -> Option<T> {
            (a != b).then(|| b.clone())
        }
        Self {
            collection_name: changed(&from.collection_name, &to.collection_name).flatten(),
            collection_order: changed(&from.collection_order, &to.collection_order),
            match_up_count: None,
            match_up_type: None,
            match_up_format: changed(&from.match_up_format, &to.match_up_format).flatten(),
            category: changed(&from.category, &to.category).flatten(),
            gender: changed(&from.gender, &to.gender).flatten(),
            value: changed(&from.value, &to.value),
        }
    }
}

impl TieFormatEngine {
    /// Add a collection to the format governing a scope.
    ///
    /// An empty `collection_id` is assigned from the id generator. An unset
    /// order appends the collection after the existing ones.
    pub fn add_collection_definition(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        mut definition: CollectionDefinition,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, collection_id = %definition.collection_id, "adding collection definition");
        let mut updated = copy_tie_format(&current.tie_format);

        self.transact(|engine| {
            if definition.collection_id.trim().is_empty() {
                definition.collection_id = loop {
                    let id = engine.next_id();
                    if updated.collection(&id).is_none() {
                        break id;
                    }
                };
            } else if updated.collection(&definition.collection_id).is_some() {
                return Err(TieFormatError::DuplicateValue {
                    collection_id: definition.collection_id,
                }
                .into());
            }
            if definition.collection_order == 0 {
                definition.collection_order = updated
                    .collection_definitions
                    .iter()
                    .map(|c| c.collection_order)
                    .max()
                    .unwrap_or(0)
                    + 1;
            }

            let record = TieFormatModification::new("addCollectionDefinition", &current.scope)
                .with_collection(definition.collection_id.clone())
                .with_detail("collectionDefinition", &definition);
            updated.collection_definitions.push(definition);
            updated.renumber_orders();

            let updated = engine.finish(&current, updated, options)?;
            let plan = engine.plan(
                tournament,
                &current.scope,
                &updated,
                options,
                PropagationMode::Reconcile,
            )?;
            engine.apply(tournament, plan, updated, record)
        })
    }

    /// Remove a collection, its sub-match-ups, and its group.
    ///
    /// Fails with `NoModificationsApplied` when every match-up holding
    /// sub-match-ups of the collection is locked.
    pub fn remove_collection_definition(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        collection_id: &str,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, collection_id, "removing collection definition");
        let Some(removed) = current.tie_format.collection(collection_id) else {
            return Err(TieFormatError::CollectionNotFound {
                collection_id: collection_id.to_string(),
            }
            .into());
        };

        let mut updated = copy_tie_format(&current.tie_format);
        updated
            .collection_definitions
            .retain(|c| c.collection_id != collection_id);
        if let Some(group_number) = removed.collection_group_number {
            for c in &mut updated.collection_definitions {
                if c.collection_group_number == Some(group_number) {
                    c.collection_group_number = None;
                }
            }
            updated
                .collection_groups
                .retain(|g| g.group_number != group_number);
        }
        let playing = match_ups_playing(tournament, &current.scope, collection_id)?;

        self.transact(|engine| {
            let updated = engine.finish(&current, updated, options)?;
            let plan = match engine.plan(
                tournament,
                &current.scope,
                &updated,
                options,
                PropagationMode::Reconcile,
            ) {
                Err(EngineError::TieFormat(TieFormatError::CannotModifyTieFormat {
                    match_up_id,
                    ..
                })) => {
                    return Err(TieFormatError::NoModificationsApplied {
                        collection_id: collection_id.to_string(),
                        locked_match_up_ids: vec![match_up_id],
                    }
                    .into())
                }
                other => other?,
            };
            if !playing.is_empty() && playing.iter().all(|id| plan.pinned_match_up_ids.contains(id)) {
                return Err(TieFormatError::NoModificationsApplied {
                    collection_id: collection_id.to_string(),
                    locked_match_up_ids: plan.pinned_match_up_ids,
                }
                .into());
            }

            let record = TieFormatModification::new("removeCollectionDefinition", &current.scope)
                .with_collection(collection_id);
            engine.apply(tournament, plan, updated, record)
        })
    }

    /// Change fields of an existing collection.
    ///
    /// Count and type cannot change once sub-match-ups of the collection
    /// exist. Switching to a score or set value drops the collection from
    /// its group, and a group left without members is deleted.
    pub fn modify_collection_definition(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        collection_id: &str,
        changes: CollectionChanges,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        if changes.is_empty() {
            return Err(TieFormatError::MissingValue { param: "changes" }.into());
        }
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, collection_id, "modifying collection definition");
        let Some(existing) = current.tie_format.collection(collection_id) else {
            return Err(TieFormatError::CollectionNotFound {
                collection_id: collection_id.to_string(),
            }
            .into());
        };

        let count_changes = changes
            .match_up_count
            .is_some_and(|c| c != existing.match_up_count);
        let type_changes = changes
            .match_up_type
            .is_some_and(|t| t != existing.match_up_type);
        if (count_changes || type_changes)
            && !match_ups_playing(tournament, &current.scope, collection_id)?.is_empty()
        {
            return Err(TieFormatError::NotImplemented {
                feature: format!(
                    "changing matchUpCount or matchUpType of {collection_id} after sub-match-ups exist"
                ),
            }
            .into());
        }

        let record = TieFormatModification::new("modifyCollectionDefinition", &current.scope)
            .with_collection(collection_id)
            .with_detail("changes", &changes);
        let mut updated = copy_tie_format(&current.tie_format);
        let reorder = changes.collection_order.is_some();
        let mut ungrouped = None;
        if let Some(def) = updated.collection_mut(collection_id) {
            if let Some(name) = changes.collection_name {
                def.collection_name = Some(name);
            }
            if let Some(order) = changes.collection_order {
                def.collection_order = order;
            }
            if let Some(count) = changes.match_up_count {
                def.match_up_count = count;
            }
            if let Some(match_up_type) = changes.match_up_type {
                def.match_up_type = match_up_type;
            }
            if let Some(code) = changes.match_up_format {
                def.match_up_format = Some(code);
            }
            if let Some(category) = changes.category {
                def.category = Some(category);
            }
            if let Some(gender) = changes.gender {
                def.gender = Some(gender);
            }
            if let Some(value) = changes.value {
                if value.is_unpredictable() {
                    ungrouped = def.collection_group_number.take();
                }
                def.value = value;
            }
        }
        if let Some(group_number) = ungrouped {
            let still_used = updated
                .collection_definitions
                .iter()
                .any(|c| c.collection_group_number == Some(group_number));
            if !still_used {
                updated
                    .collection_groups
                    .retain(|g| g.group_number != group_number);
            }
        }
        if reorder {
            updated.renumber_orders();
        }

        self.transact(|engine| {
            let updated = engine.finish(&current, updated, options)?;
            let plan = engine.plan(
                tournament,
                &current.scope,
                &updated,
                options,
                PropagationMode::Reconcile,
            )?;
            engine.apply(tournament, plan, updated, record)
        })
    }
}
