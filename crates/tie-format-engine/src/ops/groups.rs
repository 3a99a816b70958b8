use tracing::info;

use tie_format_core::{copy_tie_format, CollectionGroup, ScopeSelector, TieFormatError, Tournament};

use crate::audit::TieFormatModification;
use crate::engine::{MutationOptions, MutationResult, TieFormatEngine};
use crate::error::Result;
use crate::propagate::PropagationMode;

impl TieFormatEngine {
    /// Group collections so they contribute a single value.
    ///
    /// The group takes the next unused group number. Collections valued by
    /// score or set, or already in a group, cannot be grouped.
    pub fn add_collection_group(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        collection_ids: &[String],
        group_value: Option<u32>,
        group_name: Option<String>,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        if collection_ids.is_empty() {
            return Err(TieFormatError::MissingValue {
                param: "collectionIds",
            }
            .into());
        }
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, ?collection_ids, "adding collection group");

        let mut updated = copy_tie_format(&current.tie_format);
        let group_number = updated.next_group_number();
        for collection_id in collection_ids {
            let def = updated.collection_mut(collection_id).ok_or_else(|| {
                TieFormatError::CollectionNotFound {
                    collection_id: collection_id.clone(),
                }
            })?;
            if let Some(existing) = def.collection_group_number {
                return Err(TieFormatError::InvalidValues {
                    reason: format!("collection {collection_id} is already in group {existing}"),
                }
                .into());
            }
            if def.value.is_unpredictable() {
                return Err(TieFormatError::InvalidValues {
                    reason: format!(
                        "collection {collection_id} uses {} and cannot be grouped",
                        def.value.key()
                    ),
                }
                .into());
            }
            def.collection_group_number = Some(group_number);
        }
        updated.collection_groups.push(CollectionGroup {
            group_number,
            group_value,
            group_name: group_name.clone(),
        });

        let record = TieFormatModification::new("addCollectionGroup", &current.scope)
            .with_detail("groupNumber", group_number)
            .with_detail("collectionIds", collection_ids)
            .with_detail("groupValue", group_value)
            .with_detail("groupName", group_name);
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

    /// Dissolve a group. Its collections keep their own values.
    pub fn remove_collection_group(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        group_number: u32,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, group_number, "removing collection group");
        if current.tie_format.group(group_number).is_none() {
            return Err(TieFormatError::CollectionGroupNotFound { group_number }.into());
        }

        let mut updated = copy_tie_format(&current.tie_format);
        updated
            .collection_groups
            .retain(|g| g.group_number != group_number);
        for c in &mut updated.collection_definitions {
            if c.collection_group_number == Some(group_number) {
                c.collection_group_number = None;
            }
        }

        let record = TieFormatModification::new("removeCollectionGroup", &current.scope)
            .with_detail("groupNumber", group_number);
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
