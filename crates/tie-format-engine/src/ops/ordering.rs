use std::collections::BTreeMap;

use tracing::info;

use tie_format_core::{copy_tie_format, ScopeSelector, TieFormatError, Tournament};

use crate::audit::TieFormatModification;
use crate::engine::{MutationOptions, MutationResult, TieFormatEngine};
use crate::error::Result;
use crate::propagate::PropagationMode;

impl TieFormatEngine {
    /// Apply new collection orders and re-sort the definitions.
    ///
    /// Collections missing from `orders` keep their current order. Counts
    /// are untouched, so only the format is attached.
    pub fn order_collection_definitions(
        &mut self,
        tournament: &mut Tournament,
        selector: &ScopeSelector,
        orders: &BTreeMap<String, u32>,
        options: &MutationOptions,
    ) -> Result<MutationResult> {
        if orders.is_empty() {
            return Err(TieFormatError::MissingValue { param: "orderMap" }.into());
        }
        let current = self.current(tournament, selector)?;
        info!(scope = %current.scope, "ordering collection definitions");

        let mut updated = copy_tie_format(&current.tie_format);
        for (collection_id, &order) in orders {
            let def = updated.collection_mut(collection_id).ok_or_else(|| {
                TieFormatError::CollectionNotFound {
                    collection_id: collection_id.clone(),
                }
            })?;
            def.collection_order = order;
        }
        updated.sort_by_order();

        let record = TieFormatModification::new("orderCollectionDefinitions", &current.scope)
            .with_detail("orderMap", orders);
        self.transact(|engine| {
            let updated = engine.finish(&current, updated, options)?;
            let plan = engine.plan(
                tournament,
                &current.scope,
                &updated,
                options,
                PropagationMode::AttachOnly,
            )?;
            engine.apply(tournament, plan, updated, record)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture, DRAW_ID, EVENT_ID};
    use tie_format_core::{ErrorCode, ScopeLevel};

    fn orders(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(id, o)| (id.to_string(), *o)).collect()
    }

    #[test]
    fn singles_first() {
        let mut t = fixture();
        let mut engine = TieFormatEngine::default();
        let result = engine
            .order_collection_definitions(
                &mut t,
                &ScopeSelector::draw(DRAW_ID),
                &orders(&[("singles", 1), ("doubles", 2)]),
                &MutationOptions::default(),
            )
            .unwrap();
        assert_eq!(result.outcome.added_match_ups_count, 0);

        let (_, resolved) = engine.resolve(&t, &ScopeSelector::draw(DRAW_ID)).unwrap();
        assert_eq!(resolved.source, ScopeLevel::Draw);
        let ids: Vec<&str> = resolved
            .tie_format
            .collection_definitions
            .iter()
            .map(|c| c.collection_id.as_str())
            .collect();
        assert_eq!(ids, vec!["singles", "doubles"]);
        // The event keeps its own order.
        assert_eq!(
            t.events[0].tie_format.as_ref().unwrap().collection_definitions[0].collection_id,
            "doubles"
        );
    }

    #[test]
    fn ordering_a_locked_match_up_is_refused() {
        let mut t = fixture();
        t.events[0].draw_definitions[0].structures[0].match_ups[1].winning_side = Some(1);
        let err = TieFormatEngine::default()
            .order_collection_definitions(
                &mut t,
                &ScopeSelector::match_up(DRAW_ID, "m2"),
                &orders(&[("singles", 1)]),
                &MutationOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::CannotModifyTieFormat));
    }

    #[test]
    fn bad_order_maps() {
        let mut t = fixture();
        let mut engine = TieFormatEngine::default();
        let err = engine
            .order_collection_definitions(
                &mut t,
                &ScopeSelector::event(EVENT_ID),
                &BTreeMap::new(),
                &MutationOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::MissingValue));

        let err = engine
            .order_collection_definitions(
                &mut t,
                &ScopeSelector::event(EVENT_ID),
                &orders(&[("mixed", 1)]),
                &MutationOptions::default(),
            )
            .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::NotFound));
    }
}
