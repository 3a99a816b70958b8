//! Notifications produced by propagation.
//!
//! Notifications are derived from a plan, batched per draw, and returned to
//! the caller. A [`NotificationSink`] can be driven with [`publish`].

use std::collections::BTreeMap;

use serde::Serialize;
use tie_format_core::TieMatchUp;

use crate::propagate::{Effect, PropagationPlan};

/// Where a notification applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationScope {
    pub tournament_id: String,
    pub event_id: String,
    pub draw_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Notification {
    MatchUpsAdded {
        scope: NotificationScope,
        match_ups: Vec<TieMatchUp>,
    },
    MatchUpsDeleted {
        scope: NotificationScope,
        match_up_ids: Vec<String>,
    },
    MatchUpModified {
        scope: NotificationScope,
        match_up_id: String,
    },
    DrawModified {
        scope: NotificationScope,
        structure_ids: Vec<String>,
    },
}

/// Receiver of the four notification kinds.
pub trait NotificationSink {
    fn match_ups_added(&mut self, scope: &NotificationScope, match_ups: &[TieMatchUp]);
    fn match_ups_deleted(&mut self, scope: &NotificationScope, match_up_ids: &[String]);
    fn match_up_modified(&mut self, scope: &NotificationScope, match_up_id: &str);
    fn draw_modified(&mut self, scope: &NotificationScope, structure_ids: &[String]);
}

/// Deliver notifications in order.
pub fn publish(notifications: &[Notification], sink: &mut dyn NotificationSink) {
    for notification in notifications {
        match notification {
            Notification::MatchUpsAdded { scope, match_ups } => sink.match_ups_added(scope, match_ups),
            Notification::MatchUpsDeleted {
                scope,
                match_up_ids,
            } => sink.match_ups_deleted(scope, match_up_ids),
            Notification::MatchUpModified { scope, match_up_id } => {
                sink.match_up_modified(scope, match_up_id)
            }
            Notification::DrawModified {
                scope,
                structure_ids,
            } => sink.draw_modified(scope, structure_ids),
        }
    }
}

#[derive(Default)]
struct DrawBatch {
    event_id: String,
    added: Vec<TieMatchUp>,
    deleted: Vec<String>,
}

/// Notifications describing a plan, one batch per affected draw.
pub fn notifications_for(tournament_id: &str, plan: &PropagationPlan) -> Vec<Notification> {
    let mut batches: BTreeMap<&str, DrawBatch> = BTreeMap::new();
    for (draw_id, event_id) in &plan.modified_draws {
        batches.entry(draw_id.as_str()).or_default().event_id = event_id.clone();
    }
    for effect in &plan.effects {
        match effect {
            Effect::AddTieMatchUps {
                location,
                tie_match_ups,
            } => {
                let batch = batches.entry(location.draw_id.as_str()).or_default();
                batch.event_id = location.event_id.clone();
                batch.added.extend(tie_match_ups.iter().cloned());
            }
            Effect::RemoveTieMatchUps {
                location,
                match_up_ids,
                ..
            } => {
                let batch = batches.entry(location.draw_id.as_str()).or_default();
                batch.event_id = location.event_id.clone();
                batch.deleted.extend(match_up_ids.iter().cloned());
            }
            _ => {}
        }
    }

    let scope_of = |draw_id: &str, event_id: &str| NotificationScope {
        tournament_id: tournament_id.to_string(),
        event_id: event_id.to_string(),
        draw_id: draw_id.to_string(),
    };

    let mut notifications = Vec::new();
    for (draw_id, batch) in batches {
        let scope = scope_of(draw_id, &batch.event_id);
        if !batch.added.is_empty() {
            notifications.push(Notification::MatchUpsAdded {
                scope: scope.clone(),
                match_ups: batch.added,
            });
        }
        if !batch.deleted.is_empty() {
            notifications.push(Notification::MatchUpsDeleted {
                scope: scope.clone(),
                match_up_ids: batch.deleted,
            });
        }
        for location in plan.modified_match_ups.iter().filter(|l| l.draw_id == draw_id) {
            notifications.push(Notification::MatchUpModified {
                scope: scope.clone(),
                match_up_id: location.match_up_id.clone(),
            });
        }
        let structure_ids = plan
            .modified_structures
            .iter()
            .filter(|(d, _)| d == draw_id)
            .map(|(_, s)| s.clone())
            .collect();
        notifications.push(Notification::DrawModified {
            scope,
            structure_ids,
        });
    }
    notifications
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::IdGenerator;
    use crate::propagate::{plan_propagation, PropagationOptions};
    use crate::testing::{fixture, tie_format_with_singles, EVENT_ID, TOURNAMENT_ID};
    use tie_format_core::Scope;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl NotificationSink for Recorder {
        fn match_ups_added(&mut self, scope: &NotificationScope, match_ups: &[TieMatchUp]) {
            self.calls.push(format!("added {} {}", scope.draw_id, match_ups.len()));
        }
        fn match_ups_deleted(&mut self, scope: &NotificationScope, match_up_ids: &[String]) {
            self.calls.push(format!("deleted {} {}", scope.draw_id, match_up_ids.len()));
        }
        fn match_up_modified(&mut self, _scope: &NotificationScope, match_up_id: &str) {
            self.calls.push(format!("modified {match_up_id}"));
        }
        fn draw_modified(&mut self, scope: &NotificationScope, structure_ids: &[String]) {
            self.calls.push(format!("draw {} {}", scope.draw_id, structure_ids.join(",")));
        }
    }

    #[test]
    fn batched_per_draw() {
        let t = fixture();
        let scope = Scope::Event {
            event_id: EVENT_ID.into(),
        };
        let plan = plan_propagation(
            &t,
            &scope,
            &tie_format_with_singles(4),
            PropagationOptions::default(),
            &mut IdGenerator::default(),
        )
        .unwrap();
        let notifications = notifications_for(TOURNAMENT_ID, &plan);

        let mut recorder = Recorder::default();
        publish(&notifications, &mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                "added d1 4",
                "modified m1",
                "modified m2",
                "modified m3",
                "modified m4",
                "draw d1 s1",
            ]
        );
    }

    #[test]
    fn notification_json_shape() {
        let n = Notification::MatchUpModified {
            scope: NotificationScope {
                tournament_id: "t".into(),
                event_id: "e".into(),
                draw_id: "d".into(),
            },
            match_up_id: "m1".into(),
        };
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["kind"], "matchUpModified");
        assert_eq!(json["scope"]["drawId"], "d");
    }
}
