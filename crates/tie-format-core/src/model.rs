//! Tournament object graph: events, draws, structures, and team match-ups.
//!
//! The graph is an owned tree. A tie format may be attached at any level;
//! absence means the level inherits from the next less specific one. The
//! effective format is always computed on read, never copied speculatively.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::collection::{CollectionId, Gender, MatchUpType};
use crate::tie_format::TieFormat;

/// Status of a match-up or sub-match-up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchUpStatus {
    #[default]
    ToBePlayed,
    InProgress,
    Suspended,
    AwaitingResult,
    Completed,
    Retired,
    Walkover,
    Defaulted,
    DoubleWalkover,
    DoubleDefault,
    DeadRubber,
    Abandoned,
    Cancelled,
    Incomplete,
    NotPlayed,
    Bye,
}

impl MatchUpStatus {
    /// Statuses that end a match-up.
    pub fn is_completed(&self) -> bool {
        matches!(
            self,
            MatchUpStatus::Completed
                | MatchUpStatus::Retired
                | MatchUpStatus::Walkover
                | MatchUpStatus::Defaulted
                | MatchUpStatus::DoubleWalkover
                | MatchUpStatus::DoubleDefault
                | MatchUpStatus::DeadRubber
                | MatchUpStatus::Abandoned
                | MatchUpStatus::Cancelled
        )
    }

    /// Statuses of a match-up that has started but not finished.
    pub fn is_in_progress(&self) -> bool {
        matches!(
            self,
            MatchUpStatus::InProgress | MatchUpStatus::Suspended | MatchUpStatus::AwaitingResult
        )
    }
}

/// Score of one set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetScore {
    pub set_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side1_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side2_score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_side: Option<u8>,
}

/// Recorded score of a match-up.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_string_side1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_string_side2: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<SetScore>,
}

impl Score {
    /// Whether any score value has been entered.
    pub fn is_recorded(&self) -> bool {
        let has_string = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        !self.sets.is_empty()
            || has_string(&self.score_string_side1)
            || has_string(&self.score_string_side2)
    }
}

/// Assignment of a team member to one sub-match-up position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionAssignment {
    pub collection_id: CollectionId,
    pub collection_position: u32,
}

/// A team member and the positions they play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineUpEntry {
    pub participant_id: String,
    #[serde(default)]
    pub collection_assignments: Vec<CollectionAssignment>,
}

/// One side of a team match-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Side {
    pub side_number: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(default)]
    pub line_up: Vec<LineUpEntry>,
}

/// A generated sub-match-up belonging to one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieMatchUp {
    pub match_up_id: String,
    pub collection_id: CollectionId,
    pub collection_position: u32,
    pub match_up_type: MatchUpType,
    #[serde(default)]
    pub match_up_status: MatchUpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_side: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

impl TieMatchUp {
    /// A sub-match-up waiting to be played.
    pub fn new(
        match_up_id: impl Into<String>,
        collection_id: impl Into<String>,
        collection_position: u32,
        match_up_type: MatchUpType,
    ) -> Self {
        Self {
            match_up_id: match_up_id.into(),
            collection_id: collection_id.into(),
            collection_position,
            match_up_type,
            match_up_status: MatchUpStatus::ToBePlayed,
            winning_side: None,
            score: None,
        }
    }

    pub fn has_score(&self) -> bool {
        self.score.as_ref().is_some_and(Score::is_recorded)
    }

    /// No status, winner, or score has been recorded.
    pub fn is_not_yet_played(&self) -> bool {
        self.match_up_status == MatchUpStatus::ToBePlayed
            && self.winning_side.is_none()
            && !self.has_score()
    }

    /// Generate every sub-match-up a tie format requires, in collection order.
    pub fn generate_for(tie_format: &TieFormat, mut next_id: impl FnMut() -> String) -> Vec<Self> {
        let mut generated = Vec::new();
        for def in &tie_format.collection_definitions {
            for position in 1..=def.match_up_count {
                generated.push(TieMatchUp::new(
                    next_id(),
                    def.collection_id.clone(),
                    position,
                    def.match_up_type,
                ));
            }
        }
        generated
    }
}

/// A match-up within a structure. Team match-ups own sub-match-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUp {
    pub match_up_id: String,
    pub match_up_type: MatchUpType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_format: Option<TieFormat>,
    #[serde(default)]
    pub tie_match_ups: Vec<TieMatchUp>,
    #[serde(default)]
    pub sides: Vec<Side>,
    #[serde(default)]
    pub match_up_status: MatchUpStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_side: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Score>,
}

impl MatchUp {
    /// An empty team match-up.
    pub fn team(match_up_id: impl Into<String>) -> Self {
        Self {
            match_up_id: match_up_id.into(),
            match_up_type: MatchUpType::Team,
            tie_format: None,
            tie_match_ups: Vec::new(),
            sides: Vec::new(),
            match_up_status: MatchUpStatus::ToBePlayed,
            winning_side: None,
            score: None,
        }
    }

    pub fn is_team(&self) -> bool {
        self.match_up_type == MatchUpType::Team
    }

    /// Generated sub-match-up count per collection.
    pub fn tie_match_up_counts(&self) -> BTreeMap<CollectionId, u32> {
        let mut counts = BTreeMap::new();
        for tie in &self.tie_match_ups {
            *counts.entry(tie.collection_id.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Sub-match-ups belonging to one collection.
    pub fn collection_tie_match_ups<'a>(
        &'a self,
        collection_id: &'a str,
    ) -> impl Iterator<Item = &'a TieMatchUp> + 'a {
        self.tie_match_ups
            .iter()
            .filter(move |t| t.collection_id == collection_id)
    }
}

/// One stage of a draw, containing match-ups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Structure {
    pub structure_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_format: Option<TieFormat>,
    #[serde(default)]
    pub match_ups: Vec<MatchUp>,
}

impl Structure {
    pub fn new(structure_id: impl Into<String>) -> Self {
        Self {
            structure_id: structure_id.into(),
            structure_name: None,
            tie_format: None,
            match_ups: Vec::new(),
        }
    }

    pub fn match_up(&self, match_up_id: &str) -> Option<&MatchUp> {
        self.match_ups.iter().find(|m| m.match_up_id == match_up_id)
    }

    pub fn match_up_mut(&mut self, match_up_id: &str) -> Option<&mut MatchUp> {
        self.match_ups
            .iter_mut()
            .find(|m| m.match_up_id == match_up_id)
    }
}

/// A named, persistent value attached to a draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub value: serde_json::Value,
}

/// A draw: a set of structures sharing entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawDefinition {
    pub draw_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draw_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_format: Option<TieFormat>,
    #[serde(default)]
    pub structures: Vec<Structure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<Extension>,
}

impl DrawDefinition {
    pub fn new(draw_id: impl Into<String>) -> Self {
        Self {
            draw_id: draw_id.into(),
            draw_name: None,
            tie_format: None,
            structures: Vec::new(),
            extensions: Vec::new(),
        }
    }

    pub fn structure(&self, structure_id: &str) -> Option<&Structure> {
        self.structures
            .iter()
            .find(|s| s.structure_id == structure_id)
    }

    pub fn structure_mut(&mut self, structure_id: &str) -> Option<&mut Structure> {
        self.structures
            .iter_mut()
            .find(|s| s.structure_id == structure_id)
    }

    /// The structure containing a match-up.
    pub fn structure_of_match_up(&self, match_up_id: &str) -> Option<&Structure> {
        self.structures
            .iter()
            .find(|s| s.match_up(match_up_id).is_some())
    }

    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.name == name)
    }
}

/// An event: the least specific level a tie format attaches to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tie_format: Option<TieFormat>,
    #[serde(default)]
    pub draw_definitions: Vec<DrawDefinition>,
}

impl Event {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_name: None,
            gender: None,
            category: None,
            tie_format: None,
            draw_definitions: Vec::new(),
        }
    }

    pub fn draw(&self, draw_id: &str) -> Option<&DrawDefinition> {
        self.draw_definitions.iter().find(|d| d.draw_id == draw_id)
    }

    pub fn draw_mut(&mut self, draw_id: &str) -> Option<&mut DrawDefinition> {
        self.draw_definitions
            .iter_mut()
            .find(|d| d.draw_id == draw_id)
    }
}

/// The root of the object graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub tournament_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tournament_name: Option<String>,
    #[serde(default)]
    pub events: Vec<Event>,
}

impl Tournament {
    pub fn new(tournament_id: impl Into<String>) -> Self {
        Self {
            tournament_id: tournament_id.into(),
            tournament_name: None,
            events: Vec::new(),
        }
    }

    pub fn event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.event_id == event_id)
    }

    pub fn event_mut(&mut self, event_id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.event_id == event_id)
    }

    /// The event owning a draw.
    pub fn event_of_draw(&self, draw_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.draw(draw_id).is_some())
    }

    pub fn draw_mut(&mut self, draw_id: &str) -> Option<&mut DrawDefinition> {
        self.events.iter_mut().find_map(|e| e.draw_mut(draw_id))
    }

    pub fn structure_mut(&mut self, draw_id: &str, structure_id: &str) -> Option<&mut Structure> {
        self.draw_mut(draw_id)?.structure_mut(structure_id)
    }

    pub fn match_up_mut(
        &mut self,
        draw_id: &str,
        structure_id: &str,
        match_up_id: &str,
    ) -> Option<&mut MatchUp> {
        self.structure_mut(draw_id, structure_id)?
            .match_up_mut(match_up_id)
    }
}
