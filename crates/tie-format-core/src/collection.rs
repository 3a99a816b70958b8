//! Collection definitions: homogeneous blocks of sub-match-ups within a tie.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Identifier of a collection, unique within its tie format.
pub type CollectionId = String;

/// The kind of a match-up.
///
/// Collections only contain `Singles` or `Doubles`; `Team` marks the parent
/// match-up that owns the generated sub-match-ups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchUpType {
    Singles,
    Doubles,
    Team,
}

impl fmt::Display for MatchUpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchUpType::Singles => write!(f, "SINGLES"),
            MatchUpType::Doubles => write!(f, "DOUBLES"),
            MatchUpType::Team => write!(f, "TEAM"),
        }
    }
}

/// Declared gender of an event or collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Mixed,
    Any,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "MALE"),
            Gender::Female => write!(f, "FEMALE"),
            Gender::Mixed => write!(f, "MIXED"),
            Gender::Any => write!(f, "ANY"),
        }
    }
}

/// Value awarded for winning the sub-match-up at one collection position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueProfile {
    pub collection_position: u32,
    #[serde(alias = "matchUpValue")]
    pub value: u32,
}

/// How winning within a collection contributes toward the tie.
///
/// Exactly one assignment applies to a collection; the JSON form is a single
/// field (`collectionValue`, `matchUpValue`, `scoreValue`, `setValue`, or
/// `collectionValueProfiles`) flattened into the definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawValueAssignment", into = "RawValueAssignment")]
pub enum ValueAssignment {
    /// Value awarded to the side that wins the majority of the collection.
    CollectionValue(u32),
    /// Value awarded for each sub-match-up won.
    MatchUpValue(u32),
    /// Value awarded for each game won.
    ScoreValue(u32),
    /// Value awarded for each set won.
    SetValue(u32),
    /// Distinct value per collection position.
    CollectionValueProfiles(Vec<ValueProfile>),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValueAssignment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    match_up_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    set_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    collection_value_profiles: Option<Vec<ValueProfile>>,
}

impl TryFrom<RawValueAssignment> for ValueAssignment {
    type Error = String;

    fn try_from(raw: RawValueAssignment) -> Result<Self, Self::Error> {
        let mut found = Vec::new();
        if let Some(v) = raw.collection_value {
            found.push(ValueAssignment::CollectionValue(v));
        }
        if let Some(v) = raw.match_up_value {
            found.push(ValueAssignment::MatchUpValue(v));
        }
        if let Some(v) = raw.score_value {
            found.push(ValueAssignment::ScoreValue(v));
        }
        if let Some(v) = raw.set_value {
            found.push(ValueAssignment::SetValue(v));
        }
        if let Some(profiles) = raw.collection_value_profiles {
            found.push(ValueAssignment::CollectionValueProfiles(profiles));
        }

        match found.len() {
            0 => Err("collection requires one of collectionValue, matchUpValue, scoreValue, setValue or collectionValueProfiles".into()),
            1 => Ok(found.remove(0)),
            _ => {
                let keys: Vec<String> = found.iter().map(|v| v.key().to_string()).collect();
                Err(format!("collection declares more than one value: {}", keys.join(", ")))
            }
        }
    }
}

impl From<ValueAssignment> for RawValueAssignment {
    fn from(value: ValueAssignment) -> Self {
        let mut raw = RawValueAssignment::default();
        match value {
            ValueAssignment::CollectionValue(v) => raw.collection_value = Some(v),
            ValueAssignment::MatchUpValue(v) => raw.match_up_value = Some(v),
            ValueAssignment::ScoreValue(v) => raw.score_value = Some(v),
            ValueAssignment::SetValue(v) => raw.set_value = Some(v),
            ValueAssignment::CollectionValueProfiles(profiles) => {
                raw.collection_value_profiles = Some(profiles)
            }
        }
        raw
    }
}

/// Field name of a value assignment, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueKey {
    CollectionValue,
    MatchUpValue,
    ScoreValue,
    SetValue,
    CollectionValueProfiles,
}

impl ValueKey {
    pub const ALL: [ValueKey; 5] = [
        ValueKey::CollectionValue,
        ValueKey::MatchUpValue,
        ValueKey::ScoreValue,
        ValueKey::SetValue,
        ValueKey::CollectionValueProfiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKey::CollectionValue => "collectionValue",
            ValueKey::MatchUpValue => "matchUpValue",
            ValueKey::ScoreValue => "scoreValue",
            ValueKey::SetValue => "setValue",
            ValueKey::CollectionValueProfiles => "collectionValueProfiles",
        }
    }
}

impl fmt::Display for ValueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ValueAssignment {
    pub fn key(&self) -> ValueKey {
        match self {
            ValueAssignment::CollectionValue(_) => ValueKey::CollectionValue,
            ValueAssignment::MatchUpValue(_) => ValueKey::MatchUpValue,
            ValueAssignment::ScoreValue(_) => ValueKey::ScoreValue,
            ValueAssignment::SetValue(_) => ValueKey::SetValue,
            ValueAssignment::CollectionValueProfiles(_) => ValueKey::CollectionValueProfiles,
        }
    }

    /// Score and set values depend on how sub-match-ups are played out, so
    /// they cannot contribute to a fixed value goal.
    pub fn is_unpredictable(&self) -> bool {
        matches!(
            self,
            ValueAssignment::ScoreValue(_) | ValueAssignment::SetValue(_)
        )
    }

    /// Value awarded at one position, for position-based assignments.
    pub fn position_value(&self, collection_position: u32) -> Option<u32> {
        match self {
            ValueAssignment::MatchUpValue(v) => Some(*v),
            ValueAssignment::CollectionValueProfiles(profiles) => profiles
                .iter()
                .find(|p| p.collection_position == collection_position)
                .map(|p| p.value),
            _ => None,
        }
    }
}

/// One homogeneous block of sub-match-ups within a tie format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    /// Unique within the owning tie format. Empty until one is assigned.
    #[serde(default)]
    pub collection_id: CollectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Display order; `0` means "not yet ordered".
    #[serde(default)]
    pub collection_order: u32,
    pub match_up_type: MatchUpType,
    pub match_up_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_up_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_group_number: Option<u32>,
    #[serde(flatten)]
    pub value: ValueAssignment,
}

impl CollectionDefinition {
    /// Create a collection without an id.
    pub fn new(match_up_type: MatchUpType, match_up_count: u32, value: ValueAssignment) -> Self {
        Self {
            collection_id: String::new(),
            collection_name: None,
            collection_order: 0,
            match_up_type,
            match_up_count,
            match_up_format: None,
            category: None,
            gender: None,
            collection_group_number: None,
            value,
        }
    }

    /// Builder: set collection id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.collection_id = id.into();
        self
    }

    /// Builder: set collection name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Builder: set collection order.
    pub fn with_order(mut self, order: u32) -> Self {
        self.collection_order = order;
        self
    }

    /// Builder: set the match-up format code.
    pub fn with_format(mut self, code: impl Into<String>) -> Self {
        self.match_up_format = Some(code.into());
        self
    }

    /// Builder: set gender.
    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    /// Builder: set category.
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Builder: place the collection in a group.
    pub fn in_group(mut self, group_number: u32) -> Self {
        self.collection_group_number = Some(group_number);
        self
    }
}

/// A set of collections whose combined result counts as one value unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionGroup {
    pub group_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_value: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}
