//! Structural validation of tie formats and collection definitions.
//!
//! Every check runs to completion and reports all violations it finds, so a
//! caller can fix a malformed format in one pass. Typed values are checked
//! by [`validate_tie_format`]; untyped JSON input is checked field by field
//! by [`validate_tie_format_json`] before it is parsed.

use std::collections::HashSet;

use serde_json::Value;

use crate::category::{category_violations, gender_violations, Category};
use crate::collection::{CollectionDefinition, Gender, MatchUpType, ValueAssignment, ValueKey};
use crate::error::{Result, TieFormatError};
use crate::format_code::{FormatCodeValidator, StandardFormatCodes};
use crate::tie_format::{TieFormat, WinCriteria};
use crate::win_criteria::value_totals;

static STANDARD_FORMAT_CODES: StandardFormatCodes = StandardFormatCodes;

/// Inputs that shape validation beyond the tie format itself.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub format_codes: &'a dyn FormatCodeValidator,
    /// Category of the owning event, when known.
    pub reference_category: Option<&'a Category>,
    /// Gender of the owning event, when known.
    pub reference_gender: Option<Gender>,
    /// Require every collection to carry a non-empty id.
    pub check_collection_ids: bool,
}

impl Default for ValidationContext<'static> {
    fn default() -> Self {
        Self::new(&STANDARD_FORMAT_CODES)
    }
}

impl<'a> ValidationContext<'a> {
    pub fn new(format_codes: &'a dyn FormatCodeValidator) -> Self {
        Self {
            format_codes,
            reference_category: None,
            reference_gender: None,
            check_collection_ids: true,
        }
    }

    pub fn with_reference_category(mut self, category: Option<&'a Category>) -> Self {
        self.reference_category = category;
        self
    }

    pub fn with_reference_gender(mut self, gender: Option<Gender>) -> Self {
        self.reference_gender = gender;
        self
    }

    pub fn with_collection_ids(mut self, check: bool) -> Self {
        self.check_collection_ids = check;
        self
    }
}

/// Every violation in a single collection definition.
pub fn collection_definition_violations(
    def: &CollectionDefinition,
    ctx: &ValidationContext<'_>,
) -> Vec<String> {
    let mut errors = Vec::new();

    if ctx.check_collection_ids && def.collection_id.trim().is_empty() {
        errors.push("collectionId must be a non-empty string".to_string());
    }
    if def.match_up_count == 0 {
        errors.push("matchUpCount must be at least 1".to_string());
    }
    if def.match_up_type == MatchUpType::Team {
        errors.push("matchUpType must be SINGLES or DOUBLES".to_string());
    }

    if let ValueAssignment::CollectionValueProfiles(profiles) = &def.value {
        let mut seen = HashSet::new();
        for profile in profiles {
            let position = profile.collection_position;
            if position == 0 || position > def.match_up_count {
                errors.push(format!(
                    "collectionPosition {position} is outside 1..={}",
                    def.match_up_count
                ));
            }
            if !seen.insert(position) {
                errors.push(format!("collectionPosition {position} is repeated"));
            }
        }
    }

    if let Some(code) = &def.match_up_format {
        if !ctx.format_codes.is_valid_format_code(code) {
            errors.push(format!("matchUpFormat {code} is not a valid format code"));
        }
    }

    if let (Some(reference), Some(category)) = (ctx.reference_category, &def.category) {
        errors.extend(category_violations(reference, category));
    }
    errors.extend(gender_violations(
        ctx.reference_gender,
        def.gender,
        def.match_up_type,
    ));

    errors
}

/// Validate one collection definition.
pub fn validate_collection_definition(
    def: &CollectionDefinition,
    ctx: &ValidationContext<'_>,
) -> Result<()> {
    let errors = collection_definition_violations(def, ctx);
    if errors.is_empty() {
        return Ok(());
    }
    Err(TieFormatError::InvalidCollectionDefinition {
        collection_id: Some(def.collection_id.clone()).filter(|id| !id.is_empty()),
        errors,
    })
}

/// Every violation in a tie format, including those of its collections.
pub fn tie_format_violations(tie_format: &TieFormat, ctx: &ValidationContext<'_>) -> Vec<String> {
    let mut errors = Vec::new();
    let defs = &tie_format.collection_definitions;

    if defs.is_empty() {
        errors.push("collectionDefinitions must not be empty".to_string());
    }

    let mut ids = HashSet::new();
    for def in defs {
        if !def.collection_id.is_empty() && !ids.insert(def.collection_id.as_str()) {
            errors.push(format!("collectionId {} is not unique", def.collection_id));
        }
    }

    let mut group_numbers = HashSet::new();
    for group in &tie_format.collection_groups {
        if !group_numbers.insert(group.group_number) {
            errors.push(format!("groupNumber {} is not unique", group.group_number));
        }
    }
    for def in defs {
        let Some(number) = def.collection_group_number else {
            continue;
        };
        if !group_numbers.contains(&number) {
            errors.push(format!(
                "collection {} references missing group {number}",
                def.collection_id
            ));
        } else if def.value.is_unpredictable() {
            errors.push(format!(
                "grouped collection {} cannot use {}",
                def.collection_id,
                def.value.key()
            ));
        }
    }

    let totals = value_totals(defs, &tie_format.collection_groups);
    if let WinCriteria::ValueGoal(goal) = tie_format.win_criteria {
        if totals.aggregate_value_imperative {
            errors.push(format!(
                "valueGoal {goal} cannot be used with scoreValue or setValue collections"
            ));
        } else if goal > totals.total_value {
            errors.push(format!(
                "valueGoal {goal} exceeds the total available value {}",
                totals.total_value
            ));
        }
    }

    for def in defs {
        for error in collection_definition_violations(def, ctx) {
            if def.collection_id.is_empty() {
                errors.push(error);
            } else {
                errors.push(format!("{}: {error}", def.collection_id));
            }
        }
    }

    errors
}

/// Validate a tie format.
pub fn validate_tie_format(tie_format: &TieFormat, ctx: &ValidationContext<'_>) -> Result<()> {
    let errors = tie_format_violations(tie_format, ctx);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TieFormatError::InvalidTieFormat { errors })
    }
}

/// Field-level violations of an untyped collection definition.
pub fn collection_definition_json_violations(
    value: &Value,
    ctx: &ValidationContext<'_>,
) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(obj) = value.as_object() else {
        errors.push("collection definition must be an object".to_string());
        return errors;
    };

    match obj.get("collectionId") {
        Some(Value::String(_)) => {}
        None if !ctx.check_collection_ids => {}
        _ => errors.push("collectionId must be a string".to_string()),
    }

    match obj.get("matchUpCount") {
        Some(v) if v.as_u64().is_some() => {}
        None => errors.push("matchUpCount is required".to_string()),
        Some(_) => errors.push("matchUpCount must be a non-negative integer".to_string()),
    }

    match obj.get("matchUpType").and_then(Value::as_str) {
        Some("SINGLES" | "DOUBLES") => {}
        _ => errors.push("matchUpType must be SINGLES or DOUBLES".to_string()),
    }

    let present: Vec<ValueKey> = ValueKey::ALL
        .into_iter()
        .filter(|key| obj.get(key.as_str()).is_some_and(|v| !v.is_null()))
        .collect();
    match present.as_slice() {
        [] => errors.push("a value assignment is required".to_string()),
        [ValueKey::CollectionValueProfiles] => {
            errors.extend(profile_json_violations(&obj["collectionValueProfiles"]));
        }
        [key] => {
            if obj[key.as_str()].as_u64().is_none() {
                errors.push(format!("{key} must be a non-negative integer"));
            }
        }
        keys => {
            let names: Vec<&str> = keys.iter().map(ValueKey::as_str).collect();
            errors.push(format!(
                "only one value assignment is allowed, found {}",
                names.join(", ")
            ));
        }
    }

    if let Some(format) = obj.get("matchUpFormat") {
        if !format.is_string() {
            errors.push("matchUpFormat must be a string".to_string());
        }
    }

    errors
}

fn profile_json_violations(profiles: &Value) -> Vec<String> {
    let Some(profiles) = profiles.as_array() else {
        return vec!["collectionValueProfiles must be an array".to_string()];
    };
    let mut errors = Vec::new();
    for (i, profile) in profiles.iter().enumerate() {
        let position = profile.get("collectionPosition").and_then(Value::as_u64);
        let value = profile
            .get("value")
            .or_else(|| profile.get("matchUpValue"))
            .and_then(Value::as_u64);
        if position.is_none() {
            errors.push(format!("profile {i} needs an integer collectionPosition"));
        }
        if value.is_none() {
            errors.push(format!("profile {i} needs an integer value"));
        }
    }
    errors
}

/// Validate and parse an untyped collection definition.
pub fn validate_collection_definition_json(
    value: &Value,
    ctx: &ValidationContext<'_>,
) -> Result<CollectionDefinition> {
    let errors = collection_definition_json_violations(value, ctx);
    let collection_id = value
        .get("collectionId")
        .and_then(Value::as_str)
        .map(str::to_string);
    if !errors.is_empty() {
        return Err(TieFormatError::InvalidCollectionDefinition {
            collection_id,
            errors,
        });
    }
    let def: CollectionDefinition = serde_json::from_value(value.clone()).map_err(|e| {
        TieFormatError::InvalidCollectionDefinition {
            collection_id: collection_id.clone(),
            errors: vec![e.to_string()],
        }
    })?;
    validate_collection_definition(&def, ctx)?;
    Ok(def)
}

/// Validate and parse an untyped tie format.
pub fn validate_tie_format_json(value: &Value, ctx: &ValidationContext<'_>) -> Result<TieFormat> {
    let mut errors = Vec::new();
    let Some(obj) = value.as_object() else {
        return Err(TieFormatError::InvalidTieFormat {
            errors: vec!["tie format must be an object".to_string()],
        });
    };

    match obj.get("collectionDefinitions").and_then(Value::as_array) {
        Some(defs) if !defs.is_empty() => {
            for (i, def) in defs.iter().enumerate() {
                let label = def
                    .get("collectionId")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("collection {i}"));
                for error in collection_definition_json_violations(def, ctx) {
                    errors.push(format!("{label}: {error}"));
                }
            }
        }
        Some(_) => errors.push("collectionDefinitions must not be empty".to_string()),
        None => errors.push("collectionDefinitions must be an array".to_string()),
    }

    match obj.get("winCriteria") {
        Some(criteria) => {
            if let Err(e) = serde_json::from_value::<WinCriteria>(criteria.clone()) {
                errors.push(format!("winCriteria: {e}"));
            }
        }
        None => errors.push("winCriteria is required".to_string()),
    }

    if !errors.is_empty() {
        return Err(TieFormatError::InvalidTieFormat { errors });
    }

    let tie_format: TieFormat =
        serde_json::from_value(value.clone()).map_err(|e| TieFormatError::InvalidTieFormat {
            errors: vec![e.to_string()],
        })?;
    validate_tie_format(&tie_format, ctx)?;
    Ok(tie_format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionGroup, ValueProfile};
    use serde_json::json;

    fn college() -> TieFormat {
        TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Doubles, 3, ValueAssignment::MatchUpValue(1))
                    .with_id("doubles")
                    .with_format("SET3-S:6/TB7"),
                CollectionDefinition::new(MatchUpType::Singles, 6, ValueAssignment::MatchUpValue(1))
                    .with_id("singles"),
            ],
            vec![],
        )
    }

    #[test]
    fn valid_format_passes() {
        assert!(validate_tie_format(&college(), &ValidationContext::default()).is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let mut tf = college();
        tf.collection_definitions[1].collection_id = "doubles".into();
        tf.collection_definitions[1].match_up_count = 0;
        tf.collection_definitions[0].match_up_format = Some("SET3-6".into());

        let err = validate_tie_format(&tf, &ValidationContext::default()).unwrap_err();
        let violations = err.violations();
        assert!(violations.iter().any(|v| v.contains("not unique")));
        assert!(violations.iter().any(|v| v.contains("matchUpCount")));
        assert!(violations.iter().any(|v| v.contains("matchUpFormat")));
    }

    #[test]
    fn empty_definitions_rejected() {
        let tf = TieFormat::new(vec![], vec![]);
        let err = validate_tie_format(&tf, &ValidationContext::default()).unwrap_err();
        assert_eq!(err.violations(), ["collectionDefinitions must not be empty"]);
    }

    #[test]
    fn value_goal_with_set_value_rejected() {
        let mut tf = college();
        tf.collection_definitions[0].value = ValueAssignment::SetValue(1);
        tf.win_criteria = WinCriteria::ValueGoal(4);
        assert!(validate_tie_format(&tf, &ValidationContext::default()).is_err());

        tf.recalculate_win_criteria();
        assert!(tf.win_criteria.is_aggregate());
        assert!(validate_tie_format(&tf, &ValidationContext::default()).is_ok());
    }

    #[test]
    fn unreachable_goal_rejected() {
        let mut tf = college();
        tf.win_criteria = WinCriteria::ValueGoal(10);
        assert!(validate_tie_format(&tf, &ValidationContext::default()).is_err());
    }

    #[test]
    fn profile_positions_checked() {
        let def = CollectionDefinition::new(
            MatchUpType::Singles,
            2,
            ValueAssignment::CollectionValueProfiles(vec![
                ValueProfile {
                    collection_position: 1,
                    value: 1,
                },
                ValueProfile {
                    collection_position: 1,
                    value: 2,
                },
                ValueProfile {
                    collection_position: 3,
                    value: 2,
                },
            ]),
        )
        .with_id("singles");
        let errors = collection_definition_violations(&def, &ValidationContext::default());
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn grouped_collections_need_existing_group() {
        let mut tf = college();
        tf.collection_definitions[0].collection_group_number = Some(1);
        assert!(validate_tie_format(&tf, &ValidationContext::default()).is_err());

        tf.collection_groups.push(CollectionGroup {
            group_number: 1,
            group_value: Some(1),
            group_name: None,
        });
        tf.recalculate_win_criteria();
        assert!(validate_tie_format(&tf, &ValidationContext::default()).is_ok());
    }

    #[test]
    fn reference_gender_applies() {
        let tf = college();
        let ctx = ValidationContext::default().with_reference_gender(Some(Gender::Female));
        assert!(validate_tie_format(&tf, &ctx).is_ok());

        let mut tf = tf;
        tf.collection_definitions[1].gender = Some(Gender::Male);
        let err = validate_tie_format(&tf, &ctx).unwrap_err();
        assert_eq!(err.violations().len(), 1);
    }

    #[test]
    fn reference_category_applies() {
        let mut tf = college();
        tf.collection_definitions[1].category = Some(Category::age("U18"));
        let event_category = Category::age("U16");
        let ctx = ValidationContext::default().with_reference_category(Some(&event_category));
        assert!(validate_tie_format(&tf, &ctx).is_err());
    }

    #[test]
    fn json_missing_match_up_count() {
        let value = json!({ "collectionId": "singles", "matchUpType": "SINGLES", "matchUpValue": 1 });
        let errors = collection_definition_json_violations(&value, &ValidationContext::default());
        assert_eq!(errors, ["matchUpCount is required"]);
    }

    #[test]
    fn json_exactly_one_value() {
        let value = json!({
            "collectionId": "singles",
            "matchUpType": "SINGLES",
            "matchUpCount": 3,
            "matchUpValue": 1,
            "collectionValue": 1
        });
        let errors = collection_definition_json_violations(&value, &ValidationContext::default());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("only one value assignment"));

        let none = json!({ "collectionId": "s", "matchUpType": "SINGLES", "matchUpCount": 3 });
        assert_eq!(
            collection_definition_json_violations(&none, &ValidationContext::default()),
            ["a value assignment is required"]
        );
    }

    #[test]
    fn json_collects_across_collections() {
        let value = json!({
            "winCriteria": { "valueGoal": 3 },
            "collectionDefinitions": [
                { "collectionId": 7, "matchUpType": "TEAM", "matchUpCount": 2, "matchUpValue": 1 },
                { "collectionId": "singles", "matchUpType": "SINGLES", "matchUpValue": "one" }
            ]
        });
        let err = validate_tie_format_json(&value, &ValidationContext::default()).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidTieFormat);
        assert_eq!(err.violations().len(), 4);
    }

    #[test]
    fn json_parses_valid_format() {
        let value = json!({
            "tieFormatName": "COLLEGE_D3",
            "winCriteria": { "valueGoal": 5 },
            "collectionDefinitions": [
                { "collectionId": "doubles", "matchUpType": "DOUBLES", "matchUpCount": 3, "matchUpValue": 1 },
                { "collectionId": "singles", "matchUpType": "SINGLES", "matchUpCount": 6, "matchUpValue": 1 }
            ]
        });
        let tf = validate_tie_format_json(&value, &ValidationContext::default()).unwrap();
        assert_eq!(tf.win_criteria, WinCriteria::ValueGoal(5));
        assert_eq!(tf.total_match_up_count(), 9);
    }
}
