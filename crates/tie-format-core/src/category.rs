//! Category and gender eligibility rules between an event and its collections.

use serde::{Deserialize, Serialize};

use crate::collection::{Gender, MatchUpType};

/// Age and rating eligibility of an event or collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_category_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_min: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_max: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_max: Option<f64>,
}

impl Category {
    /// Category identified only by an age category code such as `U18` or `35O`.
    pub fn age(code: impl Into<String>) -> Self {
        Self {
            age_category_code: Some(code.into()),
            ..Default::default()
        }
    }

    /// Inclusive age bounds, preferring explicit bounds over the code.
    pub fn age_range(&self) -> (Option<u32>, Option<u32>) {
        let (code_min, code_max) = self
            .age_category_code
            .as_deref()
            .map(parse_age_code)
            .unwrap_or((None, None));
        (self.age_min.or(code_min), self.age_max.or(code_max))
    }
}

/// Derive age bounds from codes like `U18`, `18U`, `O35`, `35O`, or `10-14`.
fn parse_age_code(code: &str) -> (Option<u32>, Option<u32>) {
    let code = code.trim().to_ascii_uppercase();
    if let Some((lo, hi)) = code.split_once('-') {
        let lo = lo.trim_start_matches('C').parse().ok();
        let hi = hi.parse().ok();
        return (lo, hi);
    }
    if let Some(n) = code
        .strip_prefix('U')
        .or_else(|| code.strip_suffix('U'))
        .and_then(|n| n.parse::<u32>().ok())
    {
        return (None, n.checked_sub(1));
    }
    if let Some(n) = code
        .strip_prefix('O')
        .or_else(|| code.strip_suffix('O'))
        .and_then(|n| n.parse::<u32>().ok())
    {
        return (Some(n), None);
    }
    (None, None)
}

/// Violations of `child` lying outside the eligibility range of `parent`.
pub fn category_violations(parent: &Category, child: &Category) -> Vec<String> {
    let mut errors = Vec::new();

    let (parent_min, parent_max) = parent.age_range();
    let (child_min, child_max) = child.age_range();
    if let Some(pmin) = parent_min {
        match child_min {
            Some(cmin) if cmin >= pmin => {}
            _ => errors.push(format!(
                "category admits ages below the reference minimum of {pmin}"
            )),
        }
    }
    if let Some(pmax) = parent_max {
        match child_max {
            Some(cmax) if cmax <= pmax => {}
            _ => errors.push(format!(
                "category admits ages above the reference maximum of {pmax}"
            )),
        }
    }

    if let (Some(parent_type), Some(child_type)) = (&parent.rating_type, &child.rating_type) {
        if parent_type != child_type {
            errors.push(format!(
                "rating type {child_type} does not match reference rating type {parent_type}"
            ));
        } else {
            if let (Some(pmin), Some(cmin)) = (parent.rating_min, child.rating_min) {
                if cmin < pmin {
                    errors.push(format!("rating minimum {cmin} is below reference {pmin}"));
                }
            }
            if let (Some(pmax), Some(cmax)) = (parent.rating_max, child.rating_max) {
                if cmax > pmax {
                    errors.push(format!("rating maximum {cmax} is above reference {pmax}"));
                }
            }
        }
    }

    errors
}

/// Violations of a collection's gender against its type and the reference gender.
pub fn gender_violations(
    reference: Option<Gender>,
    gender: Option<Gender>,
    match_up_type: MatchUpType,
) -> Vec<String> {
    let mut errors = Vec::new();
    let Some(gender) = gender else {
        return errors;
    };

    // MIXED means one male and one female player on each side.
    if gender == Gender::Mixed && match_up_type != MatchUpType::Doubles {
        errors.push(format!("{gender} gender requires DOUBLES, found {match_up_type}"));
    }

    match reference {
        Some(reference @ (Gender::Male | Gender::Female)) => {
            if gender != reference && gender != Gender::Any {
                errors.push(format!(
                    "collection gender {gender} contradicts event gender {reference}"
                ));
            }
        }
        Some(Gender::Mixed) | Some(Gender::Any) | None => {}
    }

    errors
}
