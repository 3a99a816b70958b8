//! Named tie-format templates.

use std::fmt;

use crate::collection::{CollectionDefinition, Gender, MatchUpType, ValueAssignment, ValueProfile};
use crate::tie_format::TieFormat;

/// Known tie compositions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TieFormatTemplate {
    CollegeDefault,
    CollegeD3,
    DominantDuo,
    TeamDoubles,
    LaverCup,
    WorldTeamTennis,
}

impl TieFormatTemplate {
    pub const ALL: [TieFormatTemplate; 6] = [
        TieFormatTemplate::CollegeDefault,
        TieFormatTemplate::CollegeD3,
        TieFormatTemplate::DominantDuo,
        TieFormatTemplate::TeamDoubles,
        TieFormatTemplate::LaverCup,
        TieFormatTemplate::WorldTeamTennis,
    ];

    /// The template name, also used as `tieFormatName`.
    pub fn name(&self) -> &'static str {
        match self {
            TieFormatTemplate::CollegeDefault => "COLLEGE_DEFAULT",
            TieFormatTemplate::CollegeD3 => "COLLEGE_D3",
            TieFormatTemplate::DominantDuo => "DOMINANT_DUO",
            TieFormatTemplate::TeamDoubles => "TEAM_DOUBLES",
            TieFormatTemplate::LaverCup => "LAVER_CUP",
            TieFormatTemplate::WorldTeamTennis => "WORLD_TEAM_TENNIS",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for TieFormatTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn profiles(values: &[u32]) -> ValueAssignment {
    ValueAssignment::CollectionValueProfiles(
        values
            .iter()
            .zip(1..)
            .map(|(&value, collection_position)| ValueProfile {
                collection_position,
                value,
            })
            .collect(),
    )
}

impl TieFormat {
    /// Build a named template, taking collection ids from `next_id`.
    pub fn from_template(
        template: TieFormatTemplate,
        next_id: &mut impl FnMut() -> String,
    ) -> TieFormat {
        use MatchUpType::{Doubles, Singles};

        let defs: Vec<CollectionDefinition> = match template {
            TieFormatTemplate::CollegeDefault => vec![
                CollectionDefinition::new(Doubles, 3, ValueAssignment::CollectionValue(1))
                    .with_name("Doubles")
                    .with_format("SET1-S:8/TB7@7"),
                CollectionDefinition::new(Singles, 6, ValueAssignment::MatchUpValue(1))
                    .with_name("Singles")
                    .with_format("SET3-S:6/TB7"),
            ],
            TieFormatTemplate::CollegeD3 => vec![
                CollectionDefinition::new(Doubles, 3, ValueAssignment::MatchUpValue(1))
                    .with_name("Doubles")
                    .with_format("SET1-S:8/TB7@7"),
                CollectionDefinition::new(Singles, 6, ValueAssignment::MatchUpValue(1))
                    .with_name("Singles")
                    .with_format("SET3-S:6/TB7"),
            ],
            TieFormatTemplate::DominantDuo => vec![
                CollectionDefinition::new(Singles, 2, ValueAssignment::MatchUpValue(1))
                    .with_name("Singles")
                    .with_format("SET3-S:6/TB7"),
                CollectionDefinition::new(Doubles, 1, ValueAssignment::MatchUpValue(1))
                    .with_name("Doubles")
                    .with_format("SET3-S:6/TB7-F:TB10"),
            ],
            TieFormatTemplate::TeamDoubles => vec![CollectionDefinition::new(
                Doubles,
                3,
                ValueAssignment::MatchUpValue(1),
            )
            .with_name("Doubles")
            .with_format("SET3-S:6/TB7-F:TB10")],
            TieFormatTemplate::LaverCup => vec![
                CollectionDefinition::new(Singles, 9, profiles(&[1, 1, 1, 2, 2, 2, 3, 3, 3]))
                    .with_name("Singles")
                    .with_format("SET3-S:6/TB7-F:TB10"),
                CollectionDefinition::new(Doubles, 3, profiles(&[1, 2, 3]))
                    .with_name("Doubles")
                    .with_format("SET3-S:6/TB7-F:TB10"),
            ],
            TieFormatTemplate::WorldTeamTennis => {
                let set = "SET1-S:5NOAD/TB9@4";
                vec![
                    CollectionDefinition::new(Singles, 1, ValueAssignment::ScoreValue(1))
                        .with_name("Women's Singles")
                        .with_gender(Gender::Female),
                    CollectionDefinition::new(Singles, 1, ValueAssignment::ScoreValue(1))
                        .with_name("Men's Singles")
                        .with_gender(Gender::Male),
                    CollectionDefinition::new(Doubles, 1, ValueAssignment::ScoreValue(1))
                        .with_name("Women's Doubles")
                        .with_gender(Gender::Female),
                    CollectionDefinition::new(Doubles, 1, ValueAssignment::ScoreValue(1))
                        .with_name("Men's Doubles")
                        .with_gender(Gender::Male),
                    CollectionDefinition::new(Doubles, 1, ValueAssignment::ScoreValue(1))
                        .with_name("Mixed Doubles")
                        .with_gender(Gender::Mixed),
                ]
                .into_iter()
                .map(|def| def.with_format(set))
                .collect()
            }
        };

        let defs = defs
            .into_iter()
            .zip(1..)
            .map(|(def, order)| def.with_id(next_id()).with_order(order))
            .collect();

        TieFormat::new(defs, vec![]).with_name(template.name())
    }
}
