//! Shared fixtures for engine tests.

use tie_format_core::{
    CollectionDefinition, DrawDefinition, Event, MatchUp, MatchUpType, Structure, TieFormat,
    TieMatchUp, Tournament, ValueAssignment,
};

pub const TOURNAMENT_ID: &str = "tournament";
pub const EVENT_ID: &str = "e1";
pub const DRAW_ID: &str = "d1";
pub const STRUCTURE_ID: &str = "s1";

/// Three doubles and `singles` singles, one point per sub-match-up.
pub fn tie_format_with_singles(singles: u32) -> TieFormat {
    TieFormat::new(
        vec![
            CollectionDefinition::new(MatchUpType::Doubles, 3, ValueAssignment::MatchUpValue(1))
                .with_id("doubles")
                .with_name("Doubles")
                .with_order(1),
            CollectionDefinition::new(MatchUpType::Singles, singles, ValueAssignment::MatchUpValue(1))
                .with_id("singles")
                .with_name("Singles")
                .with_order(2),
        ],
        vec![],
    )
}

/// A team match-up with every sub-match-up the format requires.
pub fn team_match_up(match_up_id: &str, tie_format: &TieFormat) -> MatchUp {
    let mut n = 0;
    let mut match_up = MatchUp::team(match_up_id);
    match_up.tie_match_ups = TieMatchUp::generate_for(tie_format, || {
        n += 1;
        format!("{match_up_id}-t{n}")
    });
    match_up
}

/// One event with three doubles and three singles, one draw, one structure,
/// and four unplayed team match-ups `m1` to `m4`.
pub fn fixture() -> Tournament {
    let tie_format = tie_format_with_singles(3);

    let mut structure = Structure::new(STRUCTURE_ID);
    for i in 1..=4 {
        structure
            .match_ups
            .push(team_match_up(&format!("m{i}"), &tie_format));
    }
    let mut draw = DrawDefinition::new(DRAW_ID);
    draw.structures.push(structure);

    let mut event = Event::new(EVENT_ID);
    event.tie_format = Some(tie_format);
    event.draw_definitions.push(draw);

    let mut tournament = Tournament::new(TOURNAMENT_ID);
    tournament.events.push(event);
    tournament
}
