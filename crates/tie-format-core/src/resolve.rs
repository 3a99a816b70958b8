//! Scope selection and effective tie-format resolution.
//!
//! Specificity runs match-up, structure, draw, event. The effective format
//! of any level is computed on read by walking outward to the first level
//! that declares one.

use std::fmt;

use serde::Serialize;

use crate::error::{Result, TieFormatError};
use crate::model::{DrawDefinition, Event, MatchUp, Structure, Tournament};
use crate::tie_format::TieFormat;

/// Caller-supplied ids selecting a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSelector {
    pub event_id: Option<String>,
    pub draw_id: Option<String>,
    pub structure_id: Option<String>,
    pub match_up_id: Option<String>,
}

impl ScopeSelector {
    pub fn event(event_id: impl Into<String>) -> Self {
        Self {
            event_id: Some(event_id.into()),
            ..Default::default()
        }
    }

    pub fn draw(draw_id: impl Into<String>) -> Self {
        Self {
            draw_id: Some(draw_id.into()),
            ..Default::default()
        }
    }

    pub fn structure(draw_id: impl Into<String>, structure_id: impl Into<String>) -> Self {
        Self {
            draw_id: Some(draw_id.into()),
            structure_id: Some(structure_id.into()),
            ..Default::default()
        }
    }

    pub fn match_up(draw_id: impl Into<String>, match_up_id: impl Into<String>) -> Self {
        Self {
            draw_id: Some(draw_id.into()),
            match_up_id: Some(match_up_id.into()),
            ..Default::default()
        }
    }

    /// Builder: name the event explicitly.
    pub fn with_event(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = Some(event_id.into());
        self
    }
}

/// Level of the hierarchy, least specific first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeLevel {
    Event,
    Draw,
    Structure,
    MatchUp,
}

impl fmt::Display for ScopeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeLevel::Event => write!(f, "event"),
            ScopeLevel::Draw => write!(f, "draw"),
            ScopeLevel::Structure => write!(f, "structure"),
            ScopeLevel::MatchUp => write!(f, "match-up"),
        }
    }
}

/// A concrete, fully identified scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "level", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Scope {
    Event {
        event_id: String,
    },
    Draw {
        event_id: String,
        draw_id: String,
    },
    Structure {
        event_id: String,
        draw_id: String,
        structure_id: String,
    },
    MatchUp {
        event_id: String,
        draw_id: String,
        structure_id: String,
        match_up_id: String,
    },
}

impl Scope {
    pub fn level(&self) -> ScopeLevel {
        match self {
            Scope::Event { .. } => ScopeLevel::Event,
            Scope::Draw { .. } => ScopeLevel::Draw,
            Scope::Structure { .. } => ScopeLevel::Structure,
            Scope::MatchUp { .. } => ScopeLevel::MatchUp,
        }
    }

    pub fn event_id(&self) -> &str {
        match self {
            Scope::Event { event_id }
            | Scope::Draw { event_id, .. }
            | Scope::Structure { event_id, .. }
            | Scope::MatchUp { event_id, .. } => event_id,
        }
    }

    pub fn draw_id(&self) -> Option<&str> {
        match self {
            Scope::Event { .. } => None,
            Scope::Draw { draw_id, .. }
            | Scope::Structure { draw_id, .. }
            | Scope::MatchUp { draw_id, .. } => Some(draw_id),
        }
    }

    pub fn structure_id(&self) -> Option<&str> {
        match self {
            Scope::Structure { structure_id, .. } | Scope::MatchUp { structure_id, .. } => {
                Some(structure_id)
            }
            _ => None,
        }
    }

    pub fn match_up_id(&self) -> Option<&str> {
        match self {
            Scope::MatchUp { match_up_id, .. } => Some(match_up_id),
            _ => None,
        }
    }

    /// The scope one level less specific. Match-ups step to their structure.
    pub fn parent(&self) -> Option<Scope> {
        match self {
            Scope::Event { .. } => None,
            Scope::Draw { event_id, .. } => Some(Scope::Event {
                event_id: event_id.clone(),
            }),
            Scope::Structure {
                event_id, draw_id, ..
            } => Some(Scope::Draw {
                event_id: event_id.clone(),
                draw_id: draw_id.clone(),
            }),
            Scope::MatchUp {
                event_id,
                draw_id,
                structure_id,
                ..
            } => Some(Scope::Structure {
                event_id: event_id.clone(),
                draw_id: draw_id.clone(),
                structure_id: structure_id.clone(),
            }),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Event { event_id } => write!(f, "event {event_id}"),
            Scope::Draw { draw_id, .. } => write!(f, "draw {draw_id}"),
            Scope::Structure { structure_id, .. } => write!(f, "structure {structure_id}"),
            Scope::MatchUp { match_up_id, .. } => write!(f, "match-up {match_up_id}"),
        }
    }
}

/// The containers addressed by a scope.
#[derive(Debug, Clone, Copy)]
pub struct ScopeNodes<'a> {
    pub event: &'a Event,
    pub draw: Option<&'a DrawDefinition>,
    pub structure: Option<&'a Structure>,
    pub match_up: Option<&'a MatchUp>,
}

impl<'a> ScopeNodes<'a> {
    /// The format declared exactly at the addressed level.
    pub fn own_tie_format(&self) -> Option<&'a TieFormat> {
        if let Some(match_up) = self.match_up {
            return match_up.tie_format.as_ref();
        }
        if let Some(structure) = self.structure {
            return structure.tie_format.as_ref();
        }
        if let Some(draw) = self.draw {
            return draw.tie_format.as_ref();
        }
        self.event.tie_format.as_ref()
    }

    /// The most specific format at or above the addressed level.
    pub fn effective_tie_format(&self) -> Option<(&'a TieFormat, ScopeLevel)> {
        let levels = [
            (self.match_up.and_then(|m| m.tie_format.as_ref()), ScopeLevel::MatchUp),
            (self.structure.and_then(|s| s.tie_format.as_ref()), ScopeLevel::Structure),
            (self.draw.and_then(|d| d.tie_format.as_ref()), ScopeLevel::Draw),
            (self.event.tie_format.as_ref(), ScopeLevel::Event),
        ];
        levels
            .into_iter()
            .find_map(|(tf, level)| tf.map(|tf| (tf, level)))
    }

    /// The most specific format strictly above the addressed level.
    pub fn inherited_tie_format(&self) -> Option<&'a TieFormat> {
        if self.match_up.is_some() {
            return inherited_tie_format(self.event, self.draw, self.structure);
        }
        if self.structure.is_some() {
            return inherited_tie_format(self.event, self.draw, None);
        }
        if self.draw.is_some() {
            return self.event.tie_format.as_ref();
        }
        None
    }
}

/// A resolved scope and the tie format governing it.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedTieFormat<'a> {
    pub tie_format: &'a TieFormat,
    /// Level at which the format was found.
    pub source: ScopeLevel,
    pub nodes: ScopeNodes<'a>,
}

/// The most specific format declared among the given containers.
pub fn inherited_tie_format<'a>(
    event: &'a Event,
    draw: Option<&'a DrawDefinition>,
    structure: Option<&'a Structure>,
) -> Option<&'a TieFormat> {
    structure
        .and_then(|s| s.tie_format.as_ref())
        .or_else(|| draw.and_then(|d| d.tie_format.as_ref()))
        .or(event.tie_format.as_ref())
}

/// Effective format of a match-up within its containers.
pub fn effective_for_match_up<'a>(
    event: &'a Event,
    draw: &'a DrawDefinition,
    structure: &'a Structure,
    match_up: &'a MatchUp,
) -> Option<&'a TieFormat> {
    match_up
        .tie_format
        .as_ref()
        .or_else(|| inherited_tie_format(event, Some(draw), Some(structure)))
}

impl ScopeSelector {
    /// Turn the selector into a concrete scope, checking every id exists.
    pub fn to_scope(&self, tournament: &Tournament) -> Result<Scope> {
        Ok(self.locate(tournament)?.0)
    }

    fn locate<'a>(&self, tournament: &'a Tournament) -> Result<(Scope, ScopeNodes<'a>)> {
        let Some(draw_id) = &self.draw_id else {
            if self.structure_id.is_some() || self.match_up_id.is_some() {
                return Err(TieFormatError::MissingDrawDefinition { draw_id: None });
            }
            let event_id = self.event_id.as_ref().ok_or(TieFormatError::MissingValue {
                param: "eventId",
            })?;
            let event = tournament
                .event(event_id)
                .ok_or_else(|| TieFormatError::EventNotFound {
                    event_id: event_id.clone(),
                })?;
            let nodes = ScopeNodes {
                event,
                draw: None,
                structure: None,
                match_up: None,
            };
            return Ok((
                Scope::Event {
                    event_id: event_id.clone(),
                },
                nodes,
            ));
        };

        let event = match &self.event_id {
            Some(event_id) => tournament
                .event(event_id)
                .ok_or_else(|| TieFormatError::EventNotFound {
                    event_id: event_id.clone(),
                })?,
            None => tournament.event_of_draw(draw_id).ok_or_else(|| {
                TieFormatError::MissingDrawDefinition {
                    draw_id: Some(draw_id.clone()),
                }
            })?,
        };
        let draw = event
            .draw(draw_id)
            .ok_or_else(|| TieFormatError::MissingDrawDefinition {
                draw_id: Some(draw_id.clone()),
            })?;
        let event_id = event.event_id.clone();

        if let Some(match_up_id) = &self.match_up_id {
            let structure = match &self.structure_id {
                Some(structure_id) => draw.structure(structure_id).ok_or_else(|| {
                    TieFormatError::StructureNotFound {
                        structure_id: structure_id.clone(),
                    }
                })?,
                None => draw.structure_of_match_up(match_up_id).ok_or_else(|| {
                    TieFormatError::MatchUpNotFound {
                        match_up_id: match_up_id.clone(),
                    }
                })?,
            };
            let match_up =
                structure
                    .match_up(match_up_id)
                    .ok_or_else(|| TieFormatError::MatchUpNotFound {
                        match_up_id: match_up_id.clone(),
                    })?;
            let scope = Scope::MatchUp {
                event_id,
                draw_id: draw_id.clone(),
                structure_id: structure.structure_id.clone(),
                match_up_id: match_up_id.clone(),
            };
            let nodes = ScopeNodes {
                event,
                draw: Some(draw),
                structure: Some(structure),
                match_up: Some(match_up),
            };
            return Ok((scope, nodes));
        }

        if let Some(structure_id) = &self.structure_id {
            let structure =
                draw.structure(structure_id)
                    .ok_or_else(|| TieFormatError::StructureNotFound {
                        structure_id: structure_id.clone(),
                    })?;
            let scope = Scope::Structure {
                event_id,
                draw_id: draw_id.clone(),
                structure_id: structure_id.clone(),
            };
            let nodes = ScopeNodes {
                event,
                draw: Some(draw),
                structure: Some(structure),
                match_up: None,
            };
            return Ok((scope, nodes));
        }

        let scope = Scope::Draw {
            event_id,
            draw_id: draw_id.clone(),
        };
        let nodes = ScopeNodes {
            event,
            draw: Some(draw),
            structure: None,
            match_up: None,
        };
        Ok((scope, nodes))
    }
}

/// Find the containers addressed by a concrete scope.
pub fn scope_nodes<'a>(tournament: &'a Tournament, scope: &Scope) -> Result<ScopeNodes<'a>> {
    let selector = ScopeSelector {
        event_id: Some(scope.event_id().to_string()),
        draw_id: scope.draw_id().map(str::to_string),
        structure_id: scope.structure_id().map(str::to_string),
        match_up_id: scope.match_up_id().map(str::to_string),
    };
    Ok(selector.locate(tournament)?.1)
}

/// Resolve the tie format governing a selected scope.
pub fn resolve_tie_format<'a>(
    tournament: &'a Tournament,
    selector: &ScopeSelector,
) -> Result<(Scope, ResolvedTieFormat<'a>)> {
    let (scope, nodes) = selector.locate(tournament)?;
    let (tie_format, source) =
        nodes
            .effective_tie_format()
            .ok_or_else(|| TieFormatError::MissingTieFormat {
                context: scope.to_string(),
            })?;
    Ok((
        scope,
        ResolvedTieFormat {
            tie_format,
            source,
            nodes,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionDefinition, MatchUpType, ValueAssignment};
    use crate::error::ErrorCode;

    fn format(count: u32) -> TieFormat {
        TieFormat::new(
            vec![
                CollectionDefinition::new(MatchUpType::Singles, count, ValueAssignment::MatchUpValue(1))
                    .with_id("singles"),
            ],
            vec![],
        )
    }

    fn tournament() -> Tournament {
        let mut structure = Structure::new("s1");
        structure.match_ups.push(MatchUp::team("m1"));
        let mut overridden = MatchUp::team("m2");
        overridden.tie_format = Some(format(5));
        structure.match_ups.push(overridden);

        let mut draw = DrawDefinition::new("d1");
        draw.structures.push(structure);
        draw.structures.push(Structure::new("s2"));

        let mut event = Event::new("e1");
        event.tie_format = Some(format(3));
        event.draw_definitions.push(draw);

        let mut t = Tournament::new("t1");
        t.events.push(event);
        t.events.push(Event::new("e2"));
        t
    }

    #[test]
    fn inherits_from_event() {
        let t = tournament();
        let (scope, resolved) = resolve_tie_format(&t, &ScopeSelector::match_up("d1", "m1")).unwrap();
        assert_eq!(scope.level(), ScopeLevel::MatchUp);
        assert_eq!(scope.structure_id(), Some("s1"));
        assert_eq!(scope.event_id(), "e1");
        assert_eq!(resolved.source, ScopeLevel::Event);
        assert_eq!(resolved.tie_format.total_match_up_count(), 3);
    }

    #[test]
    fn match_up_override_wins() {
        let t = tournament();
        let (_, resolved) = resolve_tie_format(&t, &ScopeSelector::match_up("d1", "m2")).unwrap();
        assert_eq!(resolved.source, ScopeLevel::MatchUp);
        assert_eq!(resolved.tie_format.total_match_up_count(), 5);
        assert_eq!(
            resolved.nodes.inherited_tie_format().map(TieFormat::total_match_up_count),
            Some(3)
        );
    }

    #[test]
    fn structure_without_draw_is_out_of_scope() {
        let t = tournament();
        let selector = ScopeSelector {
            structure_id: Some("s1".into()),
            ..Default::default()
        };
        let err = resolve_tie_format(&t, &selector).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingDrawDefinition);
    }

    #[test]
    fn missing_everywhere() {
        let t = tournament();
        let err = resolve_tie_format(&t, &ScopeSelector::event("e2")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingTieFormat);

        let err = resolve_tie_format(&t, &ScopeSelector::default()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingValue);

        let err = resolve_tie_format(&t, &ScopeSelector::draw("nope")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingDrawDefinition);
    }

    #[test]
    fn scope_round_trips_to_nodes() {
        let t = tournament();
        let scope = ScopeSelector::structure("d1", "s2").to_scope(&t).unwrap();
        assert_eq!(
            scope.parent(),
            Some(Scope::Draw {
                event_id: "e1".into(),
                draw_id: "d1".into()
            })
        );
        let nodes = scope_nodes(&t, &scope).unwrap();
        assert!(nodes.own_tie_format().is_none());
        assert!(nodes.effective_tie_format().is_some());
    }
}
