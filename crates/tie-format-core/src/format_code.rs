//! Match-up format code grammar.
//!
//! Codes follow the TODS notation, for example `SET3-S:6/TB7`,
//! `SET3-S:6/TB7-F:TB10`, `SET1-S:8/TB7@7`, `SET3X-S:4NOAD/TB5`, or `T20`.
//! Validation is exposed behind [`FormatCodeValidator`] so that callers can
//! substitute a stricter or more permissive grammar.

/// Decides whether a match-up format code is acceptable.
pub trait FormatCodeValidator {
    fn is_valid_format_code(&self, code: &str) -> bool;
}

/// The standard TODS grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardFormatCodes;

impl FormatCodeValidator for StandardFormatCodes {
    fn is_valid_format_code(&self, code: &str) -> bool {
        parse_match_up_format(code).is_some()
    }
}

/// Tiebreak game definition, e.g. `TB7`, `TB10NOAD`, `TB7@6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiebreakFormat {
    pub tiebreak_to: u32,
    pub no_ad: bool,
    /// Game score at which the tiebreak is played, when not the set length.
    pub tiebreak_at: Option<u32>,
}

/// How a single set is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFormat {
    Games {
        set_to: u32,
        no_ad: bool,
        tiebreak: Option<TiebreakFormat>,
    },
    TiebreakOnly(TiebreakFormat),
    Timed {
        minutes: u32,
        /// Scoring basis: `P` points, `G` games, `A` aggregate.
        based_on: Option<char>,
    },
}

/// A parsed match-up format code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchUpFormatCode {
    /// Number of sets; best-of unless `exactly`.
    pub number_of_sets: u32,
    pub exactly: bool,
    pub set_format: SetFormat,
    pub final_set_format: Option<SetFormat>,
}

/// Parse a match-up format code, returning `None` when it is malformed.
pub fn parse_match_up_format(code: &str) -> Option<MatchUpFormatCode> {
    let code = code.trim();
    if code.starts_with('T') && !code.starts_with("TB") {
        let set_format = parse_timed(code)?;
        return Some(MatchUpFormatCode {
            number_of_sets: 1,
            exactly: true,
            set_format,
            final_set_format: None,
        });
    }

    let mut parts = code.split('-');
    let head = parts.next()?.strip_prefix("SET")?;
    let (count, exactly) = match head.strip_suffix('X') {
        Some(n) => (n, true),
        None => (head, false),
    };
    let number_of_sets = parse_positive(count)?;

    let set_format = parse_set_format(parts.next()?.strip_prefix("S:")?)?;
    let final_set_format = match parts.next() {
        Some(part) => Some(parse_set_format(part.strip_prefix("F:")?)?),
        None => None,
    };
    if parts.next().is_some() {
        return None;
    }
    if final_set_format.is_some() && number_of_sets < 2 {
        return None;
    }

    Some(MatchUpFormatCode {
        number_of_sets,
        exactly,
        set_format,
        final_set_format,
    })
}

fn parse_set_format(s: &str) -> Option<SetFormat> {
    if let Some(rest) = s.strip_prefix("TB") {
        return Some(SetFormat::TiebreakOnly(parse_tiebreak(rest)?));
    }
    if s.starts_with('T') {
        return parse_timed(s);
    }

    let (games, tiebreak) = match s.split_once('/') {
        Some((games, tb)) => (games, Some(parse_tiebreak(tb.strip_prefix("TB")?)?)),
        None => (s, None),
    };
    let (games, no_ad) = strip_no_ad(games);
    Some(SetFormat::Games {
        set_to: parse_positive(games)?,
        no_ad,
        tiebreak,
    })
}

fn parse_tiebreak(s: &str) -> Option<TiebreakFormat> {
    let (body, at) = match s.split_once('@') {
        Some((body, at)) => (body, Some(parse_positive(at)?)),
        None => (s, None),
    };
    let (to, no_ad) = strip_no_ad(body);
    Some(TiebreakFormat {
        tiebreak_to: parse_positive(to)?,
        no_ad,
        tiebreak_at: at,
    })
}

fn parse_timed(s: &str) -> Option<SetFormat> {
    let body = s.strip_prefix('T')?;
    let (minutes, based_on) = match body.chars().last() {
        Some(c @ ('P' | 'G' | 'A')) => (&body[..body.len() - 1], Some(c)),
        _ => (body, None),
    };
    Some(SetFormat::Timed {
        minutes: parse_positive(minutes)?,
        based_on,
    })
}

fn strip_no_ad(s: &str) -> (&str, bool) {
    match s.strip_suffix("NOAD") {
        Some(rest) => (rest, true),
        None => (s, false),
    }
}

fn parse_positive(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_codes() {
        let v = StandardFormatCodes;
        for code in [
            "SET3-S:6/TB7",
            "SET1-S:8/TB7@7",
            "SET3-S:6/TB7-F:TB10",
            "SET3X-S:4NOAD/TB5",
            "SET5-S:6/TB7NOAD",
            "SET1-S:T20",
            "SET1-S:TB10",
            "T20",
            "T10P",
        ] {
            assert!(v.is_valid_format_code(code), "{code} should be valid");
        }
    }

    #[test]
    fn malformed_codes() {
        let v = StandardFormatCodes;
        for code in [
            "",
            "SET",
            "SET0-S:6/TB7",
            "SET3-6/TB7",
            "SET3-S:6/7",
            "SET3-S:6/TB7-F:",
            "SET1-S:6-F:TB10",
            "SET3-S:6/TB7-F:TB10-X",
            "SETA-S:6",
            "T",
        ] {
            assert!(!v.is_valid_format_code(code), "{code} should be invalid");
        }
    }

    #[test]
    fn parsed_structure() {
        let f = parse_match_up_format("SET3-S:6/TB7-F:TB10").unwrap();
        assert_eq!(f.number_of_sets, 3);
        assert!(!f.exactly);
        assert_eq!(
            f.set_format,
            SetFormat::Games {
                set_to: 6,
                no_ad: false,
                tiebreak: Some(TiebreakFormat {
                    tiebreak_to: 7,
                    no_ad: false,
                    tiebreak_at: None
                })
            }
        );
        assert!(matches!(
            f.final_set_format,
            Some(SetFormat::TiebreakOnly(TiebreakFormat { tiebreak_to: 10, .. }))
        ));
    }
}
