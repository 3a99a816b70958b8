//! Lock rules: when a team match-up may have its format changed.

use std::fmt;

use tie_format_core::MatchUp;

/// Why a match-up is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockReason {
    WinningSide,
    Completed,
    InProgress,
    ScoreRecorded,
}

impl fmt::Display for LockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockReason::WinningSide => write!(f, "a winning side is recorded"),
            LockReason::Completed => write!(f, "the match-up is completed"),
            LockReason::InProgress => write!(f, "the match-up is in progress"),
            LockReason::ScoreRecorded => write!(f, "a sub-match-up has a recorded score"),
        }
    }
}

/// The reason a match-up is locked, or `None` when it may be changed.
///
/// A winner or a completed status always locks. Progress and recorded
/// scores only lock unless `update_in_progress` is set.
pub fn lock_reason(match_up: &MatchUp, update_in_progress: bool) -> Option<LockReason> {
    if match_up.winning_side.is_some() {
        return Some(LockReason::WinningSide);
    }
    if match_up.match_up_status.is_completed() {
        return Some(LockReason::Completed);
    }
    if update_in_progress {
        return None;
    }
    if match_up.match_up_status.is_in_progress() {
        return Some(LockReason::InProgress);
    }
    if match_up.tie_match_ups.iter().any(|t| t.has_score()) {
        return Some(LockReason::ScoreRecorded);
    }
    None
}

pub fn is_unlocked(match_up: &MatchUp, update_in_progress: bool) -> bool {
    lock_reason(match_up, update_in_progress).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tie_format_core::{MatchUpStatus, MatchUpType, Score, TieMatchUp};

    fn scored_tie() -> TieMatchUp {
        let mut tie = TieMatchUp::new("t1", "singles", 1, MatchUpType::Singles);
        tie.score = Some(Score {
            score_string_side1: Some("6-4".into()),
            ..Default::default()
        });
        tie
    }

    #[test]
    fn fresh_match_up_is_unlocked() {
        assert!(is_unlocked(&MatchUp::team("m1"), false));
    }

    #[test]
    fn winner_and_completion_always_lock() {
        let mut m = MatchUp::team("m1");
        m.winning_side = Some(1);
        assert_eq!(lock_reason(&m, true), Some(LockReason::WinningSide));

        let mut m = MatchUp::team("m1");
        m.match_up_status = MatchUpStatus::Retired;
        assert_eq!(lock_reason(&m, true), Some(LockReason::Completed));
    }

    #[test]
    fn progress_locks_without_permission() {
        let mut m = MatchUp::team("m1");
        m.match_up_status = MatchUpStatus::InProgress;
        assert_eq!(lock_reason(&m, false), Some(LockReason::InProgress));
        assert!(is_unlocked(&m, true));

        let mut m = MatchUp::team("m2");
        m.tie_match_ups.push(scored_tie());
        assert_eq!(lock_reason(&m, false), Some(LockReason::ScoreRecorded));
        assert!(is_unlocked(&m, true));
    }
}
