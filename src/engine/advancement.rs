//! Level Advancement Calculator: decides the `current_level` value
//! persisted on an enrollment.
//!
//! Stricter than the evaluator on purpose: a pending session counts as
//! not-present here, so an enrollment never coasts forward on partial
//! credit.

use serde::Serialize;

use super::{LevelAttendance, SessionMark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Advancement {
    pub next_level: i32,
    pub completed: bool,
}

fn strictly_validated(level: &LevelAttendance) -> bool {
    !level.marks.is_empty() && level.marks.iter().all(|m| *m == SessionMark::Present)
}

/// Walk levels in ascending `level_number`, stopping at the first level
/// that is not fully present. Returns the level the student should sit at
/// and whether every level is validated. `next_level` is clamped into
/// `[1, max_level_number]`; a training without levels yields `(1, false)`.
pub fn advance(levels: &[LevelAttendance]) -> Advancement {
    let mut ordered: Vec<&LevelAttendance> = levels.iter().collect();
    ordered.sort_by_key(|l| l.level_number);

    let Some(last) = ordered.last() else {
        return Advancement { next_level: 1, completed: false };
    };
    // Level numbers are 1-based in the schema; floor the bound anyway so a
    // malformed snapshot clamps instead of panicking.
    let max_level = last.level_number.max(1);

    for level in &ordered {
        if !strictly_validated(level) {
            return Advancement {
                next_level: level.level_number.clamp(1, max_level),
                completed: false,
            };
        }
    }

    Advancement { next_level: max_level, completed: true }
}

#[cfg(test)]
mod tests {
    use super::*;
    use SessionMark::{Absent, Pending, Present};

    fn level(number: i32, marks: &[SessionMark]) -> LevelAttendance {
        LevelAttendance {
            level_number: number,
            marks: marks.to_vec(),
        }
    }

    #[test]
    fn stops_at_first_partially_marked_level() {
        let result = advance(&[
            level(1, &[Present, Present]),
            level(2, &[Present, Pending]),
            level(3, &[Pending, Pending]),
        ]);
        assert_eq!(result, Advancement { next_level: 2, completed: false });
    }

    #[test]
    fn absence_blocks_advancement_like_a_pending_session() {
        let result = advance(&[level(1, &[Present, Absent]), level(2, &[Present, Present])]);
        assert_eq!(result, Advancement { next_level: 1, completed: false });
    }

    #[test]
    fn all_levels_validated_completes_at_the_last_level() {
        let result = advance(&[
            level(1, &[Present, Present]),
            level(2, &[Present, Present]),
            level(3, &[Present]),
        ]);
        assert_eq!(result, Advancement { next_level: 3, completed: true });
    }

    #[test]
    fn empty_level_is_not_validated() {
        let result = advance(&[level(1, &[])]);
        assert_eq!(result, Advancement { next_level: 1, completed: false });
    }

    #[test]
    fn training_without_levels_starts_at_one() {
        assert_eq!(advance(&[]), Advancement { next_level: 1, completed: false });
    }

    #[test]
    fn out_of_range_level_numbers_clamp_instead_of_panicking() {
        let result = advance(&[level(0, &[Pending])]);
        assert_eq!(result, Advancement { next_level: 1, completed: false });

        let result = advance(&[level(-3, &[Present])]);
        assert_eq!(result, Advancement { next_level: 1, completed: true });
    }
}
