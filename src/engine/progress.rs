//! Progress Evaluator: per-level and per-training status for one
//! (training, student) pair, computed from an attendance snapshot.

use serde::Serialize;

use super::{LevelAttendance, SessionMark};

/// Absences at or above this count raise the `late` flag, independent of
/// pass/fail.
pub const LATE_ABSENCE_THRESHOLD: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelStatus {
    InProgress,
    Passed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelProgress {
    pub level_number: i32,
    pub status: LevelStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainingProgress {
    pub total_sessions: u32,
    pub attended_sessions: u32,
    pub absent_count: u32,
    pub levels_completed: u32,
    pub total_levels: u32,
    pub eligible: bool,
    pub late: bool,
    pub formation_status: FormationStatus,
    pub levels: Vec<LevelProgress>,
}

fn level_status(marks: &[SessionMark]) -> LevelStatus {
    // Unmarked sessions defer judgement; they never fail a level.
    if marks.iter().any(|m| *m == SessionMark::Pending) {
        return LevelStatus::InProgress;
    }
    if marks.iter().all(|m| *m == SessionMark::Present) {
        LevelStatus::Passed
    } else {
        LevelStatus::Failed
    }
}

/// Evaluate one student's standing in a training. Pure and deterministic
/// for a given snapshot; levels are ordered by `level_number` before
/// aggregation so the caller's ordering is irrelevant.
pub fn evaluate(levels: &[LevelAttendance]) -> TrainingProgress {
    let mut ordered: Vec<&LevelAttendance> = levels.iter().collect();
    ordered.sort_by_key(|l| l.level_number);

    let mut total_sessions = 0u32;
    let mut attended_sessions = 0u32;
    let mut absent_count = 0u32;
    let mut per_level = Vec::with_capacity(ordered.len());

    for level in &ordered {
        total_sessions += level.marks.len() as u32;
        attended_sessions += level.marks.iter().filter(|m| **m == SessionMark::Present).count() as u32;
        absent_count += level.marks.iter().filter(|m| **m == SessionMark::Absent).count() as u32;
        per_level.push(LevelProgress {
            level_number: level.level_number,
            status: level_status(&level.marks),
        });
    }

    let total_levels = per_level.len() as u32;
    let levels_completed = per_level.iter().filter(|l| l.status == LevelStatus::Passed).count() as u32;
    let any_failed = per_level.iter().any(|l| l.status == LevelStatus::Failed);
    let any_in_progress = per_level.iter().any(|l| l.status == LevelStatus::InProgress);

    let formation_status = if total_levels > 0 && levels_completed == total_levels {
        FormationStatus::Completed
    } else if any_failed && !any_in_progress {
        // Failure is only declared once every level has been fully marked.
        FormationStatus::Failed
    } else {
        FormationStatus::InProgress
    };

    TrainingProgress {
        total_sessions,
        attended_sessions,
        absent_count,
        levels_completed,
        total_levels,
        eligible: formation_status == FormationStatus::Completed,
        late: absent_count >= LATE_ABSENCE_THRESHOLD,
        formation_status,
        levels: per_level,
    }
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
    fn unmarked_sessions_never_fail_a_level() {
        let progress = evaluate(&[level(1, &[Present, Present, Present, Pending, Pending, Pending])]);
        assert_eq!(progress.levels[0].status, LevelStatus::InProgress);
        assert_eq!(progress.formation_status, FormationStatus::InProgress);
    }

    #[test]
    fn fully_marked_level_passes_or_fails() {
        let passed = evaluate(&[level(1, &[Present; 6])]);
        assert_eq!(passed.levels[0].status, LevelStatus::Passed);

        let failed = evaluate(&[level(1, &[Present, Present, Present, Present, Present, Absent])]);
        assert_eq!(failed.levels[0].status, LevelStatus::Failed);
    }

    #[test]
    fn completed_iff_every_level_passed() {
        let done = evaluate(&[level(1, &[Present, Present]), level(2, &[Present, Present])]);
        assert_eq!(done.formation_status, FormationStatus::Completed);
        assert!(done.eligible);
        assert_eq!(done.levels_completed, 2);

        let not_done = evaluate(&[level(1, &[Present, Present]), level(2, &[Present, Absent])]);
        assert_ne!(not_done.formation_status, FormationStatus::Completed);
        assert!(!not_done.eligible);
    }

    #[test]
    fn failure_deferred_while_any_level_pending() {
        // Level 1 failed outright, level 2 still has unmarked sessions.
        let progress = evaluate(&[level(1, &[Absent, Present]), level(2, &[Present, Pending])]);
        assert_eq!(progress.formation_status, FormationStatus::InProgress);

        // Once everything is marked, the failure lands.
        let progress = evaluate(&[level(1, &[Absent, Present]), level(2, &[Present, Present])]);
        assert_eq!(progress.formation_status, FormationStatus::Failed);
    }

    #[test]
    fn empty_training_is_in_progress_and_not_eligible() {
        let progress = evaluate(&[]);
        assert_eq!(progress.formation_status, FormationStatus::InProgress);
        assert!(!progress.eligible);
        assert_eq!(progress.total_levels, 0);
    }

    #[test]
    fn evaluation_is_order_independent() {
        let a = [level(1, &[Present, Absent]), level(2, &[Pending, Present])];
        let b = [level(2, &[Pending, Present]), level(1, &[Present, Absent])];
        let pa = evaluate(&a);
        let pb = evaluate(&b);
        assert_eq!(pa.formation_status, pb.formation_status);
        assert_eq!(pa.attended_sessions, pb.attended_sessions);
        assert_eq!(
            pa.levels.iter().map(|l| (l.level_number, l.status)).collect::<Vec<_>>(),
            pb.levels.iter().map(|l| (l.level_number, l.status)).collect::<Vec<_>>(),
        );
    }

    #[test]
    fn late_flag_counts_absences_across_levels() {
        let progress = evaluate(&[
            level(1, &[Absent, Absent, Absent]),
            level(2, &[Absent, Absent, Pending]),
        ]);
        assert!(progress.late);
        assert_eq!(progress.absent_count, 5);

        let progress = evaluate(&[level(1, &[Absent, Absent, Absent, Absent])]);
        assert!(!progress.late);
    }
}
