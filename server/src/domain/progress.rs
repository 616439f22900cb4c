//! Session progress state machine
//!
//! A session is a cursor over a fixed-size question list. The total is a
//! snapshot taken at assignment time and never recomputed.

use crate::data::types::SessionRow;

/// State derived from the counters alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressState {
    InProgress,
    Completed,
}

/// Cursor position and completion flag of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current_index: i64,
    pub total: i64,
    pub is_completed: bool,
}

impl Progress {
    /// Fresh progress for a questionnaire with `total` questions
    pub fn assigned(total: i64) -> Self {
        Self {
            current_index: 0,
            total,
            is_completed: false,
        }
    }

    pub fn of(session: &SessionRow) -> Self {
        Self {
            current_index: session.current_index,
            total: session.total_questions,
            is_completed: session.is_completed,
        }
    }

    /// Progress after one accepted answer
    ///
    /// Always moves the cursor by exactly one, even past the total. The
    /// completion flag latches: once set it stays set.
    pub fn advance(&self) -> Self {
        let next = self.current_index + 1;
        Self {
            current_index: next,
            total: self.total,
            is_completed: self.is_completed || next >= self.total,
        }
    }

    /// State implied by index and total, ignoring the stored flag
    pub fn state(&self) -> ProgressState {
        if self.current_index >= self.total {
            ProgressState::Completed
        } else {
            ProgressState::InProgress
        }
    }

    /// Percentage of questions answered (0 when there are no questions)
    pub fn percent(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        self.current_index as f64 / self.total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assigned_starts_in_progress() {
        let p = Progress::assigned(3);
        assert_eq!(p.current_index, 0);
        assert!(!p.is_completed);
        assert_eq!(p.state(), ProgressState::InProgress);
        assert_eq!(p.percent(), 0.0);
    }

    #[test]
    fn test_sequential_answers_complete_on_last() {
        let mut p = Progress::assigned(3);
        p = p.advance();
        assert!(!p.is_completed);
        p = p.advance();
        assert!(!p.is_completed);
        p = p.advance();
        assert!(p.is_completed);
        assert_eq!(p.current_index, 3);
        assert_eq!(p.state(), ProgressState::Completed);
        assert_eq!(p.percent(), 100.0);
    }

    #[test]
    fn test_over_advance_keeps_counting() {
        let p = Progress::assigned(1).advance().advance();
        assert_eq!(p.current_index, 2);
        assert!(p.is_completed);
        assert_eq!(p.percent(), 200.0);
    }

    #[test]
    fn test_completion_latches() {
        let p = Progress {
            current_index: 0,
            total: 5,
            is_completed: true,
        };
        assert!(p.advance().is_completed);
    }

    #[test]
    fn test_empty_questionnaire() {
        let p = Progress::assigned(0);
        // Stored flag stays false until something sets it
        assert!(!p.is_completed);
        assert_eq!(p.state(), ProgressState::Completed);
        assert_eq!(p.percent(), 0.0);
    }

    #[test]
    fn test_percent_partial() {
        let p = Progress::assigned(4).advance();
        assert_eq!(p.percent(), 25.0);
    }
}
