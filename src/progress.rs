//! Completion arithmetic for courses and training levels.
//!
//! Everything here is a pure recomputation from counts, so calling it again
//! with the same inputs always yields the same result, and un-completing a
//! lesson lowers the percentage exactly as completing it raised it.

use serde::Serialize;

use crate::entity::ProgressStatus;

/// `round(100 * completed / total)` with halves rounded up; 0 for an empty
/// course.
pub fn percentage(completed: usize, total: usize) -> i32 {
  if total == 0 {
    return 0;
  }
  let completed = completed.min(total);
  ((200 * completed + total) / (2 * total)) as i32
}

pub fn status(completed: usize, percentage: i32) -> ProgressStatus {
  if percentage == 100 {
    ProgressStatus::Completed
  } else if completed > 0 {
    ProgressStatus::InProgress
  } else {
    ProgressStatus::NotStarted
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CourseCompletion {
  pub completed_lessons: usize,
  pub total_lessons: usize,
  pub percentage: i32,
  pub status: ProgressStatus,
}

impl CourseCompletion {
  pub fn compute(completed_lessons: usize, total_lessons: usize) -> Self {
    let percentage = percentage(completed_lessons, total_lessons);
    Self {
      completed_lessons: completed_lessons.min(total_lessons),
      total_lessons,
      percentage,
      status: status(completed_lessons, percentage),
    }
  }
}

/// One course of a level as seen by a particular talent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CourseState {
  pub accessible: bool,
  pub percentage: i32,
  pub status: ProgressStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
  pub course_count: usize,
  pub accessible_count: usize,
  pub locked_count: usize,
  pub percentage: i32,
  pub status: ProgressStatus,
}

impl LevelProgress {
  /// Locked courses count towards `locked_count` only; they never enter the
  /// average or the status.
  pub fn aggregate(courses: &[CourseState]) -> Self {
    let accessible: Vec<_> = courses.iter().filter(|c| c.accessible).collect();
    let course_count = courses.len();
    let accessible_count = accessible.len();
    let locked_count = course_count - accessible_count;

    if accessible.is_empty() {
      return Self { course_count, accessible_count, locked_count, ..Self::default() };
    }

    let n = accessible.len() as i64;
    let sum: i64 = accessible.iter().map(|c| c.percentage as i64).sum();
    let percentage = ((2 * sum + n) / (2 * n)) as i32;

    let status = if accessible.iter().all(|c| c.status == ProgressStatus::Completed)
    {
      ProgressStatus::Completed
    } else if accessible
      .iter()
      .any(|c| c.percentage > 0 || c.status != ProgressStatus::NotStarted)
    {
      ProgressStatus::InProgress
    } else {
      ProgressStatus::NotStarted
    };

    Self { course_count, accessible_count, locked_count, percentage, status }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_percentage_rounding() {
    assert_eq!(percentage(0, 0), 0);
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(2, 3), 67);
    assert_eq!(percentage(1, 8), 13);
    assert_eq!(percentage(4, 4), 100);
  }

  #[test]
  fn test_four_lesson_course() {
    let one = CourseCompletion::compute(1, 4);
    assert_eq!(one.percentage, 25);
    assert_eq!(one.status, ProgressStatus::InProgress);

    let all = CourseCompletion::compute(4, 4);
    assert_eq!(all.percentage, 100);
    assert_eq!(all.status, ProgressStatus::Completed);

    assert_eq!(CourseCompletion::compute(0, 4).status, ProgressStatus::NotStarted);
  }

  #[test]
  fn test_uncompleting_is_symmetric() {
    let m = 7;
    for n in 1..=m {
      let up = CourseCompletion::compute(n, m);
      let down = CourseCompletion::compute(n - 1, m);
      assert_eq!(up.percentage, percentage(n, m));
      assert_eq!(down.percentage, percentage(n - 1, m));
      assert!(down.percentage < up.percentage);
    }
  }

  #[test]
  fn test_level_ignores_locked_courses() {
    let locked = CourseState::default();
    let half = CourseState {
      accessible: true,
      percentage: 50,
      status: ProgressStatus::InProgress,
    };

    let level = LevelProgress::aggregate(&[half, locked, locked]);
    assert_eq!(level.percentage, 50);
    assert_eq!(level.status, ProgressStatus::InProgress);
    assert_eq!(level.accessible_count, 1);
    assert_eq!(level.locked_count, 2);
  }

  #[test]
  fn test_level_without_accessible_courses() {
    let level = LevelProgress::aggregate(&[CourseState::default(); 2]);
    assert_eq!(level.percentage, 0);
    assert_eq!(level.status, ProgressStatus::NotStarted);
    assert_eq!(level.course_count, 2);

    assert_eq!(LevelProgress::aggregate(&[]).status, ProgressStatus::NotStarted);
  }

  #[test]
  fn test_level_completed_only_when_all_accessible_done() {
    let done = CourseState {
      accessible: true,
      percentage: 100,
      status: ProgressStatus::Completed,
    };
    let fresh = CourseState { accessible: true, ..CourseState::default() };

    let level = LevelProgress::aggregate(&[done, CourseState::default()]);
    assert_eq!(level.status, ProgressStatus::Completed);
    assert_eq!(level.percentage, 100);

    let level = LevelProgress::aggregate(&[done, fresh]);
    assert_eq!(level.status, ProgressStatus::InProgress);
    assert_eq!(level.percentage, 50);
  }
}
