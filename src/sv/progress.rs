use std::collections::HashSet;

use sea_orm::{
  DatabaseTransaction,
  sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use uuid::Uuid;

use super::{Access, Catalog, Db};
use crate::{
  entity::{ProgressStatus, course, lesson, lesson_progress, talent_course},
  package::{self, Entitlement, PackageInfo},
  prelude::*,
  progress::{CourseCompletion, CourseState, LevelProgress},
};

#[derive(Debug, Clone, Serialize)]
pub struct CourseCard {
  pub id: Uuid,
  pub level_id: Option<Uuid>,
  pub title: String,
  pub description: Option<String>,
  pub total_lessons: usize,
  pub locked: bool,
  /// Cheapest tier offering the course, `None` if no tier does
  pub required_package: Option<PackageInfo>,
  pub progress_percentage: i32,
  pub status: ProgressStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
  pub id: Uuid,
  pub title: String,
  pub description: Option<String>,
  pub video_url: Option<String>,
  pub order_index: i32,
  pub is_completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDetail {
  pub course: course::Model,
  pub lessons: Vec<LessonView>,
  pub progress: CourseCompletion,
}

#[derive(Debug, Clone, Serialize)]
pub struct JourneyLevel {
  pub id: Uuid,
  pub code: String,
  pub name: String,
  pub short_name: Option<String>,
  pub order_index: i32,
  #[serde(flatten)]
  pub progress: LevelProgress,
  /// First level the talent can work on and has not finished
  pub is_current: bool,
}

/// Outcome of recomputing one course for every talent with stored progress.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshReport {
  pub refreshed: usize,
  /// Talents who no longer have access
  pub skipped: usize,
  pub failed: usize,
}

pub struct Progress<'a> {
  db: Db<'a>,
}

impl<'a> Progress<'a> {
  pub fn new(db: Db<'a>) -> Self {
    Self { db }
  }

  async fn active_lessons<C: ConnectionTrait>(
    &self,
    conn: &C,
    course_id: Uuid,
  ) -> Result<Vec<Uuid>> {
    self
      .db
      .run(
        lesson::Entity::find()
          .select_only()
          .column(lesson::Column::Id)
          .filter(lesson::Column::CourseId.eq(course_id))
          .filter(lesson::Column::IsActive.eq(true))
          .into_tuple::<Uuid>()
          .all(conn),
      )
      .await
  }

  async fn completed_lessons<C: ConnectionTrait>(
    &self,
    conn: &C,
    talent_id: Uuid,
    course_id: Uuid,
  ) -> Result<Vec<Uuid>> {
    self
      .db
      .run(
        lesson_progress::Entity::find()
          .select_only()
          .column(lesson_progress::Column::LessonId)
          .filter(lesson_progress::Column::TalentId.eq(talent_id))
          .filter(lesson_progress::Column::CourseId.eq(course_id))
          .filter(lesson_progress::Column::IsCompleted.eq(true))
          .into_tuple::<Uuid>()
          .all(conn),
      )
      .await
  }

  async fn compute_in<C: ConnectionTrait>(
    &self,
    conn: &C,
    talent_id: Uuid,
    course_id: Uuid,
  ) -> Result<CourseCompletion> {
    let (active, completed) = futures::try_join!(
      self.active_lessons(conn, course_id),
      self.completed_lessons(conn, talent_id, course_id),
    )?;

    let active: HashSet<Uuid> = active.into_iter().collect();
    let done = completed.iter().filter(|id| active.contains(id)).count();

    Ok(CourseCompletion::compute(done, active.len()))
  }

  /// Completion of every course with active lessons, from raw lesson rows.
  pub async fn completions(
    &self,
    talent_id: Uuid,
  ) -> Result<HashMap<Uuid, CourseCompletion>> {
    let (active, completed) = futures::try_join!(
      self.db.run(
        lesson::Entity::find()
          .select_only()
          .column(lesson::Column::Id)
          .column(lesson::Column::CourseId)
          .filter(lesson::Column::IsActive.eq(true))
          .into_tuple::<(Uuid, Uuid)>()
          .all(self.db.conn),
      ),
      self.db.run(
        lesson_progress::Entity::find()
          .select_only()
          .column(lesson_progress::Column::LessonId)
          .filter(lesson_progress::Column::TalentId.eq(talent_id))
          .filter(lesson_progress::Column::IsCompleted.eq(true))
          .into_tuple::<Uuid>()
          .all(self.db.conn),
      ),
    )?;

    let completed: HashSet<Uuid> = completed.into_iter().collect();
    let mut counts: HashMap<Uuid, (usize, usize)> = HashMap::new();
    for (lesson_id, course_id) in active {
      let (done, total) = counts.entry(course_id).or_default();
      *total += 1;
      if completed.contains(&lesson_id) {
        *done += 1;
      }
    }

    Ok(
      counts
        .into_iter()
        .map(|(course_id, (done, total))| {
          (course_id, CourseCompletion::compute(done, total))
        })
        .collect(),
    )
  }

  /// Recomputes and stores the talent's progress for a course they can
  /// currently open.
  pub async fn recompute(
    &self,
    talent_id: Uuid,
    course_id: Uuid,
  ) -> Result<CourseCompletion> {
    Access::new(self.db).authorize(talent_id, course_id).await?;
    self.refresh(talent_id, course_id).await
  }

  fn write_failed(course_id: Uuid, err: Error) -> Error {
    error!("Progress write failed for course {course_id}: {err}");
    Error::ProgressWriteFailed { course: course_id, reason: err.to_string() }
  }

  // Every write transaction opens with a write statement, so SQLite hands
  // out the write lock before anything is read and concurrent recomputes of
  // one course run one after another on fresh rows.

  async fn refresh(
    &self,
    talent_id: Uuid,
    course_id: Uuid,
  ) -> Result<CourseCompletion> {
    let txn = self.db.run(self.db.conn.begin()).await?;

    self
      .db
      .run(
        talent_course::Entity::update_many()
          .col_expr(
            talent_course::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
          )
          .filter(talent_course::Column::TalentId.eq(talent_id))
          .filter(talent_course::Column::CourseId.eq(course_id))
          .exec(&txn),
      )
      .await
      .map_err(|err| Self::write_failed(course_id, err))?;

    let completion = self.sync(&txn, talent_id, course_id).await?;
    self.commit(txn, course_id).await?;
    Ok(completion)
  }

  async fn sync(
    &self,
    txn: &DatabaseTransaction,
    talent_id: Uuid,
    course_id: Uuid,
  ) -> Result<CourseCompletion> {
    let completion = self.compute_in(txn, talent_id, course_id).await?;
    self
      .upsert(txn, talent_id, course_id, &completion)
      .await
      .map_err(|err| Self::write_failed(course_id, err))?;
    Ok(completion)
  }

  async fn commit(&self, txn: DatabaseTransaction, course_id: Uuid) -> Result<()> {
    self
      .db
      .run(txn.commit())
      .await
      .map_err(|err| Self::write_failed(course_id, err))
  }

  /// Stores a computed completion. An existing row is always updated; a
  /// new one is inserted only once there is progress to record.
  async fn upsert(
    &self,
    txn: &DatabaseTransaction,
    talent_id: Uuid,
    course_id: Uuid,
    completion: &CourseCompletion,
  ) -> Result<Option<talent_course::Model>> {
    let now = Utc::now().naive_utc();
    let done = completion.status == ProgressStatus::Completed;

    let existing = self
      .db
      .run(talent_course::Entity::find_by_id((talent_id, course_id)).one(txn))
      .await?;
    if existing.is_none() && completion.percentage == 0 {
      return Ok(None);
    }

    let completed_at = match existing {
      Some(row) if done => row.completed_at.or(Some(now)),
      _ => done.then_some(now),
    };
    let row = talent_course::ActiveModel {
      talent_id: Set(talent_id),
      course_id: Set(course_id),
      progress_percentage: Set(completion.percentage),
      status: Set(completion.status),
      started_at: Set(now),
      completed_at: Set(completed_at),
      updated_at: Set(now),
    };

    let model = self
      .db
      .run(
        talent_course::Entity::insert(row)
          .on_conflict(
            OnConflict::columns([
              talent_course::Column::TalentId,
              talent_course::Column::CourseId,
            ])
            .update_columns([
              talent_course::Column::ProgressPercentage,
              talent_course::Column::Status,
              talent_course::Column::CompletedAt,
              talent_course::Column::UpdatedAt,
            ])
            .to_owned(),
          )
          .exec_with_returning(txn),
      )
      .await?;

    debug!(
      "Course {course_id} progress for talent {talent_id}: {}%",
      model.progress_percentage
    );
    Ok(Some(model))
  }

  /// Marks a lesson done (or not done) and recomputes its course. Both
  /// writes commit together and store absolute values, so a retry is safe.
  pub async fn set_lesson_completed(
    &self,
    talent_id: Uuid,
    lesson_id: Uuid,
    completed: bool,
  ) -> Result<CourseCompletion> {
    let lesson = Catalog::new(self.db)
      .lesson(lesson_id)
      .await?
      .filter(|lesson| lesson.is_active)
      .ok_or(Error::LessonNotFound)?;
    let course_id = lesson.course_id;

    Access::new(self.db).authorize(talent_id, course_id).await?;

    let now = Utc::now().naive_utc();
    let row = lesson_progress::ActiveModel {
      talent_id: Set(talent_id),
      lesson_id: Set(lesson_id),
      course_id: Set(course_id),
      is_completed: Set(completed),
      completed_at: Set(completed.then_some(now)),
      updated_at: Set(now),
    };

    let txn = self.db.run(self.db.conn.begin()).await?;
    self
      .db
      .run(
        lesson_progress::Entity::insert(row)
          .on_conflict(
            OnConflict::columns([
              lesson_progress::Column::TalentId,
              lesson_progress::Column::LessonId,
            ])
            .update_columns([
              lesson_progress::Column::IsCompleted,
              lesson_progress::Column::CompletedAt,
              lesson_progress::Column::UpdatedAt,
            ])
            .to_owned(),
          )
          .exec(&txn),
      )
      .await
      .map_err(|err| Self::write_failed(course_id, err))?;

    let completion = self.sync(&txn, talent_id, course_id).await?;
    self.commit(txn, course_id).await?;
    Ok(completion)
  }

  /// Recomputes every stored row of a course after its lessons changed.
  /// Talents who lost access keep their frozen row. A failure for one
  /// talent is logged and does not stop the others.
  pub async fn refresh_course(&self, course_id: Uuid) -> Result<RefreshReport> {
    let talents = self
      .db
      .run(
        talent_course::Entity::find()
          .select_only()
          .column(talent_course::Column::TalentId)
          .filter(talent_course::Column::CourseId.eq(course_id))
          .into_tuple::<Uuid>()
          .all(self.db.conn),
      )
      .await?;

    let access = Access::new(self.db);
    let mut report = RefreshReport::default();
    for talent_id in talents {
      let result = match access.load(talent_id).await {
        Ok(entitlement) if entitlement.has_access(course_id) => {
          self.refresh(talent_id, course_id).await.map(|_| true)
        }
        Ok(_) => Ok(false),
        Err(err) => Err(err),
      };

      match result {
        Ok(true) => report.refreshed += 1,
        Ok(false) => report.skipped += 1,
        Err(err) => {
          warn!("Could not refresh course {course_id} for talent {talent_id}: {err}");
          report.failed += 1;
        }
      }
    }
    Ok(report)
  }

  /// Course state as the talent sees it. Courses they cannot open show no
  /// progress, whatever rows are left from before.
  fn state_of(
    entitlement: &Entitlement,
    course_id: Uuid,
    completions: &HashMap<Uuid, CourseCompletion>,
  ) -> CourseState {
    let accessible = entitlement.has_access(course_id);
    match completions.get(&course_id) {
      Some(completion) if accessible => CourseState {
        accessible,
        percentage: completion.percentage,
        status: completion.status,
      },
      _ => CourseState { accessible, ..CourseState::default() },
    }
  }

  /// Catalog listing with lock flags and progress merged in.
  pub async fn courses(
    &self,
    talent_id: Uuid,
    entitlement: &Entitlement,
  ) -> Result<Vec<CourseCard>> {
    let catalog = Catalog::new(self.db);
    let (courses, gates, completions) = futures::try_join!(
      catalog.courses(),
      catalog.gates(),
      self.completions(talent_id),
    )?;

    let cards = courses
      .into_iter()
      .map(|course| {
        let state = Self::state_of(entitlement, course.id, &completions);
        let required = gates
          .get(&course.id)
          .and_then(|codes| package::cheapest(codes.iter().map(String::as_str)));

        CourseCard {
          id: course.id,
          level_id: course.level_id,
          total_lessons: completions
            .get(&course.id)
            .map_or(0, |completion| completion.total_lessons),
          locked: !state.accessible,
          required_package: required.map(|code| code.info()),
          progress_percentage: state.percentage,
          status: state.status,
          title: course.title,
          description: course.description,
        }
      })
      .collect();

    Ok(cards)
  }

  /// Course page: lessons in order with the talent's completion flags.
  pub async fn course_detail(
    &self,
    talent_id: Uuid,
    course_id: Uuid,
    entitlement: &Entitlement,
  ) -> Result<CourseDetail> {
    let catalog = Catalog::new(self.db);
    let course = catalog
      .course(course_id)
      .await?
      .filter(|course| course.is_active)
      .ok_or(Error::CourseNotFound)?;

    if !entitlement.has_access(course_id) {
      return Err(Access::new(self.db).denial(course_id).await);
    }

    let (lessons, completed) = futures::try_join!(
      catalog.lessons(course_id),
      self.completed_lessons(self.db.conn, talent_id, course_id),
    )?;

    let completed: HashSet<Uuid> = completed.into_iter().collect();
    let lessons: Vec<_> = lessons
      .into_iter()
      .map(|lesson| LessonView {
        is_completed: completed.contains(&lesson.id),
        id: lesson.id,
        title: lesson.title,
        description: lesson.description,
        video_url: lesson.video_url,
        order_index: lesson.order_index,
      })
      .collect();

    let done = lessons.iter().filter(|l| l.is_completed).count();
    let progress = CourseCompletion::compute(done, lessons.len());

    Ok(CourseDetail { course, lessons, progress })
  }

  /// Training levels in order with per-level progress over the courses the
  /// talent can open.
  pub async fn journey(
    &self,
    talent_id: Uuid,
    entitlement: &Entitlement,
  ) -> Result<Vec<JourneyLevel>> {
    let catalog = Catalog::new(self.db);
    let (levels, courses, completions) = futures::try_join!(
      catalog.levels(),
      catalog.courses(),
      self.completions(talent_id),
    )?;

    let mut by_level: HashMap<Uuid, Vec<CourseState>> = HashMap::new();
    for course in &courses {
      if let Some(level_id) = course.level_id {
        by_level
          .entry(level_id)
          .or_default()
          .push(Self::state_of(entitlement, course.id, &completions));
      }
    }

    let mut current_found = false;
    let journey = levels
      .into_iter()
      .map(|level| {
        let states = by_level.remove(&level.id).unwrap_or_default();
        let progress = LevelProgress::aggregate(&states);

        let is_current = !current_found
          && progress.accessible_count > 0
          && progress.status != ProgressStatus::Completed;
        current_found |= is_current;

        JourneyLevel {
          id: level.id,
          code: level.code,
          name: level.name,
          short_name: level.short_name,
          order_index: level.order_index,
          progress,
          is_current,
        }
      })
      .collect();

    Ok(journey)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    package::PackageCode,
    sv::{Talent, testing::*},
  };

  async fn stored_row(
    db: &DatabaseConnection,
    talent: Uuid,
    course: Uuid,
  ) -> Option<talent_course::Model> {
    talent_course::Entity::find_by_id((talent, course)).one(db).await.unwrap()
  }

  #[tokio::test]
  async fn test_four_lesson_course() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 4).await;

    let first = sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();
    assert_eq!(first.percentage, 25);
    assert_eq!(first.status, ProgressStatus::InProgress);

    for &lesson in &lessons[1..] {
      sv.set_lesson_completed(talent, lesson, true).await.unwrap();
    }

    let row = stored_row(&db, talent, course).await.unwrap();
    assert_eq!(row.progress_percentage, 100);
    assert_eq!(row.status, ProgressStatus::Completed);
    assert!(row.completed_at.is_some());
  }

  #[tokio::test]
  async fn test_recompute_is_idempotent() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 3).await;

    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();
    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();

    let a = sv.recompute(talent, course).await.unwrap();
    let b = sv.recompute(talent, course).await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a.percentage, 33);
    assert_eq!(stored_row(&db, talent, course).await.unwrap().progress_percentage, 33);
  }

  #[tokio::test]
  async fn test_uncompleting_lowers_progress() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 4).await;

    for &lesson in &lessons {
      sv.set_lesson_completed(talent, lesson, true).await.unwrap();
    }
    let after = sv.set_lesson_completed(talent, lessons[3], false).await.unwrap();
    assert_eq!(after.percentage, 75);
    assert_eq!(after.status, ProgressStatus::InProgress);

    let row = stored_row(&db, talent, course).await.unwrap();
    assert_eq!(row.status, ProgressStatus::InProgress);
    assert!(row.completed_at.is_none());

    for &lesson in &lessons[..3] {
      sv.set_lesson_completed(talent, lesson, false).await.unwrap();
    }
    let row = stored_row(&db, talent, course).await.unwrap();
    assert_eq!(row.progress_percentage, 0);
    assert_eq!(row.status, ProgressStatus::NotStarted);
  }

  #[tokio::test]
  async fn test_inactive_lessons_are_not_counted() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 4).await;

    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();
    sv.set_lesson_completed(talent, lessons[1], true).await.unwrap();
    Catalog::new(Db::new(&db)).set_lesson_active(lessons[1], false).await.unwrap();

    let completion = sv.recompute(talent, course).await.unwrap();
    assert_eq!(completion.completed_lessons, 1);
    assert_eq!(completion.total_lessons, 3);
    assert_eq!(completion.percentage, 33);

    assert!(matches!(
      sv.set_lesson_completed(talent, lessons[1], true).await,
      Err(Error::LessonNotFound)
    ));
  }

  #[tokio::test]
  async fn test_refresh_course_after_lesson_changes() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let catalog = Catalog::new(Db::new(&db));
    let reader = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 2).await;

    sv.set_lesson_completed(reader, lessons[0], true).await.unwrap();
    assert_eq!(stored_row(&db, reader, course).await.unwrap().progress_percentage, 50);

    catalog.set_lesson_active(lessons[1], false).await.unwrap();
    let report = sv.refresh_course(course).await.unwrap();
    assert_eq!(report, RefreshReport { refreshed: 1, ..Default::default() });

    let row = stored_row(&db, reader, course).await.unwrap();
    assert_eq!(row.progress_percentage, 100);
    assert_eq!(row.status, ProgressStatus::Completed);

    Talent::new(Db::new(&db)).revoke_package(reader, None).await.unwrap();
    catalog.create_lesson(course, "Extra".into(), 9).await.unwrap();
    let report = sv.refresh_course(course).await.unwrap();
    assert_eq!(report, RefreshReport { skipped: 1, ..Default::default() });
    assert_eq!(stored_row(&db, reader, course).await.unwrap().progress_percentage, 100);
  }

  #[tokio::test]
  async fn test_refresh_course_continues_past_failures() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let first = talent_with(&db, PackageCode::Start).await;
    let second = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 2).await;

    sv.set_lesson_completed(first, lessons[0], true).await.unwrap();
    sv.set_lesson_completed(second, lessons[0], true).await.unwrap();

    drop_table(&db, "lesson_progress").await;

    let report = sv.refresh_course(course).await.unwrap();
    assert_eq!(report, RefreshReport { failed: 2, ..Default::default() });
    assert_eq!(stored_row(&db, first, course).await.unwrap().progress_percentage, 50);
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn test_concurrent_completions_keep_both() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir.path().join("progress.db")).await;
    let sv = Progress::new(Db::new(&db));

    for _ in 0..5 {
      let talent = talent_with(&db, PackageCode::Start).await;
      let (course, lessons) = course(&db, None, &[PackageCode::Start], 4).await;

      let (a, b) = tokio::join!(
        sv.set_lesson_completed(talent, lessons[0], true),
        sv.set_lesson_completed(talent, lessons[1], true),
      );
      let mut seen = [a.unwrap().percentage, b.unwrap().percentage];
      seen.sort();
      assert_eq!(seen, [25, 50]);

      let row = stored_row(&db, talent, course).await.unwrap();
      assert_eq!(row.progress_percentage, 50);
      assert_eq!(row.status, ProgressStatus::InProgress);
    }
  }

  #[tokio::test]
  async fn test_listings_follow_lesson_rows() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let level = Catalog::new(Db::new(&db))
      .create_level("new_face".into(), "New Face".into(), 1)
      .await
      .unwrap();
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, Some(level.id), &[PackageCode::Start], 4).await;

    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();
    // a lesson row written without the course row following it
    lesson_progress::ActiveModel {
      talent_id: Set(talent),
      lesson_id: Set(lessons[1]),
      course_id: Set(course),
      is_completed: Set(true),
      completed_at: Set(Some(Utc::now().naive_utc())),
      updated_at: Set(Utc::now().naive_utc()),
    }
    .insert(&db)
    .await
    .unwrap();
    assert_eq!(stored_row(&db, talent, course).await.unwrap().progress_percentage, 25);

    let entitlement = Access::new(Db::new(&db)).load(talent).await.unwrap();
    let cards = sv.courses(talent, &entitlement).await.unwrap();
    let journey = sv.journey(talent, &entitlement).await.unwrap();
    let detail = sv.course_detail(talent, course, &entitlement).await.unwrap();

    assert_eq!(cards[0].progress_percentage, 50);
    assert_eq!(cards[0].total_lessons, 4);
    assert_eq!(journey[0].progress.percentage, 50);
    assert_eq!(detail.progress.percentage, 50);
  }

  #[tokio::test]
  async fn test_locked_course_accrues_nothing() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent(&db).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 2).await;

    assert!(matches!(
      sv.set_lesson_completed(talent, lessons[0], true).await,
      Err(Error::CourseLocked { .. })
    ));
    assert!(matches!(
      sv.recompute(talent, course).await,
      Err(Error::CourseLocked { .. })
    ));
    assert!(lesson_progress::Entity::find().all(&db).await.unwrap().is_empty());
    assert!(stored_row(&db, talent, course).await.is_none());
  }

  #[tokio::test]
  async fn test_downgrade_freezes_progress() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Advanced).await;
    let (course, lessons) =
      course(&db, None, &[PackageCode::Advanced, PackageCode::Premium], 2).await;

    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();
    Talent::new(Db::new(&db))
      .assign_package(talent, PackageCode::Start, None)
      .await
      .unwrap();

    assert!(matches!(
      sv.set_lesson_completed(talent, lessons[1], true).await,
      Err(Error::CourseLocked { .. })
    ));
    assert_eq!(stored_row(&db, talent, course).await.unwrap().progress_percentage, 50);

    let entitlement = Access::new(Db::new(&db)).load(talent).await.unwrap();
    let cards = sv.courses(talent, &entitlement).await.unwrap();
    assert!(cards[0].locked);
    assert_eq!(cards[0].progress_percentage, 0);
    assert_eq!(cards[0].required_package.map(|p| p.code), Some(PackageCode::Advanced));
  }

  #[tokio::test]
  async fn test_failed_fetch_keeps_stored_progress() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 2).await;

    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();
    let before = stored_row(&db, talent, course).await.unwrap();

    drop_table(&db, "lesson_progress").await;

    assert!(matches!(sv.recompute(talent, course).await, Err(Error::Database(_))));
    assert_eq!(stored_row(&db, talent, course).await.unwrap(), before);
  }

  #[tokio::test]
  async fn test_failed_write_is_reported() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 2).await;

    drop_table(&db, "talent_courses").await;

    assert!(matches!(
      sv.set_lesson_completed(talent, lessons[0], true).await,
      Err(Error::ProgressWriteFailed { course: id, .. }) if id == course
    ));
  }

  #[tokio::test]
  async fn test_level_averages_accessible_courses_only() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let catalog = Catalog::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;

    let new_face = catalog.create_level("new_face".into(), "New Face".into(), 1).await.unwrap();
    let top = catalog.create_level("top".into(), "Top Talent".into(), 2).await.unwrap();

    let (_, lessons) = course(&db, Some(new_face.id), &[PackageCode::Start], 2).await;
    course(&db, Some(new_face.id), &[PackageCode::Premium], 2).await;
    course(&db, Some(new_face.id), &[PackageCode::Premium], 2).await;
    course(&db, Some(top.id), &[PackageCode::Premium], 1).await;

    sv.set_lesson_completed(talent, lessons[0], true).await.unwrap();

    let entitlement = Access::new(Db::new(&db)).load(talent).await.unwrap();
    let journey = sv.journey(talent, &entitlement).await.unwrap();

    assert_eq!(journey.len(), 2);
    assert_eq!(journey[0].code, "new_face");
    assert_eq!(journey[0].progress.percentage, 50);
    assert_eq!(journey[0].progress.status, ProgressStatus::InProgress);
    assert_eq!(journey[0].progress.locked_count, 2);
    assert!(journey[0].is_current);

    assert_eq!(journey[1].progress.accessible_count, 0);
    assert_eq!(journey[1].progress.percentage, 0);
    assert_eq!(journey[1].progress.status, ProgressStatus::NotStarted);
    assert!(!journey[1].is_current);
  }

  #[tokio::test]
  async fn test_course_detail_requires_access() {
    let db = setup_test_db().await;
    let sv = Progress::new(Db::new(&db));
    let talent = talent_with(&db, PackageCode::Start).await;
    let (open, lessons) = course(&db, None, &[PackageCode::Start], 2).await;
    let (locked, _) = course(&db, None, &[PackageCode::Premium], 2).await;

    sv.set_lesson_completed(talent, lessons[1], true).await.unwrap();
    let entitlement = Access::new(Db::new(&db)).load(talent).await.unwrap();

    let detail = sv.course_detail(talent, open, &entitlement).await.unwrap();
    let flags: Vec<_> = detail.lessons.iter().map(|l| l.is_completed).collect();
    assert_eq!(flags, [false, true]);
    assert_eq!(detail.progress.percentage, 50);

    assert!(matches!(
      sv.course_detail(talent, locked, &entitlement).await,
      Err(Error::CourseLocked { .. })
    ));
    assert!(matches!(
      sv.course_detail(talent, Uuid::new_v4(), &entitlement).await,
      Err(Error::CourseNotFound)
    ));
  }
}
