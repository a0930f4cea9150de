use sea_orm::sea_query::OnConflict;
use uuid::Uuid;

use super::Db;
use crate::{
  entity::{course, course_package, lesson, training_level},
  package::PackageCode,
  prelude::*,
};

/// Admin-authored catalog: levels, courses, lessons and package gates.
pub struct Catalog<'a> {
  db: Db<'a>,
}

impl<'a> Catalog<'a> {
  pub fn new(db: Db<'a>) -> Self {
    Self { db }
  }

  pub async fn create_level(
    &self,
    code: String,
    name: String,
    order_index: i32,
  ) -> Result<training_level::Model> {
    let level = training_level::ActiveModel {
      id: Set(Uuid::new_v4()),
      code: Set(code),
      name: Set(name),
      short_name: Set(None),
      description: Set(None),
      order_index: Set(order_index),
    };

    self.db.run(level.insert(self.db.conn)).await
  }

  pub async fn levels(&self) -> Result<Vec<training_level::Model>> {
    self
      .db
      .run(
        training_level::Entity::find()
          .order_by_asc(training_level::Column::OrderIndex)
          .all(self.db.conn),
      )
      .await
  }

  pub async fn level_by_code(
    &self,
    code: &str,
  ) -> Result<Option<training_level::Model>> {
    self
      .db
      .run(
        training_level::Entity::find()
          .filter(training_level::Column::Code.eq(code))
          .one(self.db.conn),
      )
      .await
  }

  pub async fn create_course(
    &self,
    level_id: Option<Uuid>,
    title: String,
    description: Option<String>,
  ) -> Result<course::Model> {
    let course = course::ActiveModel {
      id: Set(Uuid::new_v4()),
      level_id: Set(level_id),
      title: Set(title),
      description: Set(description),
      category: Set(None),
      is_active: Set(true),
      created_at: Set(Utc::now().naive_utc()),
    };

    self.db.run(course.insert(self.db.conn)).await
  }

  pub async fn course(&self, id: Uuid) -> Result<Option<course::Model>> {
    self.db.run(course::Entity::find_by_id(id).one(self.db.conn)).await
  }

  /// Active courses, oldest first.
  pub async fn courses(&self) -> Result<Vec<course::Model>> {
    self
      .db
      .run(
        course::Entity::find()
          .filter(course::Column::IsActive.eq(true))
          .order_by_asc(course::Column::CreatedAt)
          .all(self.db.conn),
      )
      .await
  }

  pub async fn set_course_active(&self, id: Uuid, active: bool) -> Result<()> {
    let course = self.course(id).await?.ok_or(Error::CourseNotFound)?;

    let update =
      course::ActiveModel { is_active: Set(active), ..course.into() };
    self.db.run(update.update(self.db.conn)).await?;
    Ok(())
  }

  pub async fn create_lesson(
    &self,
    course_id: Uuid,
    title: String,
    order_index: i32,
  ) -> Result<lesson::Model> {
    self.course(course_id).await?.ok_or(Error::CourseNotFound)?;

    let lesson = lesson::ActiveModel {
      id: Set(Uuid::new_v4()),
      course_id: Set(course_id),
      title: Set(title),
      description: Set(None),
      video_url: Set(None),
      order_index: Set(order_index),
      is_active: Set(true),
      created_at: Set(Utc::now().naive_utc()),
    };

    self.db.run(lesson.insert(self.db.conn)).await
  }

  pub async fn lesson(&self, id: Uuid) -> Result<Option<lesson::Model>> {
    self.db.run(lesson::Entity::find_by_id(id).one(self.db.conn)).await
  }

  /// Active lessons of a course in playback order.
  pub async fn lessons(&self, course_id: Uuid) -> Result<Vec<lesson::Model>> {
    self
      .db
      .run(
        lesson::Entity::find()
          .filter(lesson::Column::CourseId.eq(course_id))
          .filter(lesson::Column::IsActive.eq(true))
          .order_by_asc(lesson::Column::OrderIndex)
          .all(self.db.conn),
      )
      .await
  }

  /// Returns the course the lesson belongs to, so callers can recompute it.
  pub async fn set_lesson_active(&self, id: Uuid, active: bool) -> Result<Uuid> {
    let lesson = self.lesson(id).await?.ok_or(Error::LessonNotFound)?;
    let course_id = lesson.course_id;

    let update =
      lesson::ActiveModel { is_active: Set(active), ..lesson.into() };
    self.db.run(update.update(self.db.conn)).await?;
    Ok(course_id)
  }

  /// Offers the course under `code`. Gating twice is a no-op.
  pub async fn gate(&self, course_id: Uuid, code: PackageCode) -> Result<()> {
    self.course(course_id).await?.ok_or(Error::CourseNotFound)?;

    let gate = course_package::ActiveModel {
      course_id: Set(course_id),
      package_code: Set(code.as_str().to_string()),
      created_at: Set(Utc::now().naive_utc()),
    };

    self
      .db
      .run(
        course_package::Entity::insert(gate)
          .on_conflict(
            OnConflict::columns([
              course_package::Column::CourseId,
              course_package::Column::PackageCode,
            ])
            .do_nothing()
            .to_owned(),
          )
          .do_nothing()
          .exec(self.db.conn),
      )
      .await?;
    Ok(())
  }

  /// Returns `false` if the course was not offered under `code`.
  pub async fn ungate(&self, course_id: Uuid, code: PackageCode) -> Result<bool> {
    let result = self
      .db
      .run(
        course_package::Entity::delete_by_id((
          course_id,
          code.as_str().to_string(),
        ))
        .exec(self.db.conn),
      )
      .await?;
    Ok(result.rows_affected > 0)
  }

  /// Raw gate codes per course, unknown codes included.
  pub async fn gates(&self) -> Result<HashMap<Uuid, Vec<String>>> {
    let rows = self
      .db
      .run(
        course_package::Entity::find()
          .select_only()
          .column(course_package::Column::CourseId)
          .column(course_package::Column::PackageCode)
          .into_tuple::<(Uuid, String)>()
          .all(self.db.conn),
      )
      .await?;

    let mut gates: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (course_id, code) in rows {
      gates.entry(course_id).or_default().push(code);
    }
    Ok(gates)
  }

  /// Number of active lessons per course.
  pub async fn lesson_counts(&self) -> Result<HashMap<Uuid, usize>> {
    let rows = self
      .db
      .run(
        lesson::Entity::find()
          .select_only()
          .column(lesson::Column::CourseId)
          .filter(lesson::Column::IsActive.eq(true))
          .into_tuple::<Uuid>()
          .all(self.db.conn),
      )
      .await?;

    let mut counts = HashMap::new();
    for course_id in rows {
      *counts.entry(course_id).or_insert(0) += 1;
    }
    Ok(counts)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sv::testing::*;

  #[tokio::test]
  async fn test_levels_are_ordered() {
    let db = setup_test_db().await;
    let sv = Catalog::new(Db::new(&db));

    sv.create_level("top".into(), "Top Talent".into(), 3).await.unwrap();
    sv.create_level("new_face".into(), "New Face".into(), 1).await.unwrap();

    let names: Vec<_> =
      sv.levels().await.unwrap().into_iter().map(|l| l.name).collect();
    assert_eq!(names, ["New Face", "Top Talent"]);
    assert!(sv.level_by_code("top").await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_gate_is_idempotent() {
    let db = setup_test_db().await;
    let sv = Catalog::new(Db::new(&db));
    let (course, _) = course(&db, None, &[], 0).await;

    sv.gate(course, PackageCode::Advanced).await.unwrap();
    sv.gate(course, PackageCode::Advanced).await.unwrap();
    sv.gate(course, PackageCode::Premium).await.unwrap();

    let gates = sv.gates().await.unwrap();
    assert_eq!(gates[&course].len(), 2);

    assert!(sv.ungate(course, PackageCode::Advanced).await.unwrap());
    assert!(!sv.ungate(course, PackageCode::Advanced).await.unwrap());
    assert_eq!(sv.gates().await.unwrap()[&course], ["premium"]);
  }

  #[tokio::test]
  async fn test_gate_unknown_course() {
    let db = setup_test_db().await;
    let sv = Catalog::new(Db::new(&db));

    let result = sv.gate(Uuid::new_v4(), PackageCode::Start).await;
    assert!(matches!(result, Err(Error::CourseNotFound)));
  }

  #[tokio::test]
  async fn test_inactive_lessons_are_hidden() {
    let db = setup_test_db().await;
    let sv = Catalog::new(Db::new(&db));
    let (course, lessons) = course(&db, None, &[PackageCode::Start], 3).await;

    let owner = sv.set_lesson_active(lessons[1], false).await.unwrap();
    assert_eq!(owner, course);

    let visible: Vec<_> =
      sv.lessons(course).await.unwrap().into_iter().map(|l| l.id).collect();
    assert_eq!(visible, [lessons[0], lessons[2]]);
    assert_eq!(sv.lesson_counts().await.unwrap()[&course], 2);
  }
}
