//! Package entitlement: which courses a talent may open, and which package
//! would unlock a course they can't.

use std::collections::HashSet;

use uuid::Uuid;

use super::Db;
use crate::{
  entity::{course_package, talent_package},
  package::{self, Entitlement, PackageCode, Requirement},
  prelude::*,
};

pub struct Access<'a> {
  db: Db<'a>,
}

impl<'a> Access<'a> {
  pub fn new(db: Db<'a>) -> Self {
    Self { db }
  }

  /// Loads the talent's package and the courses it unlocks.
  ///
  /// Any backend failure is reported as [`Error::EntitlementLoadFailed`];
  /// callers must treat it as "no access".
  pub async fn load(&self, talent_id: Uuid) -> Result<Entitlement> {
    self.fetch(talent_id).await.map_err(|err| {
      warn!("Entitlement load failed for talent {talent_id}: {err}");
      Error::EntitlementLoadFailed { talent: talent_id, reason: err.to_string() }
    })
  }

  async fn fetch(&self, talent_id: Uuid) -> Result<Entitlement> {
    let Some(row) = self
      .db
      .run(talent_package::Entity::find_by_id(talent_id).one(self.db.conn))
      .await?
    else {
      return Ok(Entitlement::none());
    };

    let code = match row.package_code.parse::<PackageCode>() {
      Ok(code) => code,
      Err(err) => {
        warn!("Talent {talent_id} holds an unusable package: {err}");
        return Ok(Entitlement::none());
      }
    };

    let unlocked = self.unlocked_by(code).await?;
    Ok(Entitlement::new(code, unlocked))
  }

  /// Courses offered under exactly this tier.
  pub async fn unlocked_by(&self, code: PackageCode) -> Result<HashSet<Uuid>> {
    let ids = self
      .db
      .run(
        course_package::Entity::find()
          .select_only()
          .column(course_package::Column::CourseId)
          .filter(course_package::Column::PackageCode.eq(code.as_str()))
          .into_tuple::<Uuid>()
          .all(self.db.conn),
      )
      .await?;

    Ok(ids.into_iter().collect())
  }

  /// Cheapest tier that includes the course. A course with no known gate is
  /// [`Requirement::Unavailable`].
  pub async fn required_package(&self, course_id: Uuid) -> Result<Requirement> {
    let codes = self
      .db
      .run(
        course_package::Entity::find()
          .select_only()
          .column(course_package::Column::PackageCode)
          .filter(course_package::Column::CourseId.eq(course_id))
          .into_tuple::<String>()
          .all(self.db.conn),
      )
      .await?;

    Ok(
      package::cheapest(codes.iter().map(String::as_str))
        .map_or(Requirement::Unavailable, Requirement::Package),
    )
  }

  /// Error explaining why an entitlement does not cover the course.
  pub async fn denial(&self, course_id: Uuid) -> Error {
    match self.required_package(course_id).await {
      Ok(Requirement::Package(code)) => {
        Error::CourseLocked { course: course_id, required: code.info().name.into() }
      }
      Ok(Requirement::Unavailable) => Error::UngatedCourse(course_id),
      Err(err) => {
        warn!("Could not resolve package for course {course_id}: {err}");
        Error::CourseLocked { course: course_id, required: "unknown".into() }
      }
    }
  }

  /// Loads a fresh entitlement and fails unless it covers the course.
  pub async fn authorize(
    &self,
    talent_id: Uuid,
    course_id: Uuid,
  ) -> Result<Entitlement> {
    let entitlement = self.load(talent_id).await?;
    if entitlement.has_access(course_id) {
      Ok(entitlement)
    } else {
      Err(self.denial(course_id).await)
    }
  }
}
