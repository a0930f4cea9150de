use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  package::{self, Entitlement, PackageInfo},
  prelude::*,
  progress::CourseCompletion,
  state::AppState,
  sv::progress::{CourseCard, CourseDetail, JourneyLevel},
};

#[derive(Debug, Serialize)]
pub struct EntitlementRes {
  pub talent_id: Uuid,
  pub package: Option<PackageInfo>,
  pub upgrade: Option<PackageInfo>,
  pub unlocked_courses: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CoursesRes {
  pub package: Option<PackageInfo>,
  /// Set when the entitlement could not be loaded and every course is
  /// shown locked.
  pub degraded: bool,
  pub courses: Vec<CourseCard>,
}

#[derive(Debug, Serialize)]
pub struct JourneyRes {
  pub degraded: bool,
  pub levels: Vec<JourneyLevel>,
}

pub async fn health() -> &'static str {
  "OK"
}

pub async fn packages() -> Json<Vec<PackageInfo>> {
  Json(package::catalog())
}

async fn ensure_talent(app: &AppState, talent_id: Uuid) -> Result<()> {
  app.sv().talent.by_id(talent_id).await?.ok_or(Error::TalentNotFound)?;
  Ok(())
}

/// Listing pages stay usable when the entitlement backend is down: every
/// course is rendered locked instead.
async fn entitlement_or_locked(
  app: &AppState,
  talent_id: Uuid,
) -> (Entitlement, bool) {
  match app.entitlement(talent_id).await {
    Ok(entitlement) => (entitlement, false),
    Err(err) => {
      warn!("Serving locked catalog to {talent_id}: {err}");
      (Entitlement::none(), true)
    }
  }
}

pub async fn entitlement(
  State(app): State<Arc<AppState>>,
  Path(talent_id): Path<Uuid>,
) -> Result<Json<EntitlementRes>> {
  ensure_talent(&app, talent_id).await?;
  let entitlement = app.entitlement(talent_id).await?;

  let mut unlocked_courses: Vec<Uuid> =
    entitlement.unlocked.iter().copied().collect();
  unlocked_courses.sort();

  Ok(Json(EntitlementRes {
    talent_id,
    package: entitlement.package.map(|code| code.info()),
    upgrade: entitlement.upgrade(),
    unlocked_courses,
  }))
}

pub async fn courses(
  State(app): State<Arc<AppState>>,
  Path(talent_id): Path<Uuid>,
) -> Result<Json<CoursesRes>> {
  ensure_talent(&app, talent_id).await?;
  let (entitlement, degraded) = entitlement_or_locked(&app, talent_id).await;
  let courses = app.sv().progress.courses(talent_id, &entitlement).await?;

  Ok(Json(CoursesRes {
    package: entitlement.package.map(|code| code.info()),
    degraded,
    courses,
  }))
}

pub async fn course(
  State(app): State<Arc<AppState>>,
  Path((talent_id, course_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CourseDetail>> {
  ensure_talent(&app, talent_id).await?;
  let entitlement = app.entitlement(talent_id).await?;
  let detail =
    app.sv().progress.course_detail(talent_id, course_id, &entitlement).await?;
  Ok(Json(detail))
}

pub async fn complete_lesson(
  State(app): State<Arc<AppState>>,
  Path((talent_id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CourseCompletion>> {
  set_lesson(&app, talent_id, lesson_id, true).await
}

pub async fn uncomplete_lesson(
  State(app): State<Arc<AppState>>,
  Path((talent_id, lesson_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CourseCompletion>> {
  set_lesson(&app, talent_id, lesson_id, false).await
}

async fn set_lesson(
  app: &AppState,
  talent_id: Uuid,
  lesson_id: Uuid,
  completed: bool,
) -> Result<Json<CourseCompletion>> {
  ensure_talent(app, talent_id).await?;
  let completion = app
    .sv()
    .progress
    .set_lesson_completed(talent_id, lesson_id, completed)
    .await?;
  Ok(Json(completion))
}

pub async fn journey(
  State(app): State<Arc<AppState>>,
  Path(talent_id): Path<Uuid>,
) -> Result<Json<JourneyRes>> {
  ensure_talent(&app, talent_id).await?;
  let (entitlement, degraded) = entitlement_or_locked(&app, talent_id).await;
  let levels = app.sv().progress.journey(talent_id, &entitlement).await?;
  Ok(Json(JourneyRes { degraded, levels }))
}
