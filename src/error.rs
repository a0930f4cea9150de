//! Error types for the talent hub service

use std::time::Duration;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("Database error: {0}")]
  Database(#[from] sea_orm::DbErr),

  #[error("Backend call timed out after {0:?}")]
  Timeout(Duration),

  #[error("Failed to load entitlement for talent {talent}: {reason}")]
  EntitlementLoadFailed { talent: Uuid, reason: String },

  #[error("Unknown package code `{0}`")]
  UnknownPackage(String),

  #[error("Failed to write progress for course {course}: {reason}")]
  ProgressWriteFailed { course: Uuid, reason: String },

  #[error("Course {0} is not offered in any package")]
  UngatedCourse(Uuid),

  #[error("Course {course} requires the {required} package")]
  CourseLocked { course: Uuid, required: String },

  #[error("Talent not found")]
  TalentNotFound,

  #[error("Course not found")]
  CourseNotFound,

  #[error("Lesson not found")]
  LessonNotFound,

  #[error("Training level not found")]
  LevelNotFound,

  #[error("{0}")]
  InvalidArgs(String),

}

impl Error {
  /// Timeouts and backend hiccups; the caller may retry.
  pub fn is_transient(&self) -> bool {
    matches!(
      self,
      Self::Database(_)
        | Self::Timeout(_)
        | Self::EntitlementLoadFailed { .. }
        | Self::ProgressWriteFailed { .. }
    )
  }

  pub fn user_message(&self) -> String {
    match self {
      Self::Database(_) => "Internal error, try again later".into(),
      Self::Timeout(_) => "Backend is slow to respond, try again".into(),
      Self::EntitlementLoadFailed { .. } => {
        "Could not load package access, try again".into()
      }
      Self::ProgressWriteFailed { .. } => {
        "Progress was not saved, try again".into()
      }
      other => other.to_string(),
    }
  }

  fn status(&self) -> StatusCode {
    match self {
      Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
      Self::EntitlementLoadFailed { .. } | Self::ProgressWriteFailed { .. } => {
        StatusCode::SERVICE_UNAVAILABLE
      }
      Self::UngatedCourse(_) | Self::CourseLocked { .. } => StatusCode::FORBIDDEN,
      Self::TalentNotFound
      | Self::CourseNotFound
      | Self::LessonNotFound
      | Self::LevelNotFound => StatusCode::NOT_FOUND,
      Self::UnknownPackage(_) | Self::InvalidArgs(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!("Request failed: {self}");
    }

    let body = json::json!({
      "success": false,
      "error": self.user_message(),
      "retry": self.is_transient(),
    });

    (status, axum::Json(body)).into_response()
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_mapping() {
    let cases = [
      (Error::Timeout(Duration::from_secs(5)), StatusCode::GATEWAY_TIMEOUT, true),
      (
        Error::Database(sea_orm::DbErr::Custom("gone".into())),
        StatusCode::INTERNAL_SERVER_ERROR,
        true,
      ),
      (
        Error::EntitlementLoadFailed { talent: Uuid::nil(), reason: "down".into() },
        StatusCode::SERVICE_UNAVAILABLE,
        true,
      ),
      (Error::UngatedCourse(Uuid::nil()), StatusCode::FORBIDDEN, false),
      (Error::LessonNotFound, StatusCode::NOT_FOUND, false),
      (Error::UnknownPackage("gold".into()), StatusCode::BAD_REQUEST, false),
    ];

    for (err, status, transient) in cases {
      assert_eq!(err.is_transient(), transient, "{err}");
      assert_eq!(err.into_response().status(), status);
    }
  }

  #[test]
  fn test_backend_details_stay_hidden() {
    let err = Error::Database(sea_orm::DbErr::Custom("no such table".into()));
    assert_eq!(err.user_message(), "Internal error, try again later");
    assert_eq!(Error::TalentNotFound.user_message(), "Talent not found");
  }
}
