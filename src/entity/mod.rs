//! SeaORM entities for the talent hub schema.
//!
//! Package codes are stored as plain text and parsed by the service layer,
//! so a row with an out-of-catalog code can be detected and skipped instead
//! of failing the whole query.

pub mod course;
pub mod course_package;
pub mod lesson;
pub mod lesson_progress;
pub mod package_change;
pub mod talent;
pub mod talent_course;
pub mod talent_package;
pub mod training_level;

pub use talent_course::ProgressStatus;
