use thiserror::Error;

use super::types::CourseId;

#[derive(Debug, Error)]
pub enum RecommendError {
  #[error("no ratings available to fit a model")]
  EmptyRatings,
  #[error("user \"{0}\" not present in the fitted model")]
  UnknownUser(String),
  #[error("course {0} not present in the fitted model")]
  UnknownCourse(CourseId)
}
