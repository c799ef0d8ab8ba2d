use rand::Rng;
use serde::Serialize;
use tracing::debug;

use super::types::CourseId;

#[derive(Debug, Clone, Serialize)]
pub struct Rating {
  pub user_id: String,
  pub course_id: CourseId,
  pub score: u8
}

/// A user profile used to seed synthetic ratings at session start.
#[derive(Debug, Clone)]
pub struct UserProfile {
  pub user_id: String,
  pub seen_courses: Vec<CourseId>
}

impl UserProfile {
  pub fn new(user_id: impl Into<String>, seen_courses: Vec<CourseId>) -> Self {
    Self { user_id: user_id.into(), seen_courses }
  }
}

/// In-memory store of (user, course, score) triples. Insertion order is
/// preserved and defines the rating-matrix row order. Scores are expected
/// to lie in [1, 5]; validation is the caller's job.
#[derive(Debug, Default)]
pub struct RatingStore {
  ratings: Vec<Rating>
}

impl RatingStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seed one rating per (profile, seen course) pair, with scores drawn
  /// uniformly from 1..=5 out of the injected source.
  pub fn seed_from_profiles<R>(profiles: &[UserProfile], rng: &mut R) -> Self
    where R: Rng {
    let mut store = Self::new();
    for profile in profiles {
      for &course_id in &profile.seen_courses {
        store.submit(&profile.user_id, course_id, rng.gen_range(1..=5));
      }
    }
    debug!("Seeded {} ratings from {} profiles", store.len(), profiles.len());
    store
  }

  /// Upsert: a rating for an existing (user, course) pair overwrites the
  /// prior score, otherwise a new row is appended.
  pub fn submit(&mut self, user_id: &str, course_id: CourseId, score: u8) {
    match self.ratings.iter_mut()
      .find(|r| r.user_id == user_id && r.course_id == course_id) {
      Some(existing) => existing.score = score,
      None => self.ratings.push(Rating {
        user_id: user_id.to_owned(),
        course_id,
        score
      })
    }
  }

  pub fn ratings(&self) -> &[Rating] {
    &self.ratings
  }

  pub fn rating_for(&self, user_id: &str, course_id: CourseId) -> Option<u8> {
    self.ratings.iter()
      .find(|r| r.user_id == user_id && r.course_id == course_id)
      .map(|r| r.score)
  }

  pub fn courses_rated_by(&self, user_id: &str) -> Vec<CourseId> {
    self.ratings.iter()
      .filter(|r| r.user_id == user_id)
      .map(|r| r.course_id)
      .collect()
  }

  pub fn contains_user(&self, user_id: &str) -> bool {
    self.ratings.iter().any(|r| r.user_id == user_id)
  }

  /// User ids in first-seen order, each once.
  pub fn users(&self) -> Vec<&str> {
    let mut users: Vec<&str> = Vec::new();
    for rating in &self.ratings {
      if !users.contains(&rating.user_id.as_str()) {
        users.push(&rating.user_id);
      }
    }
    users
  }

  /// Distinct course ids in ascending order.
  pub fn courses(&self) -> Vec<CourseId> {
    let mut courses: Vec<CourseId> = Vec::new();
    for rating in &self.ratings {
      if !courses.contains(&rating.course_id) {
        courses.push(rating.course_id);
      }
    }
    courses.sort_unstable();
    courses
  }

  pub fn len(&self) -> usize {
    self.ratings.len()
  }

  pub fn is_empty(&self) -> bool {
    self.ratings.is_empty()
  }
}
