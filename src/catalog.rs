use std::ops::Index;

use serde::Serialize;

use super::{
  RecommendationList,
  types::CourseId
};

#[derive(Debug, Clone, Serialize)]
pub struct Course {
  pub id: CourseId,
  pub name: String,
  pub description: String
}

impl Course {
  pub fn new(id: CourseId, name: impl Into<String>, description: impl Into<String>) -> Self {
    Self { id, name: name.into(), description: description.into() }
  }
}

/// Static course catalog, immutable for the lifetime of a session.
#[derive(Debug, Default)]
pub struct Catalog {
  courses: Vec<Course>
}

impl Catalog {
  pub fn new(courses: Vec<Course>) -> Self {
    Self { courses }
  }

  pub fn get(&self, id: CourseId) -> Option<&Course> {
    self.courses.iter().find(|course| course.id == id)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Course> {
    self.courses.iter()
  }

  pub fn len(&self) -> usize {
    self.courses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.courses.is_empty()
  }

  /// Join a ranked list against the catalog, yielding the id/name pairs
  /// the presentation layer displays. Ids in the list must exist.
  pub fn resolve(&self, recs: &RecommendationList<CourseId>) -> Vec<(CourseId, String)> {
    recs.ids()
      .map(|&id| (id, self[id].name.clone()))
      .collect()
  }
}

impl Index<CourseId> for Catalog {
  type Output = Course;

  // A missing id is a caller bug, not a runtime condition.
  fn index(&self, id: CourseId) -> &Course {
    self.get(id)
      .unwrap_or_else(|| panic!("course {id} missing from catalog"))
  }
}
