use serde::Serialize;

/// Catalog identifier for a course. Seed data uses small 1-based ids.
pub type CourseId = u32;

#[derive(Debug, Clone, Serialize)]
pub struct Recommendation<T> {
  pub item_id: T,
  pub score: f32
}

impl<T> Recommendation<T> {
  pub fn new(item_id: T, score: f32) -> Self {
    Self { item_id, score }
  }
}

impl<IntoId, Id> From<(IntoId, f32)> for Recommendation<Id>
  where IntoId: Into<Id> {
  fn from(value: (IntoId, f32)) -> Self {
    Recommendation::new(value.0.into(), value.1)
  }
}
