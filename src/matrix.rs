use std::collections::HashMap;

use ndarray::Array2;

use super::{
  store::RatingStore,
  types::CourseId
};

/// Dense user x course rating matrix. Rows follow the store's first-seen
/// user order, columns are course ids ascending, absent pairs hold the
/// neutral fill value 0. Rebuilt from the store on every use, never cached.
#[derive(Debug)]
pub struct RatingMatrix {
  values: Array2<f32>,
  users: Vec<String>,
  user_index: HashMap<String, usize>,
  courses: Vec<CourseId>,
  course_index: HashMap<CourseId, usize>
}

impl RatingMatrix {
  pub fn from_store(store: &RatingStore) -> Self {
    let users: Vec<String> = store.users().iter().map(|&u| u.to_owned()).collect();
    let courses = store.courses();
    let user_index: HashMap<String, usize> = users.iter()
      .enumerate()
      .map(|(i, user)| (user.clone(), i))
      .collect();
    let course_index: HashMap<CourseId, usize> = courses.iter()
      .enumerate()
      .map(|(i, &course)| (course, i))
      .collect();
    let mut values = Array2::<f32>::zeros((users.len(), courses.len()));
    for rating in store.ratings() {
      let row = user_index[&rating.user_id];
      let col = course_index[&rating.course_id];
      values[[row, col]] = rating.score as f32;
    }
    Self { values, users, user_index, courses, course_index }
  }

  pub fn values(&self) -> &Array2<f32> {
    &self.values
  }

  pub fn row_of(&self, user_id: &str) -> Option<usize> {
    self.user_index.get(user_id).copied()
  }

  pub fn user_at(&self, row: usize) -> &str {
    &self.users[row]
  }

  pub fn col_of(&self, course_id: CourseId) -> Option<usize> {
    self.course_index.get(&course_id).copied()
  }

  pub fn courses(&self) -> &[CourseId] {
    &self.courses
  }

  pub fn n_users(&self) -> usize {
    self.users.len()
  }

  pub fn n_courses(&self) -> usize {
    self.courses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.users.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_store_yields_empty_matrix() {
    let matrix = RatingMatrix::from_store(&RatingStore::new());
    assert!(matrix.is_empty());
    assert_eq!(matrix.values().shape(), &[0, 0]);
  }

  #[test]
  fn fills_cells_and_neutral_zeros() {
    let mut store = RatingStore::new();
    store.submit("maria", 1, 5);
    store.submit("maria", 3, 2);
    store.submit("carlos", 1, 4);
    let matrix = RatingMatrix::from_store(&store);
    assert_eq!(matrix.values().shape(), &[2, 2]);
    assert_eq!(matrix.courses(), &[1, 3]);
    let maria = matrix.row_of("maria").unwrap();
    let carlos = matrix.row_of("carlos").unwrap();
    assert_eq!(matrix.values()[[maria, 0]], 5.0);
    assert_eq!(matrix.values()[[maria, 1]], 2.0);
    assert_eq!(matrix.values()[[carlos, 0]], 4.0);
    // carlos never rated course 3
    assert_eq!(matrix.values()[[carlos, 1]], 0.0);
  }

  #[test]
  fn rows_follow_first_seen_order() {
    let mut store = RatingStore::new();
    store.submit("carlos", 2, 3);
    store.submit("ana", 1, 4);
    let matrix = RatingMatrix::from_store(&store);
    assert_eq!(matrix.user_at(0), "carlos");
    assert_eq!(matrix.user_at(1), "ana");
    assert_eq!(matrix.row_of("desconocido"), None);
  }
}
