use serde::Serialize;

use super::Recommendation;

#[derive(Debug, Serialize)]
pub struct RecommendationList<K>(pub Vec<Recommendation<K>>);

impl<K> RecommendationList<K> {

  pub fn new_with_sort(mut recs: Vec<Recommendation<K>>) -> Self {
    // Stable sort: equal scores keep their insertion order.
    recs.sort_by(|this, other| {
        other.score.partial_cmp(&this.score).unwrap()
      }
    );
    Self(recs)
  }

  pub fn from_iter_with_sort<I>(value: I) -> Self
    where I: IntoIterator,
          I::Item: Into<Recommendation<K>>,
          K: PartialEq {
    let recs = value.into_iter()
      .map(|item| item.into())
      .collect::<Vec<Recommendation<K>>>();
    Self::new_with_sort(recs)
  }

  /// Build a ranked list from candidates, dropping any item the subject
  /// has already seen.
  pub fn from_iter_excluding<I>(value: I, seen: &[K]) -> Self
    where I: IntoIterator,
          I::Item: Into<Recommendation<K>>,
          K: PartialEq {
    Self::from_iter_with_sort(
      value.into_iter()
        .map(|item| item.into())
        .filter(|rec: &Recommendation<K>| !seen.contains(&rec.item_id))
    )
  }

  /// Cap the list at the top `n` entries.
  pub fn truncated(mut self, n: u16) -> Self {
    self.0.truncate(n as usize);
    self
  }

  pub fn ids(&self) -> impl Iterator<Item = &K> {
    self.0.iter().map(|rec| &rec.item_id)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}
