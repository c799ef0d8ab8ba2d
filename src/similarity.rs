use ndarray::{Array2, ArrayView1};
use tap::Pipe;
use tracing::{Level, span, debug, trace};

use super::{
  Recommendation,
  RecommendationList,
  Recommender,
  error::RecommendError,
  matrix::RatingMatrix,
  store::RatingStore,
  types::CourseId
};

/// User-user collaborative filtering: candidates come from the rated
/// courses of the most similar other users.
#[derive(Builder)]
pub struct SimilarityRecommender<'a> {
  store: &'a RatingStore,
  #[builder(default = "2")]
  n_neighbors: usize
}

impl<'a> SimilarityRecommender<'a> {
  pub fn new(store: &'a RatingStore, n_neighbors: usize) -> Self {
    Self { store, n_neighbors }
  }

  pub fn builder() -> SimilarityRecommenderBuilder<'a> {
    SimilarityRecommenderBuilder::default()
  }
}

/// Zero-mean, unit-variance normalization per user row. A constant row
/// has nothing to scale and stays all zeros.
pub fn normalize_rows(values: &Array2<f32>) -> Array2<f32> {
  let mut normalized = values.clone();
  for mut row in normalized.rows_mut() {
    if row.is_empty() {
      continue;
    }
    let mean = row.sum() / row.len() as f32;
    row.mapv_inplace(|v| v - mean);
    let std = (row.dot(&row) / row.len() as f32).sqrt();
    if std > f32::EPSILON {
      row.mapv_inplace(|v| v / std);
    }
  }
  normalized
}

/// Pairwise cosine similarity between all rows. Symmetric, with
/// self-similarity on the diagonal.
pub fn cosine_matrix(rows: &Array2<f32>) -> Array2<f32> {
  let n = rows.nrows();
  let mut sims = Array2::<f32>::zeros((n, n));
  for i in 0..n {
    for j in i..n {
      let sim = cosine(rows.row(i), rows.row(j));
      sims[[i, j]] = sim;
      sims[[j, i]] = sim;
    }
  }
  sims
}

fn cosine(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
  let norm_a = a.dot(&a).sqrt();
  let norm_b = b.dot(&b).sqrt();
  if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
    return 0.0;
  }
  a.dot(&b) / (norm_a * norm_b)
}

/// The `n` highest-similarity rows other than the subject's own. The sort
/// is stable, so ties fall back to matrix row order (first seen wins).
fn top_neighbors(sims: ArrayView1<f32>, subject_row: usize, n: usize) -> Vec<(usize, f32)> {
  let mut others: Vec<(usize, f32)> = sims.iter()
    .copied()
    .enumerate()
    .filter(|&(row, _)| row != subject_row)
    .collect();
  others.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
  others.truncate(n);
  others
}

impl<'a, K, Rec> Recommender<K, Rec> for SimilarityRecommender<'a>
  where K: AsRef<str>,
        Rec: From<CourseId> + PartialEq {
  fn recommend(&self, user_id: &K, n_items: u16)
      -> Result<RecommendationList<Rec>, RecommendError> {
    let span = span!(Level::DEBUG, "similarity-recommend");
    let _guard = span.enter();
    let user_id = user_id.as_ref();
    debug!("Rebuilding rating matrix");
    let matrix = RatingMatrix::from_store(self.store);
    let Some(subject_row) = matrix.row_of(user_id) else {
      trace!("User {:?} absent from matrix, returning empty list", user_id);
      return Ok(RecommendationList(Vec::new()));
    };
    let sims = normalize_rows(matrix.values())
      .pipe(|normalized| cosine_matrix(&normalized));
    let neighbors = top_neighbors(sims.row(subject_row), subject_row, self.n_neighbors);
    trace!("Selected {} neighbors for {:?}", neighbors.len(), user_id);
    let mut offered = self.store.courses_rated_by(user_id);
    let mut candidates: Vec<Recommendation<Rec>> = Vec::new();
    for (row, sim) in neighbors {
      for course in self.store.courses_rated_by(matrix.user_at(row)) {
        if offered.contains(&course) {
          continue;
        }
        offered.push(course);
        candidates.push(Recommendation::new(course.into(), sim));
      }
    }
    trace!("Ranking {} candidates", candidates.len());
    Ok(RecommendationList::new_with_sort(candidates).truncated(n_items))
  }
}
