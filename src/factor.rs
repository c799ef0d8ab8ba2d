use std::collections::HashMap;

use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::{Level, span, debug, trace};

use super::{
  RecommendationList,
  Recommender,
  error::RecommendError,
  store::RatingStore,
  types::CourseId
};

#[derive(Builder, Debug, Clone)]
pub struct FactorConfig {
  #[builder(default = "8")]
  pub latent_factors: usize,
  #[builder(default = "0.05")]
  pub learning_rate: f32,
  #[builder(default = "0.02")]
  pub regularization: f32,
  #[builder(default = "400")]
  pub epochs: usize,
  #[builder(default = "42")]
  pub seed: u64
}

impl FactorConfig {
  pub fn builder() -> FactorConfigBuilder {
    FactorConfigBuilder::default()
  }
}

impl Default for FactorConfig {
  fn default() -> Self {
    Self {
      latent_factors: 8,
      learning_rate: 0.05,
      regularization: 0.02,
      epochs: 400,
      seed: 42
    }
  }
}

/// Biased matrix factorization fitted by stochastic gradient descent.
/// Predicted score = global mean + user bias + course bias + dot of the
/// latent vectors. The fit is one batch pass over all ratings per epoch,
/// in store order, so a fixed seed gives a fully deterministic model.
pub struct FactorModel {
  user_factors: Array2<f32>,
  course_factors: Array2<f32>,
  user_biases: Array1<f32>,
  course_biases: Array1<f32>,
  global_mean: f32,
  user_index: HashMap<String, usize>,
  course_index: HashMap<CourseId, usize>,
  courses: Vec<CourseId>
}

impl FactorModel {
  pub fn fit(store: &RatingStore, config: FactorConfig) -> Result<Self, RecommendError> {
    let span = span!(Level::DEBUG, "factor-fit");
    let _guard = span.enter();
    if store.is_empty() {
      return Err(RecommendError::EmptyRatings);
    }
    let users = store.users();
    let courses = store.courses();
    let user_index: HashMap<String, usize> = users.iter()
      .enumerate()
      .map(|(i, &user)| (user.to_owned(), i))
      .collect();
    let course_index: HashMap<CourseId, usize> = courses.iter()
      .enumerate()
      .map(|(i, &course)| (course, i))
      .collect();
    let k = config.latent_factors;
    debug!(
      "Fitting {} factors over {} users x {} courses, {} ratings",
      k, users.len(), courses.len(), store.len()
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut user_factors = Array2::<f32>::zeros((users.len(), k));
    let mut course_factors = Array2::<f32>::zeros((courses.len(), k));
    user_factors.mapv_inplace(|_| rng.gen_range(-0.1..0.1));
    course_factors.mapv_inplace(|_| rng.gen_range(-0.1..0.1));
    let mut user_biases = Array1::<f32>::zeros(users.len());
    let mut course_biases = Array1::<f32>::zeros(courses.len());
    let global_mean = store.ratings().iter()
      .map(|r| r.score as f32)
      .sum::<f32>() / store.len() as f32;

    let lr = config.learning_rate;
    let reg = config.regularization;
    for epoch in 0..config.epochs {
      let mut squared_error = 0.0f32;
      for rating in store.ratings() {
        let u = user_index[&rating.user_id];
        let c = course_index[&rating.course_id];
        let predicted = global_mean
          + user_biases[u]
          + course_biases[c]
          + user_factors.row(u).dot(&course_factors.row(c));
        let err = rating.score as f32 - predicted;
        squared_error += err * err;
        user_biases[u] += lr * (err - reg * user_biases[u]);
        course_biases[c] += lr * (err - reg * course_biases[c]);
        for f in 0..k {
          let uf = user_factors[[u, f]];
          let cf = course_factors[[c, f]];
          user_factors[[u, f]] += lr * (err * cf - reg * uf);
          course_factors[[c, f]] += lr * (err * uf - reg * cf);
        }
      }
      if epoch % 100 == 0 {
        trace!("Epoch {}: mse {}", epoch, squared_error / store.len() as f32);
      }
    }

    Ok(Self {
      user_factors,
      course_factors,
      user_biases,
      course_biases,
      global_mean,
      user_index,
      course_index,
      courses
    })
  }

  /// Estimated score for any (user, course) pair the model was fitted
  /// over, rated or not.
  pub fn predict(&self, user_id: &str, course_id: CourseId) -> Result<f32, RecommendError> {
    let u = *self.user_index.get(user_id)
      .ok_or_else(|| RecommendError::UnknownUser(user_id.to_owned()))?;
    let c = *self.course_index.get(&course_id)
      .ok_or(RecommendError::UnknownCourse(course_id))?;
    Ok(self.global_mean
      + self.user_biases[u]
      + self.course_biases[c]
      + self.user_factors.row(u).dot(&self.course_factors.row(c)))
  }

  pub fn contains_user(&self, user_id: &str) -> bool {
    self.user_index.contains_key(user_id)
  }

  /// Course ids the model knows, ascending.
  pub fn courses(&self) -> &[CourseId] {
    &self.courses
  }
}

/// Ranks a user's unrated courses by the factor model's estimated score.
/// The model keeps its fit until the caller retrains it; the store is read
/// fresh on every call to decide what the user has already rated.
pub struct FactorRecommender<'a> {
  store: &'a RatingStore,
  model: &'a FactorModel
}

impl<'a> FactorRecommender<'a> {
  pub fn new(store: &'a RatingStore, model: &'a FactorModel) -> Self {
    Self { store, model }
  }
}

impl<'a, K, Rec> Recommender<K, Rec> for FactorRecommender<'a>
  where K: AsRef<str>,
        Rec: From<CourseId> + PartialEq {
  fn recommend(&self, user_id: &K, n_items: u16)
      -> Result<RecommendationList<Rec>, RecommendError> {
    let span = span!(Level::DEBUG, "factor-recommend");
    let _guard = span.enter();
    let user_id = user_id.as_ref();
    if !self.model.contains_user(user_id) {
      trace!("User {:?} absent from model, returning empty list", user_id);
      return Ok(RecommendationList(Vec::new()));
    }
    let seen: Vec<Rec> = self.store.courses_rated_by(user_id)
      .into_iter()
      .map(Rec::from)
      .collect();
    // Candidates arrive in ascending course-id order; the stable sort then
    // breaks score ties by ascending id.
    let mut candidates: Vec<(CourseId, f32)> = Vec::new();
    for &course in self.model.courses() {
      candidates.push((course, self.model.predict(user_id, course)?));
    }
    trace!("Ranking {} candidates for {:?}", candidates.len(), user_id);
    Ok(RecommendationList::from_iter_excluding(candidates, &seen).truncated(n_items))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scenario_store() -> RatingStore {
    let mut store = RatingStore::new();
    store.submit("a", 1, 5);
    store.submit("a", 2, 4);
    store.submit("b", 1, 5);
    store.submit("b", 2, 4);
    store.submit("b", 3, 5);
    store.submit("c", 4, 5);
    store
  }

  #[test]
  fn fit_on_empty_store_is_an_error() {
    let result = FactorModel::fit(&RatingStore::new(), FactorConfig::default());
    assert!(matches!(result, Err(RecommendError::EmptyRatings)));
  }

  #[test]
  fn predict_recovers_observed_ratings() {
    let store = scenario_store();
    let model = FactorModel::fit(&store, FactorConfig::default()).unwrap();
    for rating in store.ratings() {
      let predicted = model.predict(&rating.user_id, rating.course_id).unwrap();
      assert!(
        (predicted - rating.score as f32).abs() < 1.0,
        "predicted {} for observed {}",
        predicted,
        rating.score
      );
    }
  }

  #[test]
  fn predict_rejects_unknown_ids() {
    let model = FactorModel::fit(&scenario_store(), FactorConfig::default()).unwrap();
    assert!(matches!(model.predict("nobody", 1), Err(RecommendError::UnknownUser(_))));
    assert!(matches!(model.predict("a", 99), Err(RecommendError::UnknownCourse(99))));
  }

  #[test]
  fn recommendations_skip_rated_courses() {
    let store = scenario_store();
    let model = FactorModel::fit(&store, FactorConfig::default()).unwrap();
    let recommender = FactorRecommender::new(&store, &model);
    for user in ["a", "b", "c"] {
      let recs: RecommendationList<CourseId> = recommender.recommend(&user, 3).unwrap();
      assert!(recs.len() <= 3);
      for &id in recs.ids() {
        assert!(store.rating_for(user, id).is_none());
      }
    }
  }

  #[test]
  fn unknown_user_gets_empty_list() {
    let store = scenario_store();
    let model = FactorModel::fit(&store, FactorConfig::default()).unwrap();
    let recommender = FactorRecommender::new(&store, &model);
    let recs: RecommendationList<CourseId> = recommender.recommend(&"nobody", 3).unwrap();
    assert!(recs.is_empty());
  }

  #[test]
  fn same_seed_gives_identical_recommendations() {
    let store = scenario_store();
    let config = FactorConfig::builder().seed(7).build().unwrap();
    let first = FactorModel::fit(&store, config.clone()).unwrap();
    let second = FactorModel::fit(&store, config).unwrap();
    let a: RecommendationList<CourseId> =
      FactorRecommender::new(&store, &first).recommend(&"a", 3).unwrap();
    let b: RecommendationList<CourseId> =
      FactorRecommender::new(&store, &second).recommend(&"a", 3).unwrap();
    let a_ids: Vec<CourseId> = a.ids().copied().collect();
    let b_ids: Vec<CourseId> = b.ids().copied().collect();
    assert_eq!(a_ids, b_ids);
  }
}
