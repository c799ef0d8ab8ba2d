pub mod catalog;
pub mod error;
#[cfg(feature = "factor")]
pub mod factor;
pub mod list;
pub mod matrix;
#[cfg(feature = "similarity")]
pub mod similarity;
pub mod store;
pub mod types;

#[cfg(any(feature = "similarity", feature = "factor"))]
#[macro_use]
extern crate derive_builder;

#[cfg(feature = "factor")]
pub use factor::{FactorConfig, FactorModel, FactorRecommender};
#[cfg(feature = "similarity")]
pub use similarity::SimilarityRecommender;
pub use catalog::{Catalog, Course};
pub use error::RecommendError;
pub use list::RecommendationList;
pub use matrix::RatingMatrix;
pub use store::{Rating, RatingStore, UserProfile};
pub use types::{CourseId, Recommendation};

pub trait Recommender<K, R> {
  fn recommend(&self, user_id: &K, n_items: u16)
      -> Result<RecommendationList<R>, RecommendError>;
}
