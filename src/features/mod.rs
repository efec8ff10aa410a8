//! Feature extraction and encoding
//!
//! Rolling player state, feature derivation and the design-matrix layout.

pub mod catalog;
pub mod derive;
pub mod design;
pub mod elo;
pub mod head_to_head;
pub mod player_stats;
pub mod scaler;
pub mod score;

pub use catalog::{Catalog, FeatureRequest, MatchContext, PreparedFeatures};
pub use derive::{Feature, MissingReason};
pub use design::{CategoricalVocabulary, DesignMatrix};
pub use elo::EloRatings;
pub use scaler::Scaler;
