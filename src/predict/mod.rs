//! Prediction and inference
//!
//! Rebuild feature vectors for new pairings and score them with an external
//! classifier.

pub mod inference;

pub use inference::{format_prediction, Classifier, Predictor, VectorizedMatch, Vectorizer};
