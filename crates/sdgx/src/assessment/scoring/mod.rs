mod engine;
pub mod views;

pub use engine::{compute_scores, IndicatorScore, ScoreSheet};
