//! Feedback cycles: detect, materialize, convert, score

mod config;
mod scheduler;
mod score;

pub use config::FeedbackConfig;
pub use scheduler::{AggregateMetrics, CYCLE_METRIC_KIND, CycleOutcome, FeedbackScheduler};
pub use score::feedback_score;
