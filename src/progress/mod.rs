pub mod achievements;
pub mod error;
pub mod model;
pub mod recorder;
pub mod streak;

pub use error::ProgressError;
pub use model::{EarnedBadge, QuizScore, UserProgress};
