pub mod challenge;
pub mod config;
pub mod hit;
pub mod scoring;
pub mod spawner;

pub use challenge::{Challenge, ChallengeBuilder, ChallengeSnapshot};
pub use config::{ChallengeConfig, ChallengeKind, ConfigError};
pub use hit::HitOutcome;
