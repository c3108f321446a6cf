//! Replica CLI arguments.

use clap::Args;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vertex_swarm_primitives::RedundancyLevel;

/// Default delay between escalation rounds in milliseconds.
pub const DEFAULT_ROUND_DELAY_MS: u64 = 500;

/// Replica configuration arguments.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Replicas")]
#[serde(default)]
pub struct ReplicaArgs {
    /// Redundancy level for uploads and retrievals.
    #[arg(long = "replicas.level", value_enum, default_value_t = RedundancyLevel::None)]
    pub level: RedundancyLevel,

    /// Delay between replica lookup rounds in milliseconds.
    #[arg(long = "replicas.round-delay", default_value_t = DEFAULT_ROUND_DELAY_MS)]
    pub round_delay_ms: u64,
}

impl ReplicaArgs {
    /// Delay between replica lookup rounds.
    pub fn round_delay(&self) -> Duration {
        Duration::from_millis(self.round_delay_ms)
    }
}

impl Default for ReplicaArgs {
    fn default() -> Self {
        Self {
            level: RedundancyLevel::None,
            round_delay_ms: DEFAULT_ROUND_DELAY_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        replicas: ReplicaArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["vertex"]);
        assert_eq!(cli.replicas, ReplicaArgs::default());
        assert_eq!(cli.replicas.round_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "vertex",
            "--replicas.level",
            "paranoid",
            "--replicas.round-delay",
            "250",
        ]);
        assert_eq!(cli.replicas.level, RedundancyLevel::Paranoid);
        assert_eq!(cli.replicas.round_delay(), Duration::from_millis(250));
    }
}
