//! Feeder CLI arguments.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Number of logical CPUs, the default admission gate size.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// How uploaded content is encrypted.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    ValueEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EncryptionKind {
    /// Plain chunks.
    #[default]
    None,
    /// One random key for every chunk of an upload.
    Shared,
    /// A fresh key per chunk, carried in the parent.
    Recursive,
}

/// Feeder configuration arguments.
#[derive(Debug, Args, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[command(next_help_heading = "Feeder")]
#[serde(default)]
pub struct FeederArgs {
    /// Maximum number of chunks processed concurrently.
    #[arg(long = "feeder.concurrency", default_value_t = default_concurrency())]
    pub concurrency: usize,

    /// Encryption of uploaded content.
    #[arg(long = "feeder.encryption", value_enum, default_value_t = EncryptionKind::None)]
    pub encryption: EncryptionKind,
}

impl Default for FeederArgs {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            encryption: EncryptionKind::None,
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
        feeder: FeederArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["vertex"]);
        assert_eq!(cli.feeder, FeederArgs::default());
        assert!(cli.feeder.concurrency >= 1);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::parse_from([
            "vertex",
            "--feeder.concurrency",
            "3",
            "--feeder.encryption",
            "recursive",
        ]);
        assert_eq!(cli.feeder.concurrency, 3);
        assert_eq!(cli.feeder.encryption, EncryptionKind::Recursive);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(EncryptionKind::Shared.to_string(), "shared");
        assert_eq!("recursive".parse::<EncryptionKind>().unwrap(), EncryptionKind::Recursive);
    }
}
