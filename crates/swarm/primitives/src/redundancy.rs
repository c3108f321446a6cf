/// Redundancy level of an upload.
///
/// Selects how many dispersed replicas are written for a chunk and how many
/// escalation rounds a retrieval may go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(strum::Display, strum::EnumString, strum::EnumIter, strum::FromRepr)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum RedundancyLevel {
    /// No replicas.
    #[default]
    None = 0,
    /// 2 replicas in one round.
    Medium = 1,
    /// 4 replicas in two rounds.
    Strong = 2,
    /// 8 replicas in three rounds.
    Insane = 3,
    /// 16 replicas in four rounds.
    Paranoid = 4,
}

/// Replicas issued per escalation round, for the most redundant level.
const ROUNDS: [usize; 4] = [2, 2, 4, 8];

impl RedundancyLevel {
    /// Number of escalation rounds.
    pub const fn round_count(self) -> usize {
        self as usize
    }

    /// Replica count of every round, in order.
    pub fn rounds(self) -> &'static [usize] {
        ROUNDS.get(..self.round_count()).unwrap_or(&ROUNDS)
    }

    /// Total number of replicas.
    pub fn replica_count(self) -> usize {
        self.rounds().iter().sum()
    }
}
