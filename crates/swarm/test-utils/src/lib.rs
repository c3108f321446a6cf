//! Test utilities for vertex-swarm crates.
//!
//! - [`init_tracing`] - log to the test output, filtered by `RUST_LOG`
//! - [`patterned_data`] - deterministic payloads
//! - [`RecordingStore`] - chunk store that records lookups and can hide chunks
//! - [`test_signer`], [`random_signer`] - signing keys

mod store;

pub use store::{RecordingStore, RecordedGet};

use alloy_primitives::{B256, b256};
use alloy_signer_local::PrivateKeySigner;
use tracing_subscriber::EnvFilter;

/// Private key behind [`test_signer`].
pub const TEST_PRIVATE_KEY: B256 =
    b256!("634fb5a872396d9693e5c9f9d7233cfa93f395c093371017ff44aa9ae6564cdd");

/// Install a test-friendly subscriber once per process.
///
/// Later calls are no-ops, so every test may call this.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .without_time()
        .try_init();
}

/// `len` bytes where byte `i` is `i % 255`.
pub fn patterned_data(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 255) as u8).collect()
}

/// A signer with a fixed key.
#[allow(clippy::expect_used)]
pub fn test_signer() -> PrivateKeySigner {
    PrivateKeySigner::from_bytes(&TEST_PRIVATE_KEY).expect("valid test key")
}

/// A signer with a fresh random key.
pub fn random_signer() -> PrivateKeySigner {
    PrivateKeySigner::random()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterned_data_wraps_at_255() {
        let data = patterned_data(600);
        assert_eq!(data[0], 0);
        assert_eq!(data[254], 254);
        assert_eq!(data[255], 0);
        assert_eq!(data[599], (599 % 255) as u8);
    }

    #[test]
    fn test_signer_is_stable() {
        assert_eq!(test_signer().address(), test_signer().address());
        assert_ne!(test_signer().address(), random_signer().address());
    }
}
