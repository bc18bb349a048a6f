//! Structured logging infrastructure
//!
//! Provides `env_logger`-based logging with secure handling of sensitive data
//! and proper integration with the standard log crate.

use log::{debug, error, info, warn};
use sha2::{Digest, Sha256};
use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Number of hex characters kept from a SHA-256 digest in log lines
const FINGERPRINT_LEN: usize = 16;

/// Logging entry points used across the signer
pub struct LoggingTransformer;

impl LoggingTransformer {
    /// Initialize logging system (should be called once at application startup)
    ///
    /// Configure logging levels via the `RUST_LOG` environment variable:
    /// - `RUST_LOG=info` - signer construction and start-up (recommended)
    /// - `RUST_LOG=debug` - cache activity and every issued certificate
    /// - `RUST_LOG=northfoot_signer=debug` - module-specific levels
    pub fn init() {
        INIT_LOGGER.call_once(|| {
            env_logger::Builder::from_default_env()
                .format_timestamp_micros()
                .init();

            info!("Structured logging initialized");
        });
    }

    /// Initialize logging for test environments
    ///
    /// Safe to call from every test; repeated initialization is ignored.
    pub fn init_test() {
        let _ = env_logger::Builder::from_default_env()
            .is_test(true)
            .try_init();
    }

    /// Log a registry event for a signer id
    pub fn log_cache_event(event: &str, signer_id: u64, cached_signers: usize) {
        debug!("Signer cache {event}: signer_id={signer_id} (cached: {cached_signers})");
    }

    /// Log construction of a signer backend
    pub fn log_signer_built(signer_id: u64, backend: &str, algorithm: &str, key_bits: usize) {
        info!("Built signer {signer_id}: backend={backend} key={algorithm}-{key_bits}");
    }

    /// Log an issued certificate by serial and fingerprint, never by content
    pub fn log_issuance(serial_hex: &str, certificate_der: &[u8], lifetime_secs: u64) {
        debug!(
            "Issued certificate serial={serial_hex} fingerprint={} lifetime={lifetime_secs}s",
            Self::fingerprint(certificate_der)
        );
    }

    /// Log start-up state of the persisted signer configuration
    pub fn log_startup(signer_count: usize) {
        if signer_count == 0 {
            warn!("No signers found in store. Consider adding one with the management API");
        } else {
            info!("Found {signer_count} signers in store");
        }
    }

    /// Secure logging of cryptographic errors
    ///
    /// Logs error types without exposing sensitive data
    pub fn log_crypto_error(operation: &str, error: &dyn std::error::Error) {
        error!(
            "Cryptographic operation failed: {} (error_type: {})",
            operation,
            std::any::type_name_of_val(error)
        );
    }

    /// Shortened SHA-256 fingerprint of arbitrary bytes for log lines
    #[must_use]
    pub fn fingerprint(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        let mut hex_digest = hex::encode(digest);
        hex_digest.truncate(FINGERPRINT_LEN);
        hex_digest
    }
}
