use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which way a message is travelling through the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Prepare a message for sending: archive, sign, encrypt.
    Outbound,
    /// Recover a received message: decrypt, verify, unarchive.
    Inbound,
}

/// Immutable configuration for the signer tool and its certificates.
///
/// Certificates are identified by their store thumbprints:
/// * `sign_certificate` - own signing certificate (with private key)
/// * `verify_certificate` - partner certificate for signature verification
/// * `encrypt_certificate` - partner certificate for encryption
/// * `decrypt_certificate` - own certificate for decryption (with private key)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoOptions {
    pub is_machine_store: bool,
    pub signer_tool_path: PathBuf,
    pub sign_certificate: String,
    pub verify_certificate: String,
    pub encrypt_certificate: String,
    pub decrypt_certificate: String,
}
