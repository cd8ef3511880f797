//! Migration checksums
//!
//! SHA256 over the migration SQL with line endings normalised, so a CRLF
//! checkout hashes the same as the LF original.

use sha2::{Digest, Sha256};

/// Compute the hex SHA256 checksum of a migration script
pub fn compute_checksum(sql: &str) -> String {
    let normalised = sql.replace("\r\n", "\n");
    hex::encode(Sha256::digest(normalised.as_bytes()))
}
