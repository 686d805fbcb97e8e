// src/hash.rs

//! SHA-256 hashing for source archives and published artifacts
//!
//! Upstream checksums are accepted either bare (`ad9d64...`) or prefixed
//! (`sha256:ad9d64...`). Digests are always reported as lowercase hex.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Length of a SHA-256 digest in hex characters
pub const SHA256_HEX_LEN: usize = 64;

/// Compute the SHA-256 digest of a byte slice
#[inline]
pub fn sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Compute the SHA-256 digest of data from a reader
pub fn hash_reader<R: Read>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 digest of a file, streaming its content
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| Error::IoError(format!("Failed to open {}: {}", path.display(), e)))?;
    hash_reader(&mut file)
        .map_err(|e| Error::IoError(format!("Failed to read {}: {}", path.display(), e)))
}

/// Normalize a checksum string to bare lowercase hex
///
/// Accepts `sha256:<hex>` or `<hex>`; any other algorithm prefix or a digest
/// of the wrong length is rejected.
pub fn normalize_checksum(checksum: &str) -> Result<String> {
    let value = match checksum.split_once(':') {
        Some((algo, value)) if algo.eq_ignore_ascii_case("sha256") => value,
        Some((algo, _)) => {
            return Err(Error::ParseError(format!(
                "Unsupported checksum algorithm: {} (supported: sha256)",
                algo
            )));
        }
        None => checksum,
    };

    if value.len() != SHA256_HEX_LEN {
        return Err(Error::ParseError(format!(
            "Invalid sha256 length: expected {}, got {}",
            SHA256_HEX_LEN,
            value.len()
        )));
    }
    if !value.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::ParseError(format!("Invalid hex in checksum: {}", value)));
    }

    Ok(value.to_lowercase())
}

/// Verify a file matches an expected SHA-256 checksum
pub fn verify_file_sha256(path: &Path, expected: &str) -> Result<()> {
    let expected = normalize_checksum(expected)?;
    let actual = hash_file(path)?;

    if actual == expected {
        Ok(())
    } else {
        Err(Error::ChecksumMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256(b"Hello, World!"),
            "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f"
        );
    }

    #[test]
    fn test_hash_reader_matches_bytes() {
        let data = b"hello world";
        let mut cursor = std::io::Cursor::new(data);
        assert_eq!(hash_reader(&mut cursor).unwrap(), sha256(data));
    }

    #[test]
    fn test_normalize_checksum() {
        let hex = "B94D27B9934D3E08A52E52D7DA7DABFAC484EFE37A5380EE9088F7ACE2EFCDE9";
        let expected = hex.to_lowercase();
        assert_eq!(normalize_checksum(hex).unwrap(), expected);
        assert_eq!(normalize_checksum(&format!("sha256:{hex}")).unwrap(), expected);

        assert!(normalize_checksum("md5:abc").is_err());
        assert!(normalize_checksum("abc123").is_err());
        assert!(normalize_checksum(&"z".repeat(64)).is_err());
    }

    #[test]
    fn test_verify_file_sha256() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();

        let good = "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
        assert!(verify_file_sha256(file.path(), good).is_ok());

        let bad = "0".repeat(64);
        match verify_file_sha256(file.path(), &bad) {
            Err(Error::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, bad);
                assert_eq!(actual, good);
            }
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }
}
