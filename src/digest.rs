//! Streaming content digests
//!
//! `DigestEngine` reads a file in fixed-size chunks and feeds them to the
//! selected hash, so memory use stays constant regardless of file size.
//! Output is always lowercase hexadecimal, and depends only on the bytes
//! read: the file's name and location play no part.
//!
//! ## Example
//!
//! ```rust
//! use treesum::digest::{DigestAlgorithm, DigestEngine};
//!
//! let engine = DigestEngine::new(DigestAlgorithm::Md5);
//! assert_eq!(engine.digest_bytes(b"hello"), "5d41402abc4b2a76b9719d911017c592");
//! ```

use crate::error::{Result, TreesumError};
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::trace;

/// Default read chunk size (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// MD5, 32 hex characters; manifests end in `.md5`
    #[default]
    Md5,
    /// SHA-256, 64 hex characters; manifests end in `.sha256`
    Sha256,
}

impl DigestAlgorithm {
    /// Manifest file extension for this algorithm, without the dot
    pub fn manifest_extension(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "md5",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }

    /// Length of a digest in hex characters
    pub fn hex_len(self) -> usize {
        match self {
            DigestAlgorithm::Md5 => 32,
            DigestAlgorithm::Sha256 => 64,
        }
    }

    /// Upper-case display name, as used in report headers
    pub fn display_name(self) -> &'static str {
        match self {
            DigestAlgorithm::Md5 => "MD5",
            DigestAlgorithm::Sha256 => "SHA-256",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.manifest_extension())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TreesumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(DigestAlgorithm::Md5),
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            other => Err(TreesumError::InvalidConfiguration(format!(
                "unsupported digest algorithm: {}",
                other
            ))),
        }
    }
}

enum Hasher {
    Md5(Md5),
    Sha256(Sha256),
}

impl Hasher {
    fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Md5 => Hasher::Md5(Md5::new()),
            DigestAlgorithm::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(h) => h.update(data),
            Hasher::Sha256(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Hasher::Md5(h) => hex::encode(h.finalize()),
            Hasher::Sha256(h) => hex::encode(h.finalize()),
        }
    }
}

/// Computes digests of files and buffers
#[derive(Debug, Clone, Copy)]
pub struct DigestEngine {
    algorithm: DigestAlgorithm,
    chunk_size: usize,
}

impl DigestEngine {
    /// Create an engine with the default chunk size
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size (minimum 1 byte)
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Digest a file's content
    ///
    /// # Errors
    ///
    /// - [`TreesumError::ReadFailure`] if the file cannot be opened or read
    pub fn digest(&self, path: &Path) -> Result<String> {
        self.digest_with_size(path).map(|(digest, _)| digest)
    }

    /// Digest a file's content and report how many bytes were read
    pub fn digest_with_size(&self, path: &Path) -> Result<(String, u64)> {
        let file = File::open(path).map_err(|e| TreesumError::read(path, e))?;
        let result = self
            .digest_reader(file)
            .map_err(|e| TreesumError::read(path, e))?;
        trace!("Digested {:?}: {} ({} bytes)", path, result.0, result.1);
        Ok(result)
    }

    /// Digest everything a reader yields, one chunk at a time
    pub fn digest_reader<R: Read>(&self, mut reader: R) -> io::Result<(String, u64)> {
        let mut hasher = Hasher::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];
        let mut total = 0u64;

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
            total += bytes_read as u64;
        }

        Ok((hasher.finalize_hex(), total))
    }

    /// Digest an in-memory buffer
    pub fn digest_bytes(&self, data: &[u8]) -> String {
        let mut hasher = Hasher::new(self.algorithm);
        hasher.update(data);
        hasher.finalize_hex()
    }
}

impl Default for DigestEngine {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default())
    }
}
