//! Random filename generation
//!
//! Names are 128 bits of OS entropy hashed to a 32 character hex digest, followed by the
//! source extension. Extensions that the transform stage always re-encodes as PNG are
//! rewritten to `png` so the stored name matches the stored bytes.

use rand::rngs::OsRng;
use rand::TryRngCore;
use sha2::{Digest, Sha256};

use crate::error::NameError;

const ENTROPY_BYTES: usize = 16;
const NAME_HEX_LEN: usize = 32;
const CONVERT_TO_PNG: [&str; 2] = ["gif", "svg"];

/// Produces collision-resistant base filenames.
pub trait NameGenerator: Send + Sync {
    /// Generate a new base name, carrying `source_extension` when present.
    ///
    /// Synchronous: the default draws OS entropy and hashes it, neither of which waits on
    /// I/O. Generators that need a remote source should fetch ahead and hand out names
    /// from a local pool.
    fn generate(&self, source_extension: Option<&str>) -> Result<String, NameError>;
}

/// Default generator backed by the operating system RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomNameGenerator;

impl RandomNameGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Map the source extension to the one the stored object will carry.
    pub fn normalize_extension(extension: &str) -> &str {
        if CONVERT_TO_PNG
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
        {
            "png"
        } else {
            extension
        }
    }
}

impl NameGenerator for RandomNameGenerator {
    fn generate(&self, source_extension: Option<&str>) -> Result<String, NameError> {
        let mut raw = [0u8; ENTROPY_BYTES];
        OsRng
            .try_fill_bytes(&mut raw)
            .map_err(|e| NameError::Randomness(e.to_string()))?;

        let digest = Sha256::digest(raw);
        let stem = hex::encode(&digest[..NAME_HEX_LEN / 2]);

        Ok(match source_extension {
            Some(ext) if !ext.is_empty() => {
                format!("{}.{}", stem, Self::normalize_extension(ext))
            }
            _ => stem,
        })
    }
}
