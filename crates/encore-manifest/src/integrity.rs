//! Subresource-integrity digests of finalized build outputs.

use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256, Sha384, Sha512};

use crate::entrypoints::EntrypointsStore;
use crate::error::{ManifestError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    pub fn digest(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha256 => Sha256::digest(bytes).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(bytes).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(bytes).to_vec(),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ManifestError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha384" => Ok(HashAlgorithm::Sha384),
            "sha512" => Ok(HashAlgorithm::Sha512),
            _ => Err(ManifestError::UnsupportedAlgorithm {
                algorithm: name.to_string(),
            }),
        }
    }
}

/// Computes `algorithm-base64digest` tokens for a fixed list of algorithms.
///
/// Digests must be taken over the exact emitted bytes, so this runs only once
/// the host has frozen output content.
///
/// ```
/// use encore_manifest::IntegrityComputer;
///
/// let computer = IntegrityComputer::new(&["sha256".to_string()]).unwrap();
/// assert_eq!(
///     computer.digest(b""),
///     "sha256-47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
/// );
/// ```
#[derive(Debug, Clone)]
pub struct IntegrityComputer {
    algorithms: Vec<(String, HashAlgorithm)>,
}

impl IntegrityComputer {
    /// Tokens keep the algorithm names as given and in the given order.
    pub fn new(algorithms: &[String]) -> Result<Self> {
        let algorithms = algorithms
            .iter()
            .map(|name| {
                name.parse::<HashAlgorithm>()
                    .map(|algorithm| (name.clone(), algorithm))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { algorithms })
    }

    /// Space-joined tokens, one per algorithm.
    pub fn digest(&self, bytes: &[u8]) -> String {
        self.algorithms
            .iter()
            .map(|(name, algorithm)| format!("{name}-{}", STANDARD.encode(algorithm.digest(bytes))))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Digests every `(file, bytes)` output and records the result on `entrypoints`.
    pub fn apply<'a, I>(&self, outputs: I, entrypoints: &mut EntrypointsStore) -> usize
    where
        I: IntoIterator<Item = (&'a str, &'a [u8])>,
    {
        let mut count = 0;
        for (file, bytes) in outputs {
            entrypoints.add_integrity_entry(file, self.digest(bytes));
            count += 1;
        }
        count
    }
}
