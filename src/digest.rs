use crate::error::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha512};
use std::{fmt, str::FromStr};

/// Digest of contents
///
/// Digest is defined in [OCI image spec](https://github.com/opencontainers/image-spec/blob/v1.0.1/descriptor.md#digests)
/// as a string satisfies following EBNF:
///
/// ```text
/// digest                ::= algorithm ":" encoded
/// algorithm             ::= algorithm-component (algorithm-separator algorithm-component)*
/// algorithm-component   ::= [a-z0-9]+
/// algorithm-separator   ::= [+._-]
/// encoded               ::= [a-zA-Z0-9=_-]+
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    pub algorithm: String,
    pub encoded: String,
}

lazy_static::lazy_static! {
    static ref ALGORITHM_RE: Regex = Regex::new(r"^[a-z0-9]+([+._-][a-z0-9]+)*$").unwrap();
    static ref ENCODED_RE: Regex = Regex::new(r"^[a-zA-Z0-9=_-]+$").unwrap();
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = Error;
    fn from_str(input: &str) -> Result<Self> {
        Self::new(input)
    }
}

impl From<&oci_spec::image::Digest> for Digest {
    fn from(digest: &oci_spec::image::Digest) -> Self {
        Digest {
            algorithm: digest.algorithm().to_string(),
            encoded: digest.digest().to_string(),
        }
    }
}

impl TryFrom<&Digest> for oci_spec::image::Digest {
    type Error = Error;
    fn try_from(digest: &Digest) -> Result<Self> {
        oci_spec::image::Digest::from_str(&digest.to_string())
            .map_err(|_| Error::InvalidDigest(digest.to_string()))
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Digest, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::new(&s).map_err(serde::de::Error::custom)
    }
}

impl Digest {
    pub fn new(input: &str) -> Result<Self> {
        let (algorithm, encoded) = input
            .split_once(':')
            .ok_or_else(|| Error::InvalidDigest(input.to_string()))?;
        if ALGORITHM_RE.is_match(algorithm) && ENCODED_RE.is_match(encoded) {
            Ok(Digest {
                algorithm: algorithm.to_string(),
                encoded: encoded.to_string(),
            })
        } else {
            Err(Error::InvalidDigest(input.to_string()))
        }
    }

    pub fn from_descriptor(descriptor: &oci_spec::image::Descriptor) -> Self {
        Self::from(descriptor.digest())
    }

    /// Calc digest using SHA-256 algorithm
    pub fn from_buf_sha256(buf: &[u8]) -> Self {
        let hash = Sha256::digest(buf);
        Self {
            algorithm: "sha256".to_string(),
            encoded: base16ct::lower::encode_string(&hash),
        }
    }

    /// Calc digest using the given algorithm, `sha256` or `sha512`
    pub fn from_buf(algorithm: &str, buf: &[u8]) -> Result<Self> {
        match algorithm {
            "sha256" => Ok(Self::from_buf_sha256(buf)),
            "sha512" => {
                let hash = Sha512::digest(buf);
                Ok(Self {
                    algorithm: "sha512".to_string(),
                    encoded: base16ct::lower::encode_string(&hash),
                })
            }
            _ => Err(Error::UnsupportedDigestAlgorithm(algorithm.to_string())),
        }
    }

    /// Check that `buf` hashes to this digest with the same algorithm
    pub fn verify(&self, buf: &[u8]) -> Result<()> {
        let actual = Self::from_buf(&self.algorithm, buf)?;
        if &actual == self {
            Ok(())
        } else {
            Err(Error::DigestMismatch {
                expected: self.to_string(),
                actual,
            })
        }
    }
}
