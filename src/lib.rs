//! ocimanifest
//! ============
//!
//! Digest-preserving model of OCI image manifests and image indexes.
//!
//! ```
//! use ocimanifest::{AnyManifest, Digest, Manifest, Platform, PlatformEx};
//!
//! let raw = br#"{
//!   "schemaVersion": 2,
//!   "mediaType": "application/vnd.oci.image.index.v1+json",
//!   "manifests": [{
//!     "mediaType": "application/vnd.oci.image.manifest.v1+json",
//!     "digest": "sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270",
//!     "size": 7682,
//!     "platform": { "architecture": "arm64", "os": "linux" }
//!   }]
//! }"#.to_vec();
//!
//! let index = AnyManifest::from_bytes(raw.clone()).unwrap();
//! // Bytes are kept verbatim, whitespace included
//! assert_eq!(index.raw_json().unwrap(), &raw[..]);
//! assert_eq!(
//!     Digest::from_descriptor(index.get_descriptor().unwrap()),
//!     Digest::from_buf_sha256(&raw),
//! );
//!
//! let arm64 = Platform::parse_spec("linux/arm64").unwrap();
//! assert!(index.get_platform_descriptor(&arm64).unwrap().is_some());
//! assert!(index.get_layers().is_err());
//! ```

pub mod config;
pub mod error;
pub mod manifest;
pub mod media_types;
pub mod platform;

mod digest;
mod image_name;
mod name;
mod reference;

pub use digest::Digest;
pub use error::{Error, Result};
pub use image_name::ImageName;
pub use manifest::{AnyManifest, Manifest, ManifestIndex, Original, PlatformManifest};
pub use name::Name;
pub use oci_spec;
pub use oci_spec::image::{Descriptor, Platform};
pub use platform::{DefaultMatcher, PlatformEx, PlatformMatcher};
pub use reference::Reference;
