//! Digest-preserving wrappers of OCI image manifests and indexes
//!
//! A wrapper starts empty and is populated exactly once, either from a document built locally
//! ([Manifest::set_original]) or from bytes received from a registry ([Manifest::load]).
//! The bytes are kept as they are, so a digest issued by a registry keeps validating against
//! [Manifest::raw_json]. Once populated a wrapper is never mutated again and may be shared
//! between threads for reading.

mod common;
mod image;
mod index;

pub use image::PlatformManifest;
pub use index::ManifestIndex;

use crate::{
    error::*,
    media_types::{self, Kind},
    Digest, ImageName,
};
use oci_spec::image::{Descriptor, ImageIndex, ImageManifest, MediaType, Platform};
use serde::{de::IgnoredAny, Deserialize};
use std::collections::HashMap;

/// Uniform access to both manifest variants
///
/// Operations which are not meaningful for a variant fail with [Error::UnsupportedMediaType],
/// operations returning content fail with [Error::Unavailable] until the wrapper is populated.
pub trait Manifest {
    /// Media type of the variant, fixed at construction
    fn media_type(&self) -> &MediaType;
    fn is_loaded(&self) -> bool;
    /// Name used for display only
    fn reference(&self) -> Option<&ImageName>;

    /// Descriptor of this manifest itself
    fn get_descriptor(&self) -> Result<&Descriptor>;
    fn get_annotations(&self) -> Result<HashMap<String, String>>;

    fn get_config(&self) -> Result<&Descriptor>;
    fn get_config_digest(&self) -> Result<&oci_spec::image::Digest>;
    fn get_layers(&self) -> Result<&[Descriptor]>;

    fn get_manifest_list(&self) -> Result<&[Descriptor]>;
    /// Child manifest for `target`, `Ok(None)` when no child matches
    fn get_platform_descriptor(&self, target: &Platform) -> Result<Option<&Descriptor>>;
    fn get_platform_list(&self) -> Result<Vec<Platform>>;

    /// Copy of the decoded document
    fn get_original(&self) -> Result<Original>;
    /// Populate from a locally built document.
    ///
    /// The `mediaType` field is rewritten to [Manifest::media_type] before the bytes are produced
    /// and hashed.
    fn set_original(&mut self, orig: Original) -> Result<()>;
    /// Populate from bytes received for `desc`, which must hash to its digest
    fn load(&mut self, desc: Descriptor, raw: Vec<u8>) -> Result<()>;

    /// Exact bytes this manifest was loaded from or produced with
    fn raw_json(&self) -> Result<&[u8]>;
    /// Text for terminals and logs, not meant to be parsed back
    fn to_pretty(&self) -> Result<String>;
}

/// Decoded document of either variant
#[derive(Debug, Clone, PartialEq)]
pub enum Original {
    Image(ImageManifest),
    Index(ImageIndex),
}

impl From<ImageManifest> for Original {
    fn from(manifest: ImageManifest) -> Self {
        Original::Image(manifest)
    }
}

impl From<ImageIndex> for Original {
    fn from(index: ImageIndex) -> Self {
        Original::Index(index)
    }
}

/// Either variant, chosen from the media type of the content
#[derive(Debug, Clone)]
pub enum AnyManifest {
    Image(PlatformManifest),
    Index(ManifestIndex),
}

impl From<PlatformManifest> for AnyManifest {
    fn from(manifest: PlatformManifest) -> Self {
        AnyManifest::Image(manifest)
    }
}

impl From<ManifestIndex> for AnyManifest {
    fn from(index: ManifestIndex) -> Self {
        AnyManifest::Index(index)
    }
}

/// Fields which tell the variant of an undescribed document
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Probe {
    media_type: Option<MediaType>,
    manifests: Option<IgnoredAny>,
    config: Option<IgnoredAny>,
    layers: Option<IgnoredAny>,
}

impl Probe {
    fn kind(&self) -> Result<Kind> {
        if let Some(media_type) = &self.media_type {
            return media_types::kind_of(media_type)
                .ok_or_else(|| Error::UnsupportedMediaType(media_type.to_string()));
        }
        if self.manifests.is_some() {
            Ok(Kind::Index)
        } else if self.config.is_some() || self.layers.is_some() {
            Ok(Kind::Image)
        } else {
            Err(Error::UnsupportedMediaType(
                "document is neither an image manifest nor an image index".to_string(),
            ))
        }
    }
}

macro_rules! delegate {
    ($self:ident, $inner:ident => $call:expr) => {
        match $self {
            AnyManifest::Image($inner) => $call,
            AnyManifest::Index($inner) => $call,
        }
    };
}

impl AnyManifest {
    /// Empty wrapper of the variant announced by `media_type`
    pub fn new(media_type: &MediaType) -> Result<Self> {
        match media_types::kind_of(media_type) {
            Some(Kind::Image) => Ok(PlatformManifest::new().into()),
            Some(Kind::Index) => Ok(ManifestIndex::new().into()),
            None => Err(Error::UnsupportedMediaType(media_type.to_string())),
        }
    }

    /// Wrap bytes received from a registry for `desc`
    pub fn from_raw(desc: Descriptor, raw: Vec<u8>) -> Result<Self> {
        let mut manifest = Self::new(desc.media_type())?;
        manifest.load(desc, raw)?;
        Ok(manifest)
    }

    /// Wrap bytes without a descriptor, e.g. read from a file
    ///
    /// The variant is detected from the document and the identity is computed from the bytes.
    pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
        let probe: Probe = serde_json::from_slice(&raw)?;
        let media_type = match probe.kind()? {
            Kind::Image => media_types::image_manifest(),
            Kind::Index => media_types::image_index(),
        };
        let desc = common::descriptor(media_type, &Digest::from_buf_sha256(&raw), raw.len())?;
        Self::from_raw(desc, raw)
    }

    pub fn from_original(orig: Original) -> Result<Self> {
        match orig {
            Original::Image(manifest) => Ok(PlatformManifest::from_original(manifest)?.into()),
            Original::Index(index) => Ok(ManifestIndex::from_original(index)?.into()),
        }
    }

    /// Attach the name this manifest is displayed with
    pub fn with_reference(self, reference: ImageName) -> Self {
        match self {
            AnyManifest::Image(manifest) => manifest.with_reference(reference).into(),
            AnyManifest::Index(index) => index.with_reference(reference).into(),
        }
    }

    pub fn as_image(&self) -> Option<&PlatformManifest> {
        match self {
            AnyManifest::Image(manifest) => Some(manifest),
            AnyManifest::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<&ManifestIndex> {
        match self {
            AnyManifest::Index(index) => Some(index),
            AnyManifest::Image(_) => None,
        }
    }
}

impl Manifest for AnyManifest {
    fn media_type(&self) -> &MediaType {
        delegate!(self, m => m.media_type())
    }

    fn is_loaded(&self) -> bool {
        delegate!(self, m => m.is_loaded())
    }

    fn reference(&self) -> Option<&ImageName> {
        delegate!(self, m => m.reference())
    }

    fn get_descriptor(&self) -> Result<&Descriptor> {
        delegate!(self, m => m.get_descriptor())
    }

    fn get_annotations(&self) -> Result<HashMap<String, String>> {
        delegate!(self, m => m.get_annotations())
    }

    fn get_config(&self) -> Result<&Descriptor> {
        delegate!(self, m => m.get_config())
    }

    fn get_config_digest(&self) -> Result<&oci_spec::image::Digest> {
        delegate!(self, m => m.get_config_digest())
    }

    fn get_layers(&self) -> Result<&[Descriptor]> {
        delegate!(self, m => m.get_layers())
    }

    fn get_manifest_list(&self) -> Result<&[Descriptor]> {
        delegate!(self, m => m.get_manifest_list())
    }

    fn get_platform_descriptor(&self, target: &Platform) -> Result<Option<&Descriptor>> {
        delegate!(self, m => m.get_platform_descriptor(target))
    }

    fn get_platform_list(&self) -> Result<Vec<Platform>> {
        delegate!(self, m => m.get_platform_list())
    }

    fn get_original(&self) -> Result<Original> {
        delegate!(self, m => m.get_original())
    }

    fn set_original(&mut self, orig: Original) -> Result<()> {
        delegate!(self, m => m.set_original(orig))
    }

    fn load(&mut self, desc: Descriptor, raw: Vec<u8>) -> Result<()> {
        delegate!(self, m => m.load(desc, raw))
    }

    fn raw_json(&self) -> Result<&[u8]> {
        delegate!(self, m => m.raw_json())
    }

    fn to_pretty(&self) -> Result<String> {
        delegate!(self, m => m.to_pretty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlatformEx;
    use std::{sync::Arc, thread};

    const INDEX: &str = r#"{
  "schemaVersion": 2,
  "manifests": [
    {
      "mediaType": "application/vnd.oci.image.manifest.v1+json",
      "digest": "sha256:e692418e4cbaf90ca69d05a66403747baa33ee08806650b51fab815ad7fc331f",
      "size": 7143,
      "platform": { "architecture": "ppc64le", "os": "linux" }
    },
    {
      "mediaType": "application/vnd.oci.image.manifest.v1+json",
      "digest": "sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270",
      "size": 7682,
      "platform": { "architecture": "amd64", "os": "linux" }
    }
  ],
  "annotations": { "com.example.key1": "value1" }
}"#;

    const MANIFEST: &str = r#"{
  "schemaVersion": 2,
  "mediaType": "application/vnd.oci.image.manifest.v1+json",
  "config": {
    "mediaType": "application/vnd.oci.image.config.v1+json",
    "digest": "sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7",
    "size": 7023
  },
  "layers": [
    {
      "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
      "digest": "sha256:9834876dcfb05cb167a5c24953eba58c4ac89b1adf57f28f2f9d09af107ee8f0",
      "size": 32654
    }
  ]
}"#;

    #[test]
    fn from_bytes_detects_variant() {
        let index = AnyManifest::from_bytes(INDEX.as_bytes().to_vec()).unwrap();
        assert!(index.as_index().is_some());
        assert_eq!(index.media_type(), &MediaType::ImageIndex);
        assert_eq!(index.raw_json().unwrap(), INDEX.as_bytes());
        assert_eq!(
            Digest::from_descriptor(index.get_descriptor().unwrap()),
            Digest::from_buf_sha256(INDEX.as_bytes())
        );
        assert_eq!(index.get_manifest_list().unwrap().len(), 2);
        assert_eq!(index.get_annotations().unwrap()["com.example.key1"], "value1");

        let manifest = AnyManifest::from_bytes(MANIFEST.as_bytes().to_vec()).unwrap();
        assert!(manifest.as_image().is_some());
        assert_eq!(manifest.get_layers().unwrap().len(), 1);
        assert_eq!(
            manifest.get_config_digest().unwrap().to_string(),
            "sha256:b5b2b2c507a0944348e0303114d8d93aaaa081732b86451d9bce1f432a537bc7"
        );
    }

    #[test]
    fn from_bytes_rejects_unknown() {
        let docker = br#"{"schemaVersion":2,"mediaType":"application/vnd.docker.distribution.manifest.v2+json"}"#;
        assert!(matches!(
            AnyManifest::from_bytes(docker.to_vec()),
            Err(Error::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            AnyManifest::from_bytes(br#"{"schemaVersion":2}"#.to_vec()),
            Err(Error::UnsupportedMediaType(_))
        ));
        assert!(matches!(
            AnyManifest::from_bytes(b"not json".to_vec()),
            Err(Error::InvalidJson(_))
        ));
    }

    #[test]
    fn from_raw_dispatches_on_descriptor() {
        let raw = INDEX.as_bytes().to_vec();
        let digest = Digest::from_buf_sha256(&raw);
        let desc = common::descriptor(MediaType::ImageIndex, &digest, raw.len()).unwrap();
        let index = AnyManifest::from_raw(desc, raw.clone()).unwrap();
        assert!(matches!(index.get_config(), Err(Error::UnsupportedMediaType(_))));

        let desc = common::descriptor(MediaType::ImageConfig, &digest, raw.len()).unwrap();
        assert!(matches!(
            AnyManifest::from_raw(desc, raw),
            Err(Error::UnsupportedMediaType(_))
        ));
    }

    #[test]
    fn uniform_access() {
        let manifests: Vec<Box<dyn Manifest>> = vec![
            Box::new(AnyManifest::from_bytes(INDEX.as_bytes().to_vec()).unwrap()),
            Box::new(AnyManifest::from_bytes(MANIFEST.as_bytes().to_vec()).unwrap()),
        ];
        for manifest in &manifests {
            assert!(manifest.is_loaded());
            let digest = Digest::from_descriptor(manifest.get_descriptor().unwrap());
            assert!(digest.verify(manifest.raw_json().unwrap()).is_ok());
            // Exactly one of the two shapes is available
            assert_ne!(
                manifest.get_layers().is_ok(),
                manifest.get_manifest_list().is_ok()
            );
        }
    }

    #[test]
    fn platform_through_any() {
        let index = AnyManifest::from_bytes(INDEX.as_bytes().to_vec())
            .unwrap()
            .with_reference(ImageName::parse("registry.example.com/app:v1").unwrap());
        let target = Platform::parse_spec("linux/amd64").unwrap();
        let found = index.get_platform_descriptor(&target).unwrap().unwrap();
        assert_eq!(
            found.digest().to_string(),
            "sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270"
        );
        assert!(index.to_pretty().unwrap().contains(
            "registry.example.com/app@sha256:5b0bcabd1ed22e9fb1310cf6c2dec7cdef19f0ad69efa1f392e94a4333501270"
        ));
        assert_eq!(
            index.reference().unwrap().to_string(),
            "registry.example.com/app:v1"
        );
    }

    #[test]
    fn empty_any_manifest() {
        let mut manifest = AnyManifest::new(&MediaType::ImageManifest).unwrap();
        assert!(matches!(manifest.raw_json(), Err(Error::Unavailable(_))));
        assert!(matches!(manifest.to_pretty(), Err(Error::Unavailable(_))));

        let orig = match AnyManifest::from_bytes(MANIFEST.as_bytes().to_vec())
            .unwrap()
            .get_original()
            .unwrap()
        {
            Original::Image(orig) => orig,
            Original::Index(_) => unreachable!(),
        };
        manifest.set_original(orig.into()).unwrap();
        assert!(manifest.is_loaded());
    }

    #[test]
    fn concurrent_readers() {
        let manifest = Arc::new(AnyManifest::from_bytes(MANIFEST.as_bytes().to_vec()).unwrap());
        let expected = manifest.raw_json().unwrap().to_vec();
        thread::scope(|s| {
            for _ in 0..4 {
                let manifest = Arc::clone(&manifest);
                let expected = &expected;
                s.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(manifest.raw_json().unwrap(), &expected[..]);
                        assert_eq!(manifest.get_layers().unwrap().len(), 1);
                    }
                });
            }
        });
    }
}
