use super::{common::Common, Manifest, Original};
use crate::{error::*, media_types, ImageName};
use oci_spec::image::{Descriptor, ImageManifest, MediaType, Platform};
use std::collections::HashMap;

/// Single-platform OCI image manifest, a config and ordered layers
#[derive(Debug, Clone)]
pub struct PlatformManifest {
    common: Common<ImageManifest>,
}

impl Default for PlatformManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformManifest {
    /// Create an empty wrapper, to be populated by [Manifest::set_original] or [Manifest::load]
    pub fn new() -> Self {
        Self {
            common: Common::new(media_types::image_manifest()),
        }
    }

    /// Attach the name this manifest is displayed with
    pub fn with_reference(mut self, reference: ImageName) -> Self {
        self.common.set_reference(reference);
        self
    }

    pub fn from_original(orig: ImageManifest) -> Result<Self> {
        let mut manifest = Self::new();
        manifest.set_original(orig.into())?;
        Ok(manifest)
    }

    /// Wrap bytes received from a registry for `desc`
    pub fn from_raw(desc: Descriptor, raw: Vec<u8>) -> Result<Self> {
        let mut manifest = Self::new();
        manifest.load(desc, raw)?;
        Ok(manifest)
    }

    /// Decoded document
    pub fn image_manifest(&self) -> Result<&ImageManifest> {
        self.common.original()
    }

    fn unsupported(&self, what: &str) -> Error {
        Error::UnsupportedMediaType(format!(
            "{} not available for media type {}",
            what,
            self.common.media_type()
        ))
    }
}

impl Manifest for PlatformManifest {
    fn media_type(&self) -> &MediaType {
        self.common.media_type()
    }

    fn is_loaded(&self) -> bool {
        self.common.is_loaded()
    }

    fn reference(&self) -> Option<&ImageName> {
        self.common.reference()
    }

    fn get_descriptor(&self) -> Result<&Descriptor> {
        self.common.descriptor()
    }

    fn get_annotations(&self) -> Result<HashMap<String, String>> {
        Ok(self
            .common
            .original()?
            .annotations()
            .clone()
            .unwrap_or_default())
    }

    fn get_config(&self) -> Result<&Descriptor> {
        Ok(self.common.original()?.config())
    }

    fn get_config_digest(&self) -> Result<&oci_spec::image::Digest> {
        Ok(self.get_config()?.digest())
    }

    fn get_layers(&self) -> Result<&[Descriptor]> {
        Ok(self.common.original()?.layers().as_slice())
    }

    fn get_manifest_list(&self) -> Result<&[Descriptor]> {
        Err(self.unsupported("platform descriptor list"))
    }

    fn get_platform_descriptor(&self, _target: &Platform) -> Result<Option<&Descriptor>> {
        Err(self.unsupported("platform lookup"))
    }

    fn get_platform_list(&self) -> Result<Vec<Platform>> {
        Err(self.unsupported("platform list"))
    }

    fn get_original(&self) -> Result<Original> {
        Ok(Original::Image(self.common.original()?.clone()))
    }

    fn set_original(&mut self, orig: Original) -> Result<()> {
        match orig {
            Original::Image(orig) => self.common.set_original(orig),
            Original::Index(_) => Err(Error::UnsupportedMediaType(format!(
                "an image index cannot be set on {}",
                self.common.media_type()
            ))),
        }
    }

    fn load(&mut self, desc: Descriptor, raw: Vec<u8>) -> Result<()> {
        self.common.load(desc, raw)
    }

    fn raw_json(&self) -> Result<&[u8]> {
        self.common.raw()
    }

    fn to_pretty(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self.common.original()?)?;
        out.push('\n');
        Ok(out)
    }
}
