use crate::{error::*, Digest, ImageName};
use oci_spec::image::{Descriptor, DescriptorBuilder, ImageIndex, ImageManifest, MediaType};
use serde::{de::DeserializeOwned, Serialize};

/// A JSON document which can be wrapped by [Common]
pub(crate) trait Schema: Serialize + DeserializeOwned + Clone {
    fn media_type_field(&self) -> Option<&MediaType>;
    fn set_media_type_field(&mut self, media_type: MediaType);
}

impl Schema for ImageManifest {
    fn media_type_field(&self) -> Option<&MediaType> {
        self.media_type().as_ref()
    }
    fn set_media_type_field(&mut self, media_type: MediaType) {
        self.set_media_type(Some(media_type));
    }
}

impl Schema for ImageIndex {
    fn media_type_field(&self) -> Option<&MediaType> {
        self.media_type().as_ref()
    }
    fn set_media_type_field(&mut self, media_type: MediaType) {
        self.set_media_type(Some(media_type));
    }
}

#[derive(Debug, Clone)]
struct Content<T> {
    desc: Descriptor,
    raw: Vec<u8>,
    orig: T,
}

/// State shared by every manifest variant
///
/// The identity descriptor, the raw bytes and the decoded document are stored together,
/// so a wrapper is either empty or fully loaded and `raw` is never empty once loaded.
#[derive(Debug, Clone)]
pub(crate) struct Common<T> {
    media_type: MediaType,
    reference: Option<ImageName>,
    content: Option<Content<T>>,
}

pub(crate) fn descriptor(media_type: MediaType, digest: &Digest, size: usize) -> Result<Descriptor> {
    let digest: oci_spec::image::Digest = digest.try_into()?;
    Ok(DescriptorBuilder::default()
        .media_type(media_type)
        .digest(digest)
        .size(size as u64)
        .build()?)
}

impl<T: Schema> Common<T> {
    pub fn new(media_type: MediaType) -> Self {
        Self {
            media_type,
            reference: None,
            content: None,
        }
    }

    pub fn set_reference(&mut self, reference: ImageName) {
        self.reference = Some(reference);
    }

    pub fn reference(&self) -> Option<&ImageName> {
        self.reference.as_ref()
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn is_loaded(&self) -> bool {
        self.content.is_some()
    }

    fn content(&self) -> Result<&Content<T>> {
        self.content.as_ref().ok_or_else(|| {
            Error::Unavailable(format!("no {} has been loaded", self.media_type))
        })
    }

    pub fn descriptor(&self) -> Result<&Descriptor> {
        Ok(&self.content()?.desc)
    }

    pub fn raw(&self) -> Result<&[u8]> {
        Ok(&self.content()?.raw)
    }

    pub fn original(&self) -> Result<&T> {
        Ok(&self.content()?.orig)
    }

    fn ensure_empty(&self) -> Result<()> {
        if self.is_loaded() {
            Err(Error::AlreadyLoaded(self.media_type.clone()))
        } else {
            Ok(())
        }
    }

    /// Serialize a locally constructed document, forcing its media type to this variant
    pub fn set_original(&mut self, mut orig: T) -> Result<()> {
        self.ensure_empty()?;
        if orig.media_type_field() != Some(&self.media_type) {
            log::warn!(
                "Rewrite mediaType {:?} to {}",
                orig.media_type_field().map(|m| m.to_string()),
                self.media_type
            );
            orig.set_media_type_field(self.media_type.clone());
        }
        let raw = serde_json::to_vec(&orig)?;
        let digest = Digest::from_buf_sha256(&raw);
        let desc = descriptor(self.media_type.clone(), &digest, raw.len())?;
        log::debug!("Set {} {} ({} bytes)", self.media_type, digest, raw.len());
        self.content = Some(Content { desc, raw, orig });
        Ok(())
    }

    /// Decode bytes received for `desc` and keep them verbatim
    pub fn load(&mut self, desc: Descriptor, raw: Vec<u8>) -> Result<()> {
        self.ensure_empty()?;
        if desc.media_type() != &self.media_type {
            return Err(Error::UnsupportedMediaType(format!(
                "expected {}, descriptor announces {}",
                self.media_type,
                desc.media_type()
            )));
        }
        if desc.size() != raw.len() as u64 {
            return Err(Error::SizeMismatch {
                expected: desc.size(),
                actual: raw.len() as u64,
            });
        }
        Digest::from_descriptor(&desc).verify(&raw)?;
        let orig: T = serde_json::from_slice(&raw)?;
        if let Some(media_type) = orig.media_type_field() {
            if media_type != &self.media_type {
                return Err(Error::UnsupportedMediaType(format!(
                    "expected {}, document declares {}",
                    self.media_type, media_type
                )));
            }
        }
        log::debug!("Load {} {} ({} bytes)", self.media_type, desc.digest(), raw.len());
        self.content = Some(Content { desc, raw, orig });
        Ok(())
    }
}
