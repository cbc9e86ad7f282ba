use super::{common::Common, Manifest, Original};
use crate::{
    error::*,
    media_types,
    platform::{DefaultMatcher, PlatformEx, PlatformMatcher},
    Digest, ImageName,
};
use oci_spec::image::{Descriptor, ImageIndex, MediaType, Platform};
use std::collections::{BTreeMap, HashMap};

/// Multi-platform OCI image index, child manifests selected by platform
#[derive(Debug, Clone)]
pub struct ManifestIndex {
    common: Common<ImageIndex>,
}

impl Default for ManifestIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ManifestIndex {
    /// Create an empty wrapper, to be populated by [Manifest::set_original] or [Manifest::load]
    pub fn new() -> Self {
        Self {
            common: Common::new(media_types::image_index()),
        }
    }

    /// Attach the name this index is displayed with
    pub fn with_reference(mut self, reference: ImageName) -> Self {
        self.common.set_reference(reference);
        self
    }

    pub fn from_original(orig: ImageIndex) -> Result<Self> {
        let mut index = Self::new();
        index.set_original(orig.into())?;
        Ok(index)
    }

    /// Wrap bytes received from a registry for `desc`
    pub fn from_raw(desc: Descriptor, raw: Vec<u8>) -> Result<Self> {
        let mut index = Self::new();
        index.load(desc, raw)?;
        Ok(index)
    }

    /// Decoded document
    pub fn image_index(&self) -> Result<&ImageIndex> {
        self.common.original()
    }

    /// Same as [Manifest::get_platform_descriptor] with another selection policy
    pub fn get_platform_descriptor_with<'a, M: PlatformMatcher>(
        &'a self,
        target: &Platform,
        matcher: &M,
    ) -> Result<Option<&'a Descriptor>> {
        let children = self.get_manifest_list()?;
        Ok(matcher.match_platform(target, children))
    }

    /// Same as [Manifest::get_platform_list] with another selection policy
    pub fn get_platform_list_with<M: PlatformMatcher>(&self, matcher: &M) -> Result<Vec<Platform>> {
        let children = self.get_manifest_list()?;
        Ok(matcher.list_platforms(children))
    }

    fn unsupported(&self, what: &str) -> Error {
        Error::UnsupportedMediaType(format!(
            "{} not available for media type {}",
            what,
            self.common.media_type()
        ))
    }
}

/// Two columns, the labels padded to a common width
#[derive(Default)]
struct Table {
    rows: Vec<(String, String)>,
}

impl Table {
    fn row(&mut self, label: &str, value: impl ToString) {
        self.rows.push((label.to_string(), value.to_string()));
    }

    fn blank(&mut self) {
        self.row("", "");
    }

    fn annotations(&mut self, indent: &str, annotations: &Option<HashMap<String, String>>) {
        let annotations = match annotations {
            Some(annotations) if !annotations.is_empty() => annotations,
            _ => return,
        };
        self.row(&format!("{}Annotations:", indent), "");
        let sorted: BTreeMap<_, _> = annotations.iter().collect();
        for (key, value) in sorted {
            self.row(&format!("{}  {}:", indent, key), value);
        }
    }

    fn render(&self) -> String {
        let width = self.rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 1;
        let mut out = String::new();
        for (label, value) in &self.rows {
            let line = format!("{:<width$}{}", label, value, width = width);
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl Manifest for ManifestIndex {
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
        Err(self.unsupported("config"))
    }

    fn get_config_digest(&self) -> Result<&oci_spec::image::Digest> {
        Err(self.unsupported("config digest"))
    }

    fn get_layers(&self) -> Result<&[Descriptor]> {
        Err(self.unsupported("layers"))
    }

    fn get_manifest_list(&self) -> Result<&[Descriptor]> {
        Ok(self.common.original()?.manifests().as_slice())
    }

    fn get_platform_descriptor(&self, target: &Platform) -> Result<Option<&Descriptor>> {
        self.get_platform_descriptor_with(target, &DefaultMatcher)
    }

    fn get_platform_list(&self) -> Result<Vec<Platform>> {
        self.get_platform_list_with(&DefaultMatcher)
    }

    fn get_original(&self) -> Result<Original> {
        Ok(Original::Index(self.common.original()?.clone()))
    }

    fn set_original(&mut self, orig: Original) -> Result<()> {
        match orig {
            Original::Index(orig) => self.common.set_original(orig),
            Original::Image(_) => Err(Error::UnsupportedMediaType(format!(
                "an image manifest cannot be set on {}",
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
        let desc = self.common.descriptor()?;
        let index = self.common.original()?;
        let reference = self.common.reference();

        let mut table = Table::default();
        if let Some(name) = reference {
            table.row("Name:", name.input());
        }
        table.row("MediaType:", desc.media_type());
        table.row("Digest:", desc.digest());
        table.annotations("", index.annotations());
        table.blank();
        table.row("Manifests:", "");

        for child in index.manifests() {
            table.blank();
            match reference {
                Some(name) => table.row(
                    "  Name:",
                    name.with_digest(Digest::from(child.digest())).common_name(),
                ),
                None => table.row("  Digest:", child.digest()),
            }
            table.row("  MediaType:", child.media_type());
            if let Some(platform) = child
                .platform()
                .as_ref()
                .filter(|platform| !platform.os().to_string().is_empty())
            {
                table.row("  Platform:", platform.to_spec_string());
                if let Some(os_version) = platform.os_version() {
                    table.row("  OSVersion:", os_version);
                }
                if let Some(os_features) = platform.os_features() {
                    if !os_features.is_empty() {
                        table.row("  OSFeatures:", os_features.join(", "));
                    }
                }
            }
            if let Some(urls) = child.urls() {
                if !urls.is_empty() {
                    table.row("  URLs:", urls.join(", "));
                }
            }
            table.annotations("  ", child.annotations());
        }
        Ok(table.render())
    }
}
