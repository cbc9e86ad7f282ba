use oci_spec::image::MediaType;

/// The media type of a single-platform OCI image manifest
pub fn image_manifest() -> MediaType {
    MediaType::ImageManifest
}

/// The media type of a multi-platform OCI image index
pub fn image_index() -> MediaType {
    MediaType::ImageIndex
}

/// Shape of the document a media type announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Config and layers for one platform
    Image,
    /// Child manifests by digest and platform
    Index,
}

/// Classify a media type, `None` if it is not a manifest media type handled here
pub fn kind_of(media_type: &MediaType) -> Option<Kind> {
    match media_type {
        MediaType::ImageManifest => Some(Kind::Image),
        MediaType::ImageIndex => Some(Kind::Index),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify() {
        assert_eq!(kind_of(&image_manifest()), Some(Kind::Image));
        assert_eq!(kind_of(&image_index()), Some(Kind::Index));
        assert_eq!(
            kind_of(&MediaType::from("application/vnd.oci.image.index.v1+json")),
            Some(Kind::Index)
        );
        assert_eq!(kind_of(&MediaType::ImageConfig), None);
        assert_eq!(
            kind_of(&MediaType::Other("application/octet-stream".to_string())),
            None
        );
    }
}
