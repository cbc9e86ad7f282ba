use crate::{error::*, Digest, Name, Reference};
use std::{
    fmt,
    hash::{Hash, Hasher},
};

pub const DOCKER_HUB: &str = "docker.io";

/// Human-facing name of a manifest, `hostname[:port]/name[:tag][@digest]`
///
/// This is used to display where a manifest came from.
/// It never takes part in the identity of the manifest, which is its digest.
///
/// Equality and hashing compare the normalized parts,
/// `ubuntu` and `docker.io/library/ubuntu:latest` are the same name.
#[derive(Debug, Clone)]
pub struct ImageName {
    pub hostname: String,
    pub port: Option<u16>,
    pub name: Name,
    pub tag: Option<Reference>,
    pub digest: Option<Digest>,
    /// Text as the user wrote it
    input: String,
}

impl ImageName {
    fn key(&self) -> (&str, Option<u16>, &Name, Option<&Reference>, Option<&Digest>) {
        (
            self.hostname.as_str(),
            self.port,
            &self.name,
            self.tag.as_ref(),
            self.digest.as_ref(),
        )
    }
}

impl PartialEq for ImageName {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ImageName {}

impl Hash for ImageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.common_name())
    }
}

impl ImageName {
    pub fn parse(input: &str) -> Result<Self> {
        let (rest, digest) = match input.split_once('@') {
            Some((rest, digest)) => (rest, Some(Digest::new(digest)?)),
            None => (input, None),
        };

        // The first component is a registry host only if it looks like one,
        // otherwise the whole path lives on Docker Hub.
        let (host, path) = match rest.split_once('/') {
            Some((head, tail))
                if head.contains('.') || head.contains(':') || head == "localhost" =>
            {
                (head, tail)
            }
            _ => (DOCKER_HUB, rest),
        };
        let (hostname, port) = if let Some((hostname, port)) = host.split_once(':') {
            (hostname, Some(str::parse(port)?))
        } else {
            (host, None)
        };

        let (path, tag) = match path.split_once(':') {
            Some((path, tag)) => (path, Some(Reference::new(tag)?)),
            None => (path, None),
        };
        let name = if hostname == DOCKER_HUB && !path.contains('/') {
            Name::new(&format!("library/{}", path))?
        } else {
            Name::new(path)?
        };
        let tag = match (tag, &digest) {
            (None, None) => Some(Reference::new("latest")?),
            (tag, _) => tag,
        };

        Ok(ImageName {
            hostname: hostname.to_string(),
            port,
            name,
            tag,
            digest,
            input: input.to_string(),
        })
    }

    /// The text this name was parsed from, before normalization
    pub fn input(&self) -> &str {
        &self.input
    }

    /// `hostname[:port]/name`
    pub fn repository(&self) -> String {
        if let Some(port) = self.port {
            format!("{}:{}/{}", self.hostname, port, self.name)
        } else {
            format!("{}/{}", self.hostname, self.name)
        }
    }

    /// Name for display, the digest is preferred over the tag when both are known
    pub fn common_name(&self) -> String {
        match (&self.digest, &self.tag) {
            (Some(digest), _) => format!("{}@{}", self.repository(), digest),
            (None, Some(tag)) => format!("{}:{}", self.repository(), tag),
            (None, None) => self.repository(),
        }
    }

    /// Same repository, pointing at `digest` instead of the tag
    pub fn with_digest(&self, digest: Digest) -> Self {
        let mut name = ImageName {
            tag: None,
            digest: Some(digest),
            ..self.clone()
        };
        name.input = name.common_name();
        name
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn image_name() -> Result<()> {
        let name = ImageName::parse("registry.example.com/app:v1")?;
        assert_eq!(
            name,
            ImageName {
                hostname: "registry.example.com".to_string(),
                port: None,
                name: Name::new("app")?,
                tag: Some(Reference::new("v1")?),
                digest: None,
                input: "registry.example.com/app:v1".to_string(),
            }
        );

        let name = ImageName::parse("localhost:5000/test_repo")?;
        assert_eq!(
            name,
            ImageName {
                hostname: "localhost".to_string(),
                port: Some(5000),
                name: Name::new("test_repo")?,
                tag: Some(Reference::new("latest")?),
                digest: None,
                input: "localhost:5000/test_repo".to_string(),
            }
        );

        let name = ImageName::parse("ubuntu:20.04")?;
        assert_eq!(name.hostname, DOCKER_HUB);
        assert_eq!(name.name.as_str(), "library/ubuntu");
        assert_eq!(name.common_name(), "docker.io/library/ubuntu:20.04");

        let name = ImageName::parse("team/tool")?;
        assert_eq!(name.common_name(), "docker.io/team/tool:latest");
        assert_eq!(name.input(), "team/tool");
        assert!(name.name.starts_with("team/"));

        // Spelling does not matter for equality
        assert_eq!(ImageName::parse("ubuntu")?, ImageName::parse("docker.io/library/ubuntu:latest")?);
        assert_eq!(ImageName::parse("ubuntu")?.input(), "ubuntu");

        Ok(())
    }

    #[test]
    fn with_digest() -> Result<()> {
        let digest = Digest::from_buf_sha256(b"child");
        let name = ImageName::parse("registry.example.com/app:v1")?;
        assert_eq!(
            name.with_digest(digest.clone()).common_name(),
            format!("registry.example.com/app@{}", digest)
        );
        assert_eq!(
            name.with_digest(digest.clone()).input(),
            format!("registry.example.com/app@{}", digest)
        );
        // The original stays untouched
        assert_eq!(name.to_string(), "registry.example.com/app:v1");

        let pinned = ImageName::parse(&format!("localhost:5000/app@{}", digest))?;
        assert_eq!(pinned.tag, None);
        assert_eq!(pinned.digest, Some(digest.clone()));
        assert_eq!(pinned.common_name(), format!("localhost:5000/app@{}", digest));
        Ok(())
    }

    #[test]
    fn invalid() {
        assert!(ImageName::parse("registry.example.com/App:v1").is_err());
        assert!(ImageName::parse("localhost:port/app").is_err());
        assert!(ImageName::parse("app@not-a-digest").is_err());
    }
}
