use crate::error::*;
use derive_more::Deref;
use regex::Regex;
use std::fmt;

/// Namespace of the repository
///
/// The name must satisfy the following regular expression in [OCI distribution spec 1.1.0](https://github.com/opencontainers/distribution-spec/blob/v1.1.0/spec.md):
///
/// ```regex
/// [a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*(\/[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*)*
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deref)]
pub struct Name(String);

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

lazy_static::lazy_static! {
    static ref NAME_RE: Regex = Regex::new(r"^[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*(/[a-z0-9]+((\.|_|__|-+)[a-z0-9]+)*)*$").unwrap();
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn new(name: &str) -> Result<Self> {
        if NAME_RE.is_match(name) {
            Ok(Name(name.to_string()))
        } else {
            Err(Error::InvalidName(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name() {
        assert_eq!(Name::new("library/alpine").unwrap().as_str(), "library/alpine");
        assert_eq!(Name::new("my__repo/sub-path").unwrap().as_str(), "my__repo/sub-path");
        let name = Name::new("library/alpine").unwrap();
        assert!(name.starts_with("library/"));
        assert_eq!(name.rsplit('/').next(), Some("alpine"));
        // Head must be alphanum
        assert!(Name::new("_app").is_err());
        assert!(Name::new("/app").is_err());
        // Capital letter is not allowed
        assert!(Name::new("team/App").is_err());
        assert!(Name::new("app/").is_err());
    }
}
