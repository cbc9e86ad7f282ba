//! Configuration file of the `ocimanifest` tool
//!
//! The manifest model never reads this; it is consumed by the command line front end.

use crate::error::*;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, env, fs, io, path::*};

/// Environment variable overriding the path of the configuration file
pub const CONFIG_ENV: &str = "OCIMANIFEST_CONFIG";
/// Directory under `$HOME` holding the configuration file
pub const CONFIG_DIR: &str = ".ocimanifest";
pub const CONFIG_FILENAME: &str = "config.json";

/// Highest file format version understood
pub const CONFIG_VERSION: u32 = 1;

pub const DOCKER_REGISTRY: &str = "docker.io";
pub const DOCKER_REGISTRY_DNS: &str = "registry-1.docker.io";
pub const DOCKER_REGISTRY_AUTH: &str = "https://index.docker.io/v1/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tls {
    Enabled,
    Insecure,
    Disabled,
}

/// Settings of a registry host
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hostname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<Tls>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cred_helper: Option<String>,
}

impl Host {
    pub fn is_zero(&self) -> bool {
        self == &Host::default()
    }
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn is_zero_u32(n: &u32) -> bool {
    *n == 0
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// File this config was loaded from and is saved to
    #[serde(skip)]
    pub filename: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub version: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub hosts: BTreeMap<String, Host>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_default: Option<Host>,
    /// Limit of blob chunks held in memory
    #[serde(default, skip_serializing_if = "is_zero")]
    pub blob_limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inc_docker_cert: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inc_docker_cred: Option<bool>,
}

/// Default path of the configuration file, `$OCIMANIFEST_CONFIG` or `~/.ocimanifest/config.json`
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    let dirs = directories::BaseDirs::new().ok_or(Error::NoValidHomeDirectory)?;
    Ok(dirs.home_dir().join(CONFIG_DIR).join(CONFIG_FILENAME))
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a configuration, an empty or blank input is an empty configuration
    pub fn from_reader(mut reader: impl io::Read) -> Result<Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        if buf.iter().all(u8::is_ascii_whitespace) {
            return Ok(Config::default());
        }
        let mut config: Config = serde_json::from_slice(&buf)?;
        if config.version > CONFIG_VERSION {
            return Err(Error::UnsupportedConfigVersion(config.version));
        }
        config.normalize_hosts();
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let f = fs::File::open(path)?;
        let mut config = Self::from_reader(io::BufReader::new(f))?;
        config.filename = Some(path.to_owned());
        Ok(config)
    }

    /// Load from [config_path], a missing file yields an empty configuration bound to that path
    pub fn load_default() -> Result<Self> {
        let path = config_path()?;
        match Self::load_file(&path) {
            Err(Error::UnknownIo(e)) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No config file at {}", path.display());
                Ok(Config {
                    filename: Some(path),
                    ..Config::default()
                })
            }
            other => other,
        }
    }

    /// Write back to the file this configuration is bound to
    pub fn save(&self) -> Result<()> {
        let path = self.filename.as_ref().ok_or(Error::MissingConfigFilename)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        let f = fs::File::create(path)?;
        serde_json::to_writer_pretty(f, self)?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    pub fn set_blob_limit(&mut self, limit: u64) {
        self.blob_limit = limit;
    }

    /// Credential helper used for hosts without their own, an empty string unsets it
    pub fn set_default_cred_helper(&mut self, helper: &str) {
        let helper = if helper.is_empty() {
            None
        } else {
            Some(helper.to_string())
        };
        if let Some(host) = &mut self.host_default {
            host.cred_helper = helper;
        } else if let Some(helper) = helper {
            self.host_default = Some(Host {
                cred_helper: Some(helper),
                ..Host::default()
            });
        }
        if self.host_default.as_ref().map_or(false, Host::is_zero) {
            self.host_default = None;
        }
    }

    /// Enabled is the default and is not written out
    pub fn set_docker_cert(&mut self, enabled: bool) {
        self.inc_docker_cert = if enabled { None } else { Some(false) };
    }

    /// Enabled is the default and is not written out
    pub fn set_docker_cred(&mut self, enabled: bool) {
        self.inc_docker_cred = if enabled { None } else { Some(false) };
    }

    fn normalize_hosts(&mut self) {
        let hosts = std::mem::take(&mut self.hosts);
        for (key, mut host) in hosts {
            if host.name.is_empty() {
                host.name = key.clone();
            }
            if host.hostname.is_empty() {
                host.hostname = key.clone();
            }
            if host.tls.is_none() {
                host.tls = Some(Tls::Enabled);
            }
            if key == DOCKER_REGISTRY_DNS || key == DOCKER_REGISTRY || key == DOCKER_REGISTRY_AUTH {
                host.name = DOCKER_REGISTRY.to_string();
                if host.hostname == key {
                    host.hostname = DOCKER_REGISTRY_DNS.to_string();
                }
                if host.cred_host.as_deref() == Some(key.as_str()) {
                    host.cred_host = Some(DOCKER_REGISTRY_AUTH.to_string());
                }
            }
            self.hosts.insert(host.name.clone(), host);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use std::io::Write;

    #[test]
    fn empty_input() {
        let config = Config::from_reader(&b""[..]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn whitespace_input() {
        let config = Config::from_reader(&b" \n\t"[..]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn truncated_input() {
        let input = br#"{"version": 1, "hosts": {"registry.example.com": {"credHelper": "x"}"#;
        assert!(matches!(
            Config::from_reader(&input[..]),
            Err(Error::InvalidJson(_))
        ));
    }

    #[test]
    fn unsupported_version() {
        assert!(matches!(
            Config::from_reader(&br#"{"version": 2}"#[..]),
            Err(Error::UnsupportedConfigVersion(2))
        ));
    }

    #[test]
    fn normalize_hosts() {
        let input = br#"{
          "version": 1,
          "hosts": {
            "registry.example.com": {},
            "mirror": { "hostname": "mirror.example.com:5000", "tls": "insecure" },
            "registry-1.docker.io": { "credHelper": "docker-credential-pass" }
          }
        }"#;
        let config = Config::from_reader(&input[..]).unwrap();
        assert_eq!(
            config.hosts,
            btreemap! {
                "registry.example.com".to_string() => Host {
                    name: "registry.example.com".to_string(),
                    hostname: "registry.example.com".to_string(),
                    tls: Some(Tls::Enabled),
                    ..Host::default()
                },
                "mirror".to_string() => Host {
                    name: "mirror".to_string(),
                    hostname: "mirror.example.com:5000".to_string(),
                    tls: Some(Tls::Insecure),
                    ..Host::default()
                },
                "docker.io".to_string() => Host {
                    name: "docker.io".to_string(),
                    hostname: "registry-1.docker.io".to_string(),
                    tls: Some(Tls::Enabled),
                    cred_helper: Some("docker-credential-pass".to_string()),
                    ..Host::default()
                },
            }
        );
    }

    #[test]
    fn setters() {
        let mut config = Config::new();
        config.set_default_cred_helper("docker-credential-pass");
        assert_eq!(
            config.host_default.as_ref().unwrap().cred_helper.as_deref(),
            Some("docker-credential-pass")
        );
        config.set_default_cred_helper("");
        assert_eq!(config.host_default, None);

        config.set_docker_cred(false);
        assert_eq!(config.inc_docker_cred, Some(false));
        config.set_docker_cred(true);
        assert_eq!(config.inc_docker_cred, None);
        config.set_docker_cert(false);
        assert_eq!(config.inc_docker_cert, Some(false));

        config.set_blob_limit(1 << 20);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "blobLimit": 1048576, "incDockerCert": false })
        );
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);

        let mut config = Config {
            filename: Some(path.clone()),
            version: CONFIG_VERSION,
            ..Config::default()
        };
        config.set_blob_limit(4096);
        config.set_docker_cred(false);
        config.save().unwrap();

        let loaded = Config::load_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            Config::load_file(&missing),
            Err(Error::UnknownIo(_))
        ));

        let broken = dir.path().join("broken.json");
        let mut f = fs::File::create(&broken).unwrap();
        f.write_all(b"{ not json").unwrap();
        assert!(matches!(
            Config::load_file(&broken),
            Err(Error::InvalidJson(_))
        ));

        assert!(matches!(
            Config::new().save(),
            Err(Error::MissingConfigFilename)
        ));
    }
}
