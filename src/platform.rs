//! Platform of a child manifest, and selection of children by platform

use crate::error::*;
use oci_spec::image::*;

/// Extension of [Platform]
pub trait PlatformEx: Sized {
    /// Parse `os/arch[/variant][,os_version]`, e.g. `linux/arm64/v8` or `windows/amd64,10.0.17763`
    fn parse_spec(spec: &str) -> Result<Self>;

    /// Inverse of [PlatformEx::parse_spec] without the OS version
    fn to_spec_string(&self) -> String;

    /// Create [Platform] using [std::cfg] macro
    fn from_cfg_macro() -> Result<Self>;

    /// Create [Platform] from target-triple.
    ///
    /// This does not support unnormalized target triple which LLVM may accept,
    /// e.g. `x86_64`, `x86_64-linux`, and so on.
    fn from_target_triple(target_triple: &str) -> Result<Self>;

    /// Variant with the implicit defaults of ARM filled in
    fn normalized_variant(&self) -> Option<String>;
}

fn build(os: Os, arch: Arch, variant: Option<String>, os_version: Option<String>) -> Result<Platform> {
    let mut builder = PlatformBuilder::default().os(os).architecture(arch);
    if let Some(variant) = variant {
        builder = builder.variant(variant);
    }
    if let Some(os_version) = os_version {
        builder = builder.os_version(os_version);
    }
    Ok(builder.build()?)
}

impl PlatformEx for Platform {
    fn parse_spec(spec: &str) -> Result<Self> {
        let err = || Error::InvalidPlatform(spec.to_string());
        let (spec_part, os_version) = match spec.split_once(',') {
            Some((head, version)) if !version.is_empty() => (head, Some(version.to_string())),
            Some(_) => return Err(err()),
            None => (spec, None),
        };
        let parts: Vec<&str> = spec_part.split('/').collect();
        let (os, arch, variant) = match parts[..] {
            [os, arch] => (os, arch, None),
            [os, arch, variant] if !variant.is_empty() => (os, arch, Some(variant.to_string())),
            _ => return Err(err()),
        };
        if os.is_empty() || arch.is_empty() {
            return Err(err());
        }
        build(Os::from(os), Arch::from(arch), variant, os_version)
    }

    fn to_spec_string(&self) -> String {
        match self.variant() {
            Some(variant) => format!("{}/{}/{}", self.os(), self.architecture(), variant),
            None => format!("{}/{}", self.os(), self.architecture()),
        }
    }

    fn from_cfg_macro() -> Result<Self> {
        let (arch, variant): (Arch, Option<String>) = if cfg!(target_arch = "x86_64") {
            (Arch::Amd64, None)
        } else if cfg!(target_arch = "x86") {
            (Arch::i386, None)
        } else if cfg!(target_arch = "aarch64") {
            (Arch::ARM64, Some("v8".to_string()))
        } else if cfg!(target_arch = "arm") {
            (Arch::ARM, Some("v7".to_string()))
        } else {
            return Err(Error::InvalidPlatform(std::env::consts::ARCH.to_string()));
        };
        let os = if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "windows") {
            Os::Windows
        } else if cfg!(target_os = "macos") {
            Os::Darwin
        } else {
            return Err(Error::InvalidPlatform(std::env::consts::OS.to_string()));
        };
        build(os, arch, variant, None)
    }

    fn from_target_triple(target_triple: &str) -> Result<Self> {
        let err = || Error::InvalidTargetTriple(target_triple.to_string());
        let parts: Vec<&str> = target_triple.split('-').collect();
        let (arch, os) = match parts[..] {
            [arch, _vender, os, _env] => (arch, os),
            [arch, os, _env] => (arch, os),
            [arch, _vender, os] => (arch, os),
            _ => return Err(err()),
        };
        let (arch, variant) = match arch {
            "x86_64" => (Arch::Amd64, None),
            "i686" => (Arch::i386, None),
            "aarch64" => (Arch::ARM64, Some("v8".to_string())),
            _ => return Err(err()),
        };
        let os = match os {
            "linux" => Os::Linux,
            "windows" => Os::Windows,
            "darwin" => Os::Darwin,
            _ => return Err(err()),
        };
        build(os, arch, variant, None)
    }

    fn normalized_variant(&self) -> Option<String> {
        match (self.architecture(), self.variant()) {
            (_, Some(variant)) => Some(variant.clone()),
            (Arch::ARM64, None) => Some("v8".to_string()),
            (Arch::ARM, None) => Some("v7".to_string()),
            _ => None,
        }
    }
}

/// Select children of an index by platform
///
/// [crate::ManifestIndex] delegates to this, so callers may plug in their own policy.
pub trait PlatformMatcher {
    /// Best candidate for `target`, `None` when nothing matches
    fn match_platform<'a>(
        &self,
        target: &Platform,
        candidates: &'a [Descriptor],
    ) -> Option<&'a Descriptor>;

    /// Distinct platforms found in `candidates`
    fn list_platforms(&self, candidates: &[Descriptor]) -> Vec<Platform>;
}

/// OS and architecture must agree. Variant and OS version are compared only if the target names them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMatcher;

impl DefaultMatcher {
    pub fn matches(&self, target: &Platform, candidate: &Platform) -> bool {
        if target.os() != candidate.os() || target.architecture() != candidate.architecture() {
            return false;
        }
        if target.variant().is_some() && target.normalized_variant() != candidate.normalized_variant() {
            return false;
        }
        match (target.os_version(), candidate.os_version()) {
            (Some(want), Some(have)) => {
                // major.minor.build must agree, the revision may differ
                let want: Vec<&str> = want.split('.').take(3).collect();
                let have: Vec<&str> = have.split('.').take(want.len()).collect();
                want == have
            }
            _ => true,
        }
    }
}

fn is_attestation(platform: &Platform) -> bool {
    platform.os().to_string() == "unknown" && platform.architecture().to_string() == "unknown"
}

impl PlatformMatcher for DefaultMatcher {
    fn match_platform<'a>(
        &self,
        target: &Platform,
        candidates: &'a [Descriptor],
    ) -> Option<&'a Descriptor> {
        candidates.iter().find(|desc| match desc.platform() {
            Some(platform) => self.matches(target, platform),
            None => false,
        })
    }

    fn list_platforms(&self, candidates: &[Descriptor]) -> Vec<Platform> {
        let mut platforms: Vec<Platform> = Vec::new();
        for platform in candidates.iter().filter_map(|desc| desc.platform().as_ref()) {
            if is_attestation(platform) || platforms.contains(platform) {
                continue;
            }
            platforms.push(platform.clone());
        }
        platforms
    }
}
