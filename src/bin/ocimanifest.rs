use anyhow::{bail, Context};
use clap::Parser;
use ocimanifest::{config::Config, AnyManifest, Digest, ImageName, Manifest, Platform, PlatformEx};
use std::{
    fs,
    io::{self, Read, Write},
    path::*,
};

#[derive(Debug, Parser)]
#[command(version, about = "Inspect OCI image manifests and indexes")]
enum Opt {
    /// Show a manifest or an index in human readable form
    Inspect {
        /// Path to the manifest JSON, `-` for stdin
        input: PathBuf,

        /// Name to display the manifest with, e.g. `registry.example.com/app:v1`
        #[arg(short = 'n', long = "name")]
        name: Option<String>,

        /// Print the bytes as they are
        #[arg(long = "raw")]
        raw: bool,
    },

    /// Print the digest and size of a manifest
    Digest {
        /// Path to the manifest JSON, `-` for stdin
        input: PathBuf,
    },

    /// List the platforms of an index
    Platforms {
        /// Path to the index JSON, `-` for stdin
        input: PathBuf,
    },

    /// Select the child manifest of an index for a platform
    Resolve {
        /// Path to the index JSON, `-` for stdin
        input: PathBuf,

        /// Target platform as `os/arch[/variant]`, the running platform if not set
        #[arg(short = 'p', long = "platform")]
        platform: Option<String>,
    },

    /// Read or modify the configuration file
    #[command(subcommand)]
    Config(ConfigOpt),
}

#[derive(Debug, clap::Subcommand)]
enum ConfigOpt {
    /// Show the configuration
    Get,

    /// Set configuration options used in future executions
    Set {
        /// Limit for blob chunks held in memory
        #[arg(long = "blob-limit")]
        blob_limit: Option<u64>,

        /// Default credential helper, empty to unset
        #[arg(long = "default-cred-helper")]
        default_cred_helper: Option<String>,

        /// Load certificates from docker
        #[arg(long = "docker-cert", value_name = "BOOL")]
        docker_cert: Option<bool>,

        /// Load credentials from docker
        #[arg(long = "docker-cred", value_name = "BOOL")]
        docker_cred: Option<bool>,
    },
}

fn read_input(input: &Path) -> anyhow::Result<Vec<u8>> {
    if input.as_os_str() == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(input).with_context(|| format!("Cannot read {}", input.display()))
    }
}

fn load(input: &Path) -> anyhow::Result<AnyManifest> {
    let raw = read_input(input)?;
    let manifest = AnyManifest::from_bytes(raw)?;
    log::debug!(
        "Loaded {} from {}",
        manifest.media_type(),
        input.display()
    );
    Ok(manifest)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match Opt::parse() {
        Opt::Inspect { input, name, raw } => {
            let mut manifest = load(&input)?;
            if let Some(name) = name {
                manifest = manifest.with_reference(ImageName::parse(&name)?);
            }
            let mut stdout = io::stdout();
            if raw {
                stdout.write_all(manifest.raw_json()?)?;
            } else {
                stdout.write_all(manifest.to_pretty()?.as_bytes())?;
            }
        }

        Opt::Digest { input } => {
            let manifest = load(&input)?;
            let desc = manifest.get_descriptor()?;
            println!("{}", Digest::from_descriptor(desc));
            println!("{}", desc.size());
        }

        Opt::Platforms { input } => {
            let manifest = load(&input)?;
            for platform in manifest.get_platform_list()? {
                println!("{}", platform.to_spec_string());
            }
        }

        Opt::Resolve { input, platform } => {
            let manifest = load(&input)?;
            let target = match platform {
                Some(spec) => Platform::parse_spec(&spec)?,
                None => Platform::from_cfg_macro()?,
            };
            match manifest.get_platform_descriptor(&target)? {
                Some(desc) => println!("{}", serde_json::to_string_pretty(desc)?),
                None => bail!("No manifest found for {}", target.to_spec_string()),
            }
        }

        Opt::Config(ConfigOpt::Get) => {
            let config = Config::load_default()?;
            if let Some(filename) = &config.filename {
                log::info!("Config file: {}", filename.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        Opt::Config(ConfigOpt::Set {
            blob_limit,
            default_cred_helper,
            docker_cert,
            docker_cred,
        }) => {
            let mut config = Config::load_default()?;
            if let Some(limit) = blob_limit {
                config.set_blob_limit(limit);
            }
            if let Some(helper) = default_cred_helper {
                config.set_default_cred_helper(&helper);
            }
            if let Some(enabled) = docker_cert {
                config.set_docker_cert(enabled);
            }
            if let Some(enabled) = docker_cred {
                config.set_docker_cred(enabled);
            }
            config.save()?;
        }
    }
    Ok(())
}
