//! The `spec.md` §6 CLI surface, plus an optional TOML config file layer
//! supplying defaults the CLI flags then override. The CLI parser itself is
//! an external collaborator per `spec.md` §1; this module is the ambient
//! configuration plumbing a deployment actually needs around it.

use std::path::PathBuf;

use clap::Parser;
use serde::Deserialize;

/// `ros3fs --endpoint=URL --bucket_name=NAME --cache_dir=PATH [options] <mountpoint>`
#[derive(Debug, Parser)]
#[command(name = "ros3fs", about = "Read-only FUSE view of an S3-compatible bucket")]
pub struct CliArgs {
    /// S3 endpoint.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// S3 bucket name.
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Local cache directory (must already exist).
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Wipe the cache directory (except the mount lock) before mounting.
    #[arg(long, default_value_t = false)]
    pub clear_cache: bool,

    /// Seconds between background metadata refreshes.
    #[arg(long)]
    pub update_seconds: Option<u64>,

    /// Optional TOML config file supplying defaults for the flags above.
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    /// Where to mount the filesystem (handled by the, external, kernel
    /// adapter).
    pub mountpoint: Option<PathBuf>,
}

/// Defaults loadable from a TOML file, overridden by whichever `CliArgs`
/// fields are actually present.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub endpoint: Option<String>,
    pub bucket_name: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub update_seconds: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &std::path::Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        toml::from_str(&text).map_err(|e| e.to_string())
    }
}

/// Default refresh period when neither the CLI nor the config file specify
/// one (`spec.md` §6).
pub const DEFAULT_UPDATE_SECONDS: u64 = 3600;

/// Resolved configuration: CLI flags win, then the file config, then the
/// built-in default for `update_seconds`.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub endpoint: String,
    pub bucket_name: String,
    pub cache_dir: PathBuf,
    pub clear_cache: bool,
    pub update_seconds: u64,
}

impl ResolvedConfig {
    pub fn resolve(cli: CliArgs) -> Result<Self, String> {
        let file = match &cli.config_file {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let endpoint = cli
            .endpoint
            .or(file.endpoint)
            .ok_or_else(|| "--endpoint is required (or set it in --config_file)".to_string())?;
        let bucket_name = cli
            .bucket_name
            .or(file.bucket_name)
            .ok_or_else(|| "--bucket_name is required (or set it in --config_file)".to_string())?;
        let cache_dir = cli
            .cache_dir
            .or(file.cache_dir)
            .ok_or_else(|| "--cache_dir is required (or set it in --config_file)".to_string())?;
        let update_seconds =
            cli.update_seconds.or(file.update_seconds).unwrap_or(DEFAULT_UPDATE_SECONDS);

        Ok(ResolvedConfig {
            endpoint,
            bucket_name,
            cache_dir,
            clear_cache: cli.clear_cache,
            update_seconds,
        })
    }
}
