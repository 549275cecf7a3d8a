//! Subcommand arguments and handlers.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use eraf::{Container, Field};
use tracing::{info, warn};

use crate::config::Config;
use crate::report::InspectReport;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new plain container
    Create(CreateArgs),
    /// Print the layout of a container as JSON
    Inspect(InspectArgs),
    /// Seal every sensitive field with ERAF_KEY and a fresh nonce
    Seal(CryptArgs),
    /// Open a sealed container with ERAF_KEY and its stored nonce
    Open(CryptArgs),
}

/// `major.minor.patch`, each component 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version(pub u8, pub u8, pub u8);

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split('.')
            .map(str::parse::<u8>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid version {s:?}: {e}"))?;
        match parts[..] {
            [major, minor, patch] => Ok(Version(major, minor, patch)),
            _ => Err(format!("invalid version {s:?}: expected major.minor.patch")),
        }
    }
}

/// `field=value`. A value starting with `@` names a file to read the bytes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub field: Field,
    pub value: String,
}

impl FromStr for Assignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected field=value, got {s:?}"))?;
        let field = name.parse::<Field>().map_err(|e| e.to_string())?;
        Ok(Assignment {
            field,
            value: value.to_owned(),
        })
    }
}

impl Assignment {
    fn bytes(&self) -> Result<Vec<u8>> {
        match self.value.strip_prefix('@') {
            Some(path) => std::fs::read(path)
                .with_context(|| format!("failed to read {} from {path}", self.field)),
            None => Ok(self.value.as_bytes().to_vec()),
        }
    }
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Where to write the container
    #[arg(short, long)]
    pub output: PathBuf,
    /// Container version
    #[arg(long, default_value = "0.0.0")]
    pub version: Version,
    /// Set a field, e.g. `--set email=a@b.c` or `--set certificate=@cert.pem`
    #[arg(long = "set", value_name = "FIELD=VALUE")]
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Path to the container
    pub path: PathBuf,
}

#[derive(Debug, Args)]
pub struct CryptArgs {
    /// Path to the container
    pub input: PathBuf,
    /// Write the result here instead of replacing the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl CryptArgs {
    fn destination(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

/// Dispatch a parsed subcommand.
pub fn run(command: Commands, cfg: &Config) -> Result<()> {
    match command {
        Commands::Create(args) => create(args),
        Commands::Inspect(args) => {
            let report = inspect(&args)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to encode report")?
            );
            Ok(())
        }
        Commands::Seal(args) => seal(&args, cfg),
        Commands::Open(args) => open(&args, cfg),
    }
}

pub fn create(args: CreateArgs) -> Result<()> {
    let Version(major, minor, patch) = args.version;
    let mut container = Container::new();
    container.set_version(major, minor, patch);
    for assignment in &args.assignments {
        container.set_field(assignment.field, assignment.bytes()?);
    }
    let written = container
        .write_to_path(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), bytes = written, "container created");
    Ok(())
}

pub fn inspect(args: &InspectArgs) -> Result<InspectReport> {
    let container = load(&args.path)?;
    Ok(InspectReport::from_container(&container))
}

pub fn seal(args: &CryptArgs, cfg: &Config) -> Result<()> {
    let key = cfg.require_key()?;
    let mut container = load(&args.input)?;
    if !container.nonce().is_empty() {
        warn!(path = %args.input.display(), "container already carries a nonce; sealing again");
    }
    container
        .seal_all_with_fresh_nonce(&key)
        .context("failed to seal container")?;
    save(&container, args.destination())?;
    info!(path = %args.destination().display(), key_bits = key.bits(), "container sealed");
    Ok(())
}

pub fn open(args: &CryptArgs, cfg: &Config) -> Result<()> {
    let key = cfg.require_key()?;
    let mut container = load(&args.input)?;
    container
        .open_all_with_stored_nonce(&key)
        .context("failed to open container")?;
    save(&container, args.destination())?;
    info!(path = %args.destination().display(), "container opened");
    Ok(())
}

fn load(path: &Path) -> Result<Container> {
    Container::read_from_path(path).with_context(|| format!("failed to read {}", path.display()))
}

fn save(container: &Container, path: &Path) -> Result<()> {
    container
        .write_to_path(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
