//! # Command Line Interface
//!
//! Resolves, checks and creates secret references from the shell. Storage
//! references are served from a local directory tree laid out as
//! `<root>/<bucket>/<file>`.

pub mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use crate::config::SecretsConfig;
use crate::observability::init_logging;
use crate::secrets::engines::NOOP_ENGINE_IDENTIFIER;
use crate::secrets::{
    EncryptedSecret, FileSystemDownloader, NoopSecretEngine, SecretEngine, SecretEngineRegistry,
    SecretReferenceValidator, StorageSecretEngine, UserSecretManager, UserSecretMapper,
    UserSecretReference, UserSecretService,
};

/// Identifier of the storage engine backed by the local filesystem
pub const FILE_ENGINE_IDENTIFIER: &str = "file";

#[derive(Parser)]
#[command(name = "secret-engine")]
#[command(about = "Resolve encrypted and user secret references")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (YAML, JSON or TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory served by the `file` engine
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a reference and print its value
    Resolve {
        /// `encrypted:...` or `secret://...` reference
        reference: String,

        /// Resource recorded as using a user secret
        #[arg(long, default_value = "cli")]
        resource: String,
    },

    /// Print every field of a user secret
    Show {
        /// `secret://...` reference
        reference: String,

        /// Output encoding (json or yaml)
        #[arg(short, long, default_value = "yaml")]
        encoding: String,
    },

    /// Check that a reference resolves without printing its value
    Check {
        /// `encrypted:...` or `secret://...` reference
        reference: String,
    },

    /// Wrap a plaintext value in a `noop` encrypted reference
    Encrypt {
        /// Value to embed
        plaintext: String,
    },

    /// List registered engines
    Engines {
        /// Output format (json, yaml or table)
        #[arg(short, long, default_value = "table")]
        output: String,
    },
}

#[derive(Debug, Serialize)]
struct EngineRow {
    identifier: String,
    kind: String,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = SecretsConfig::load(cli.config.as_deref())
        .context("Failed to load secrets configuration")?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;

    let registry = Arc::new(build_registry(&config, cli.root.clone())?);
    let service = Arc::new(UserSecretService::new(UserSecretManager::new(
        Arc::clone(&registry),
        config.user_secrets.settings(),
    )));

    match cli.command {
        Commands::Resolve { reference, resource } => {
            let value = resolve(&service, &reference, &resource).await?;
            println!("{}", value);
        }
        Commands::Show { reference, encoding } => {
            let reference = UserSecretReference::parse(&reference)?;
            let secret = service.get_user_secret(&reference).await?;
            let rendered = UserSecretMapper::new()
                .serialize(secret.data(), &encoding)?
                .into_secret_string()?;
            println!("{}", rendered.expose_secret().trim_end());
        }
        Commands::Check { reference } => {
            if !UserSecretReference::is_user_secret(&reference)
                && !EncryptedSecret::is_encrypted_secret(&reference)
            {
                anyhow::bail!("Not a secret reference");
            }
            let validator = SecretReferenceValidator::new(Arc::clone(&service));
            if let Some(error) = validator.validate(&reference).await {
                return Err(anyhow::Error::new(error).context("Reference failed validation"));
            }
            println!("OK");
        }
        Commands::Encrypt { plaintext } => {
            let engine = registry.engine(NOOP_ENGINE_IDENTIFIER)?;
            let secret = engine.encrypt(&plaintext).await?;
            println!("{}", secret);
        }
        Commands::Engines { output } => {
            let rows: Vec<EngineRow> = registry
                .registered_engines()
                .into_iter()
                .filter_map(|identifier| registry.get(identifier))
                .map(|engine| EngineRow {
                    identifier: engine.identifier().to_string(),
                    kind: engine.kind().to_string(),
                })
                .collect();
            output::print_engines(&rows, &output)?;
        }
    }

    Ok(())
}

/// Build the registry the CLI resolves against: a filesystem-backed storage
/// engine plus the `noop` engine.
pub fn build_registry(
    config: &SecretsConfig,
    root: PathBuf,
) -> crate::secrets::Result<SecretEngineRegistry> {
    let storage = StorageSecretEngine::with_settings(
        FILE_ENGINE_IDENTIFIER,
        Arc::new(FileSystemDownloader::new(root)),
        config.cache.settings(),
    );
    let engines: [Arc<dyn SecretEngine>; 2] =
        [Arc::new(storage), Arc::new(NoopSecretEngine::new())];
    let registry = SecretEngineRegistry::with_engines(engines)?;
    info!(engines = ?registry.registered_engines(), "Secret engines registered");
    Ok(registry)
}

/// Resolve either kind of reference to a string value
async fn resolve(
    service: &UserSecretService,
    reference: &str,
    resource_id: &str,
) -> anyhow::Result<String> {
    if UserSecretReference::is_user_secret(reference) {
        let reference = UserSecretReference::parse(reference)?;
        let value = service.get_user_secret_string_for_resource(&reference, resource_id).await?;
        return Ok(value.into_inner());
    }

    let secret = EncryptedSecret::parse(reference)?;
    let value = service.get_external_secret_string(&secret).await?;
    Ok(value.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::parse_from([
            "secret-engine",
            "--root",
            "/srv/secrets",
            "resolve",
            "encrypted:noop!v:abc",
        ]);
        assert_eq!(cli.root, PathBuf::from("/srv/secrets"));
        match cli.command {
            Commands::Resolve { reference, resource } => {
                assert_eq!(reference, "encrypted:noop!v:abc");
                assert_eq!(resource, "cli");
            }
            _ => panic!("expected resolve"),
        }
    }

    #[tokio::test]
    async fn test_resolve_both_reference_kinds() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("prod")).unwrap();
        fs::write(dir.path().join("prod/db.yml"), "db:\n  password: s3cr3t\n").unwrap();

        let config = SecretsConfig::default();
        let registry = Arc::new(build_registry(&config, dir.path().to_path_buf()).unwrap());
        assert_eq!(registry.registered_engines(), vec!["file", "noop"]);

        let service = UserSecretService::new(UserSecretManager::with_default_cache(registry));

        let value = resolve(&service, "encrypted:file!b:prod!r:local!f:db.yml!k:db.password", "cli")
            .await
            .unwrap();
        assert_eq!(value, "s3cr3t");

        let value = resolve(&service, "secret://noop?v=hunter2&k=v", "route-1").await.unwrap();
        assert_eq!(value, "hunter2");
        assert!(service.is_tracking_user_secrets_for_resource("route-1"));
    }
}
