//! # Command Line Interface
//!
//! `certbundle create` provisions a bundle from PEM files, `list` shows the
//! certificate containers visible to the token, and `exists` checks a name.

pub mod output;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::{CapabilityProbe, KeystoneCatalogProbe, ServiceCatalog};
use crate::certificates::pem::parse_certificates;
use crate::certificates::{CertificateModel, NameRegistry};
use crate::config::{load_config, AppConfig};
use crate::observability::{init_logging, log_config_info};
use crate::secrets::{AuditedSecretStore, BarbicanClient, SecretStoreClient};
use crate::workflow::CertificateWorkflow;

use output::{ConsoleNotifier, TerminalDialog};

/// Exit code when the workflow or a lookup reports failure
pub const EXIT_FAILURE: i32 = 1;

/// Exit code when field validation rejects the input
pub const EXIT_INVALID_INPUT: i32 = 2;

#[derive(Parser)]
#[command(name = "certbundle")]
#[command(about = "Create TLS certificate bundles in a key manager")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Key manager base URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Identity token for the key manager
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a certificate bundle from PEM files
    Create(CreateArgs),

    /// List certificate containers
    List,

    /// Exit 0 if a certificate with this name exists, 1 otherwise
    Exists {
        /// Certificate name
        name: String,
    },
}

#[derive(Args)]
pub struct CreateArgs {
    /// Certificate name; secret names are derived from it
    #[arg(long)]
    pub name: String,

    /// PEM file with the leaf certificate
    #[arg(long)]
    pub certificate: PathBuf,

    /// PEM file with the private key
    #[arg(long)]
    pub private_key: PathBuf,

    /// Passphrase protecting the private key
    #[arg(long, conflicts_with = "passphrase_file")]
    pub passphrase: Option<String>,

    /// File containing the passphrase
    #[arg(long)]
    pub passphrase_file: Option<PathBuf>,

    /// PEM file with the intermediate chain
    #[arg(long)]
    pub intermediate: Option<PathBuf>,

    /// Show the passphrase in the dry-run summary
    #[arg(long)]
    pub show_passphrase: bool,

    /// Print what would be created and exit without contacting the key manager
    #[arg(long)]
    pub dry_run: bool,

    /// Submit without checking the PEM material first
    #[arg(long)]
    pub skip_validation: bool,
}

/// Parse arguments and run the selected command, returning the exit code.
pub async fn run_cli() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &cli)?;

    init_logging(&config.observability, cli.verbose)?;
    log_config_info(&config);

    match cli.command {
        Commands::Create(args) => handle_create(args, &config, cli.json).await,
        Commands::List => handle_list(&config, cli.json).await,
        Commands::Exists { name } => handle_exists(&name, &config).await,
    }
}

fn apply_overrides(config: &mut AppConfig, cli: &Cli) -> Result<()> {
    if let Some(endpoint) = &cli.endpoint {
        config.key_manager.endpoint = endpoint.clone();
    }
    if let Some(token) = &cli.token {
        config.key_manager.token = token.as_str().into();
    }
    config.validate().context("Invalid configuration")?;
    Ok(())
}

fn create_store(config: &AppConfig) -> Result<Arc<dyn SecretStoreClient>> {
    if !config.key_manager.has_token() {
        anyhow::bail!(
            "No key manager token configured. Use --token or set CERTBUNDLE__KEY_MANAGER__TOKEN"
        );
    }

    let client = BarbicanClient::new(config.key_manager.client_config())
        .context("Failed to create key manager client")?;
    Ok(Arc::new(AuditedSecretStore::new(client)))
}

fn create_probe(config: &AppConfig) -> Result<Arc<dyn CapabilityProbe>> {
    match &config.catalog.identity_endpoint {
        Some(identity_endpoint) => {
            let probe = KeystoneCatalogProbe::new(
                identity_endpoint.as_str(),
                config.key_manager.token.clone(),
                config.key_manager.timeout(),
            )
            .context("Failed to create identity client")?;
            Ok(Arc::new(probe))
        }
        None => Ok(Arc::new(ServiceCatalog::new(config.catalog.enabled_services.iter().cloned()))),
    }
}

async fn read_pem(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn handle_create(args: CreateArgs, config: &AppConfig, json: bool) -> Result<i32> {
    // Dry runs may be offline; name uniqueness is then unchecked.
    let store: Arc<dyn SecretStoreClient> = if args.dry_run && !config.key_manager.has_token() {
        Arc::new(
            BarbicanClient::new(config.key_manager.client_config())
                .context("Failed to create key manager client")?,
        )
    } else {
        create_store(config)?
    };

    let registry = Arc::new(CertificateModel::new(store.clone()));
    if config.key_manager.has_token() {
        registry
            .refresh_certificate_list()
            .await
            .context("Failed to list existing certificates")?;
    }

    let mut workflow = CertificateWorkflow::new(
        store,
        create_probe(config)?,
        registry,
        Arc::new(ConsoleNotifier),
        Arc::new(TerminalDialog::default()),
    );

    workflow.set_certificate_name(args.name.as_str());
    workflow.set_certificate(read_pem(&args.certificate).await?);
    workflow.set_private_key(read_pem(&args.private_key).await?);
    if let Some(path) = &args.intermediate {
        workflow.set_intermediate(read_pem(path).await?);
    }
    if let Some(passphrase) = args.passphrase.as_deref() {
        workflow.set_passphrase(passphrase);
    } else if let Some(path) = &args.passphrase_file {
        let passphrase = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        workflow.set_passphrase(passphrase.trim_end_matches(&['\r', '\n'][..]));
    }
    if !args.show_passphrase {
        workflow.hide_password();
    }

    if !args.skip_validation {
        let errors = workflow.validate_fields();
        if !errors.is_empty() {
            output::print_field_errors(&errors);
            workflow.cancel();
            return Ok(EXIT_INVALID_INPUT);
        }
        warn_if_outside_validity(&workflow);
    }

    if args.dry_run {
        output::print_plan(&workflow, json)?;
        workflow.cancel();
        return Ok(0);
    }

    match workflow.submit().await {
        Ok(container_ref) => {
            info!(container_ref = %container_ref, "Certificate bundle created");
            output::print_created(&container_ref, json)?;
            Ok(0)
        }
        Err(e) => {
            warn!(error = %e, "Certificate bundle was not created");
            output::print_orphans(&e);
            Ok(EXIT_FAILURE)
        }
    }
}

fn warn_if_outside_validity(workflow: &CertificateWorkflow) {
    let payload = workflow.spec().certificate.payload.expose_secret();
    if let Ok(infos) = parse_certificates(payload, "certificate") {
        if let Some(leaf) = infos.first() {
            if let Err(e) = leaf.ensure_valid_at(Utc::now()) {
                warn!(subject = %leaf.subject, "{}", e);
            }
        }
    }
}

async fn handle_list(config: &AppConfig, json: bool) -> Result<i32> {
    let model = CertificateModel::new(create_store(config)?);
    model.refresh_certificate_list().await.context("Failed to list certificates")?;
    output::print_containers(&model.certificates(), json)?;
    Ok(0)
}

async fn handle_exists(name: &str, config: &AppConfig) -> Result<i32> {
    let model = CertificateModel::new(create_store(config)?);
    model.refresh_certificate_list().await.context("Failed to list certificates")?;

    if model.certificate_names().iter().any(|existing| existing == name) {
        println!("{name}");
        Ok(0)
    } else {
        Ok(EXIT_FAILURE)
    }
}
