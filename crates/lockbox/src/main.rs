// SPDX-FileCopyrightText: 2026 Lockbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lockbox - a client-side encrypted credential vault.
//!
//! This binary drives the engine in federated mode against the local SQLite
//! cache. The wallet path needs an external signing provider and a chain
//! endpoint, so it is exercised through the library API instead.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lockbox_core::{Identity, LoadOutcome, SyncStatus};
use lockbox_storage::SqliteCache;
use lockbox_sync::{SessionHandle, SessionSnapshot, SessionStateMachine};
use lockbox_vault::{MASKED_PASSWORD, PasswordOptions, key_from_subject};

/// Lockbox - a client-side encrypted credential vault.
#[derive(Parser, Debug)]
#[command(name = "lockbox", version, about, long_about = None)]
struct Cli {
    /// Federated sign-in token (JWT) identifying the vault owner.
    #[arg(long, global = true, conflicts_with = "subject")]
    token: Option<String>,

    /// Federated subject id, for already-verified callers.
    #[arg(long, global = true)]
    subject: Option<String>,

    /// Load configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a credential record to the vault.
    Add {
        #[arg(long)]
        site: String,
        #[arg(long, default_value = "")]
        user: String,
        #[arg(long)]
        pass: String,
    },
    /// List stored records with masked passwords.
    List,
    /// Remove a record by id.
    Remove { id: u64 },
    /// Show whether the vault is synced with its durable store.
    Status,
    /// Generate a random password (no vault access needed).
    Generate {
        #[arg(long, default_value_t = 14)]
        length: usize,
        #[arg(long)]
        symbols: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => lockbox_config::load_config_from_path(path)
            .map_err(lockbox_config::diagnostic::figment_to_config_errors)
            .and_then(|c| {
                lockbox_config::validation::validate_config(&c)?;
                Ok(c)
            }),
        None => lockbox_config::load_and_validate(),
    };
    let config = match config {
        Ok(config) => config,
        Err(errors) => {
            lockbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with_writer(std::io::stderr)
        .init();

    // Password generation has no identity and no storage.
    if let Commands::Generate { length, symbols } = &cli.command {
        let options = PasswordOptions {
            length: *length,
            symbols: *symbols,
            ..PasswordOptions::default()
        };
        match lockbox_vault::generate(&options) {
            Ok(password) => println!("{password}"),
            Err(e) => fail(&e.to_string()),
        }
        return;
    }

    let cache = match SqliteCache::open(&config.storage).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => return fail(&format!("could not open the local cache: {e}")),
    };

    let mut machine = SessionStateMachine::new(cache, config);
    let (handle, load) = match sign_in(&mut machine, &cli).await {
        Ok(session) => session,
        Err(message) => return fail(&message),
    };
    if load == LoadOutcome::Unreadable {
        eprintln!(
            "warning: the cached vault could not be decrypted; starting from an empty list \
             without overwriting it"
        );
    }

    run_command(cli.command, handle).await;
}

/// Authenticate from `--token` or `--subject`.
async fn sign_in(
    machine: &mut SessionStateMachine,
    cli: &Cli,
) -> Result<(SessionHandle, LoadOutcome), String> {
    if let Some(token) = &cli.token {
        let (handle, profile, report) = machine
            .sign_in_federated(token)
            .await
            .map_err(|e| e.to_string())?;
        eprintln!("signed in as {}", profile.display_name);
        return Ok((handle, report.load));
    }
    if let Some(subject) = &cli.subject {
        let key = key_from_subject(subject).map_err(|e| e.to_string())?;
        let snapshot = SessionSnapshot::new(
            Identity::Federated {
                subject_id: subject.clone(),
            },
            None,
            key,
        );
        let (handle, report) = machine
            .resume(snapshot, None)
            .await
            .map_err(|e| e.to_string())?;
        return Ok((handle, report.load));
    }
    Err("provide --token or --subject to identify the vault owner".to_string())
}

async fn run_command(command: Commands, mut handle: SessionHandle) {
    match command {
        Commands::Add { site, user, pass } => match handle.add_record(&site, &user, &pass).await {
            Ok(id) => println!("stored record {id}"),
            Err(e) => fail(&e.to_string()),
        },
        Commands::List => {
            if handle.vault().is_empty() {
                println!("no records stored yet");
                return;
            }
            for record in handle.vault().records() {
                let user = if record.user.is_empty() {
                    "(no user)"
                } else {
                    record.user.as_str()
                };
                println!("{}  {}  {}  {}", record.id, record.site, user, MASKED_PASSWORD);
            }
        }
        Commands::Remove { id } => match handle.remove_record(id).await {
            Ok(true) => println!("removed record {id}"),
            Ok(false) => fail(&format!("no record with id {id}")),
            Err(e) => fail(&e.to_string()),
        },
        Commands::Status => match handle.status().await {
            Ok(SyncStatus::Synced) => println!("synced: the vault matches its durable store"),
            Ok(SyncStatus::Pending) => {
                println!("pending: there are changes not yet saved durably")
            }
            Err(e) => fail(&e.to_string()),
        },
        Commands::Generate { .. } => unreachable!("handled before sign-in"),
    }
}

fn fail(message: &str) {
    eprintln!("error: {message}");
    std::process::exit(1);
}
