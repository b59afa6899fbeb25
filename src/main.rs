// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Notewise: AI-assisted note organizer
//!
//! Re-titles, re-files and re-tags Markdown notes using suggestions from an
//! OpenAI-compatible language model.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use notewise::config::AppConfig;
use notewise::filter::FolderFilter;
use notewise::history::{create_entry, undo_entry, History};
use notewise::i18n::{Language, Notice};
use notewise::llm::{build_prompt, LlmClient, NoteContext};
use notewise::organizer::{ApplyOptions, OrganizationApplier, OrganizationOutcome, OrganizationProposal};
use notewise::tags::existing_tags;
use notewise::vault::{FsVault, MemoryVault};
use notewise::{NotewiseError, Result};

/// Notewise CLI - AI-assisted note organizer
#[derive(Parser, Debug)]
#[command(name = "notewise")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Re-title, re-file and re-tag Markdown notes with a language model", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask the model for a title, folder and tags and apply them to a note
    Organize {
        /// Note to organize (filesystem path or vault-relative path)
        note: PathBuf,

        /// Vault root (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Show what would change without touching the vault
        #[arg(long)]
        dry_run: bool,

        /// Print the prompt before sending it
        #[arg(long)]
        show_prompt: bool,
    },

    /// List destination folders after applying ignore patterns
    Folders {
        /// Vault root (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,

        /// Also list ignored folders
        #[arg(long)]
        all: bool,
    },

    /// List tags used in the vault
    Tags {
        /// Vault root (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,
    },

    /// Print the prompt that would be sent for a note
    Prompt {
        note: PathBuf,

        /// Vault root (overrides config)
        #[arg(long)]
        vault: Option<PathBuf>,
    },

    /// History and undo operations
    History {
        #[command(subcommand)]
        action: HistoryCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum HistoryCommands {
    /// List recent history entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// Move recently organized notes back
    Undo {
        /// Number of organizations to undo
        #[arg(short, long, default_value = "1")]
        count: usize,

        /// Dry run (show what would be undone)
        #[arg(long)]
        dry_run: bool,
    },

    /// Clear all history
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Organize { note, vault, dry_run, show_prompt } => {
            run_organize(&config, &note, vault, dry_run, show_prompt, &cli.format).await
        }
        Commands::Folders { vault, all } => run_folders(&config, vault, all, &cli.format),
        Commands::Tags { vault } => run_tags(&config, vault, &cli.format),
        Commands::Prompt { note, vault } => run_prompt(&config, &note, vault).await,
        Commands::History { action } => run_history_command(&config, action).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

fn open_vault(config: &AppConfig, vault_override: Option<PathBuf>) -> Result<FsVault> {
    let root = vault_override.unwrap_or_else(|| PathBuf::from(&config.vault_path));
    FsVault::open(root)
}

/// Vault-relative path of a note given on the command line
fn resolve_note(vault: &FsVault, note: &Path) -> Result<String> {
    if let Some(rel) = vault.relative(note) {
        return Ok(rel);
    }
    let rel = note.to_string_lossy().replace('\\', "/");
    if vault.resolve(&rel).is_file() {
        Ok(rel)
    } else {
        Err(NotewiseError::NotFound(note.display().to_string()))
    }
}

/// Gather the prompt inputs for a note
async fn note_context(config: &AppConfig, vault: &FsVault, rel: &str) -> Result<NoteContext> {
    use notewise::organizer::VaultStore;

    let doc = vault.document(rel)?;
    let content = vault.read(rel).await?;

    let folders = vault.scan_folders();
    let filtered = FolderFilter::new(&config.ignored_folders).filter(&folders);
    debug!(
        "{} destination folders, {} ignored",
        filtered.allowed.len(),
        filtered.ignored.len()
    );

    Ok(NoteContext {
        content,
        current_title: doc.basename,
        current_path: doc.parent,
        folders: filtered.allowed,
        tags: vault.scan_tags(),
    })
}

/// Organize a single note
async fn run_organize(
    config: &AppConfig,
    note: &Path,
    vault_override: Option<PathBuf>,
    dry_run: bool,
    show_prompt: bool,
    format: &str,
) -> Result<()> {
    let lang = config.language;

    if !config.is_api_configured() {
        println!("{}", Notice::ApiKeyMissing.render(lang));
        return Err(NotewiseError::Config("API key not configured".to_string()));
    }

    let vault = open_vault(config, vault_override)?;
    let rel = resolve_note(&vault, note)?;
    let doc = vault.document(&rel)?;
    let context = note_context(config, &vault, &rel).await?;
    let prompt = build_prompt(&config.custom_prompt, &context);

    if show_prompt || config.dev_mode {
        println!("{}\n", prompt);
    }

    let client = LlmClient::new(&config.current_provider(), Duration::from_secs(config.timeout_secs))?;
    if format == "text" {
        println!("{}", Notice::WaitingForModel.render(lang));
    }
    let proposal = client.organize(&context, &prompt).await?;
    info!("Proposal: {:?}", proposal);

    let existing = existing_tags(&context.content);
    let applier = OrganizationApplier::new(ApplyOptions {
        preserve_custom_titles: config.rules.preserve_custom_titles,
    });

    let outcome = if dry_run {
        warn!("DRY RUN MODE - the vault will not be modified");
        let snapshot = MemoryVault::snapshot(&vault)?;
        applier.apply(&snapshot, &doc, &proposal, &existing).await
    } else {
        applier.apply(&vault, &doc, &proposal, &existing).await
    };

    if !dry_run && !outcome.steps.is_empty() {
        let history = History::new(PathBuf::from(&config.history_path));
        let entry = create_entry(
            &doc.path,
            &outcome.document.path,
            outcome.steps.clone(),
            outcome.failure.as_ref().map(|e| e.to_string()),
            &context.content,
        );
        if let Err(e) = history.append(&entry) {
            warn!("Failed to record history: {}", e);
        }
    }

    report(&proposal, &outcome, lang, format)?;

    outcome.into_result().map(|_| ())
}

fn report(
    proposal: &OrganizationProposal,
    outcome: &OrganizationOutcome,
    lang: Language,
    format: &str,
) -> Result<()> {
    if format == "json" {
        let output = serde_json::json!({
            "proposal": proposal,
            "document": outcome.document,
            "steps": outcome.steps,
            "error": outcome.failure.as_ref().map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for step in &outcome.steps {
        println!("{}", Notice::Step(step.clone()).render(lang));
    }

    match &outcome.failure {
        Some(e) => {
            if !outcome.steps.is_empty() {
                println!("{}", Notice::StoppedAfter { completed: outcome.steps.len() }.render(lang));
            }
            println!("{}", Notice::from_error(e).render(lang));
        }
        None if outcome.steps.is_empty() => println!("{}", Notice::NothingToDo.render(lang)),
        None => println!(
            "{}",
            Notice::Organized { path: outcome.document.path.clone() }.render(lang)
        ),
    }

    Ok(())
}

fn run_folders(config: &AppConfig, vault_override: Option<PathBuf>, all: bool, format: &str) -> Result<()> {
    let vault = open_vault(config, vault_override)?;
    let folders = vault.scan_folders();
    let result = FolderFilter::new(&config.ignored_folders).filter(&folders);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Destination folders ({}):", result.allowed.len());
    for folder in &result.allowed {
        println!("  {}", folder);
    }
    if all {
        println!("Ignored folders ({}):", result.ignored.len());
        for folder in &result.ignored {
            println!("  {}", folder);
        }
    }

    Ok(())
}

fn run_tags(config: &AppConfig, vault_override: Option<PathBuf>, format: &str) -> Result<()> {
    let vault = open_vault(config, vault_override)?;
    let tags = vault.scan_tags();

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&tags)?);
    } else {
        println!("Tags ({}):", tags.len());
        for tag in tags {
            println!("  #{}", tag);
        }
    }

    Ok(())
}

async fn run_prompt(config: &AppConfig, note: &Path, vault_override: Option<PathBuf>) -> Result<()> {
    let vault = open_vault(config, vault_override)?;
    let rel = resolve_note(&vault, note)?;
    let context = note_context(config, &vault, &rel).await?;
    println!("{}", build_prompt(&config.custom_prompt, &context));
    Ok(())
}

/// Run history commands
async fn run_history_command(config: &AppConfig, action: HistoryCommands) -> Result<()> {
    let history = History::new(PathBuf::from(&config.history_path));

    match action {
        HistoryCommands::List { count } => {
            let entries = history.get_recent(count)?;
            println!("Recent history ({} entries):", entries.len());
            for entry in entries {
                let status = if entry.undone { "[UNDONE]" } else { "" };
                println!("  {} {} -> {} ({} steps) {}",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.original_path,
                    entry.new_path,
                    entry.steps.len(),
                    status
                );
            }
        }
        HistoryCommands::Undo { count, dry_run } => {
            let entries = history.get_undoable()?;
            let to_undo: Vec<_> = entries.into_iter().rev().take(count).collect();

            if to_undo.is_empty() {
                println!("Nothing to undo");
                return Ok(());
            }

            let vault = open_vault(config, None)?;
            for entry in to_undo {
                if dry_run {
                    println!("Would undo: {} -> {}", entry.new_path, entry.original_path);
                    continue;
                }
                match undo_entry(&vault, &history, &entry).await {
                    Ok(()) => println!("Undone: {} -> {}", entry.new_path, entry.original_path),
                    Err(e) => warn!("Cannot undo {}: {}", entry.new_path, e),
                }
            }
        }
        HistoryCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing history");
                return Ok(());
            }
            history.clear()?;
            println!("History cleared");
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Provider: {:?}", config.api_provider);
            println!("  Vault: {}", config.vault_path);
            println!("  Ignored folders: {:?}", config.ignored_folders);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_organize_command() {
        let cli = Cli::try_parse_from([
            "notewise", "organize", "Inbox/Untitled.md", "--dry-run", "--vault", "/tmp/vault"
        ]).unwrap();

        match cli.command {
            Commands::Organize { note, vault, dry_run, show_prompt } => {
                assert!(dry_run);
                assert!(!show_prompt);
                assert_eq!(note, PathBuf::from("Inbox/Untitled.md"));
                assert_eq!(vault, Some(PathBuf::from("/tmp/vault")));
            }
            _ => panic!("Expected Organize command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from(["notewise", "folders", "--all", "--format", "json", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, "json");
        assert!(matches!(cli.command, Commands::Folders { all: true, .. }));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["notewise"]).is_err());
    }

    #[test]
    fn test_resolve_note() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("Inbox")).unwrap();
        std::fs::write(dir.path().join("Inbox/a.md"), "x").unwrap();
        let vault = FsVault::open(dir.path()).unwrap();

        assert_eq!(resolve_note(&vault, &dir.path().join("Inbox/a.md")).unwrap(), "Inbox/a.md");
        assert!(resolve_note(&vault, Path::new("Inbox/missing.md")).is_err());
    }
}
