//! Hero roster CLI
//!
//! Command-line tool for syncing a hero roster with its source sheets,
//! reviewing source differences and editing the stored roster.

use chrono::Utc;
use clap::{Parser, Subcommand};
use roster_core::{
    accept_all, accept_field, add_local_hero, apply_edit_file, find_backups, latest_backup,
    open_source, parse_delimited, parse_file, BackupFile, EditFile, FieldEdit, InvestmentCodec,
    JsonFileStore, KeyedEdit, RecordAssembler, RecordStore, SyncConfig, SyncHistory, SyncOutcome,
    SyncService, Tier, TrackedField, TranslationCache,
};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG: &str = "roster-config.json";

#[derive(Parser)]
#[command(name = "roster-cli")]
#[command(about = "Hero roster sync and review", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and display a delimited sheet export
    Parse {
        /// Path to the export
        #[arg(short, long)]
        file: PathBuf,

        /// Cell delimiter
        #[arg(short, long, default_value_t = '\t')]
        delimiter: char,

        /// Maximum number of rows to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Decode an investment cell
    Decode {
        /// Cell text, e.g. "309e60УСК>МУ"
        cell: String,

        /// Print JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Join the two sheets into hero records without touching the store
    Assemble {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Metadata sheet (URL or file), overriding the config
        #[arg(long)]
        metadata: Option<String>,

        /// Builds sheet (URL or file), overriding the config
        #[arg(long)]
        builds: Option<String>,

        /// Write the records as JSON here instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch both sheets and reconcile them into the store
    Sync {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// List heroes whose stored values differ from the source
    Mismatches {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Take source values of a hero into the store
    Accept {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Hero key
        #[arg(short, long)]
        key: String,

        /// Single field to take (all differing fields when omitted)
        #[arg(short, long)]
        field: Option<String>,
    },

    /// Apply an edit file to the store
    Edit {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Path to edit file (JSON)
        #[arg(short, long)]
        edits: PathBuf,
    },

    /// Add a hand-made hero to the store
    AddHero {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Write a backup of the store and translation cache
    Backup {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// List existing backups instead
        #[arg(short, long)]
        list: bool,
    },

    /// Replace the store and translation cache with a backup
    Restore {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Backup to restore (newest when omitted)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Show recent syncs
    History {
        /// Config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Maximum number of entries to display
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Create a config file template
    CreateConfig {
        /// Output path for the config file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,

        /// Metadata sheet (URL or file)
        #[arg(long, default_value = "")]
        metadata: String,

        /// Builds sheet (URL or file)
        #[arg(long, default_value = "")]
        builds: String,
    },

    /// Create an edit file template
    CreateEdits {
        /// Output path for the edit file
        #[arg(short, long)]
        output: PathBuf,

        /// Example tier edits to include (key:tier)
        #[arg(short, long)]
        example: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> roster_core::Result<()> {
    match command {
        Commands::Parse {
            file,
            delimiter,
            limit,
        } => cmd_parse(&file, delimiter, limit),
        Commands::Decode { cell, json } => cmd_decode(&cell, json),
        Commands::Assemble {
            config,
            metadata,
            builds,
            output,
        } => cmd_assemble(&config, metadata, builds, output.as_deref()),
        Commands::Sync { config } => cmd_sync(&config),
        Commands::Mismatches { config } => cmd_mismatches(&config),
        Commands::Accept { config, key, field } => cmd_accept(&config, &key, field.as_deref()),
        Commands::Edit { config, edits } => cmd_edit(&config, &edits),
        Commands::AddHero { config } => cmd_add_hero(&config),
        Commands::Backup { config, list } => cmd_backup(&config, list),
        Commands::Restore { config, file } => cmd_restore(&config, file.as_deref()),
        Commands::History { config, limit } => cmd_history(&config, limit),
        Commands::CreateConfig {
            output,
            metadata,
            builds,
        } => cmd_create_config(&output, metadata, builds),
        Commands::CreateEdits { output, example } => cmd_create_edits(&output, &example),
    }
}

/// Load the config, falling back to defaults when the file does not exist
fn load_config(path: &Path) -> roster_core::Result<SyncConfig> {
    if path.exists() {
        SyncConfig::load(path)
    } else {
        log::warn!("{} not found, using defaults", path.display());
        Ok(SyncConfig::default())
    }
}

fn delimiter_byte(delimiter: char) -> roster_core::Result<u8> {
    SyncConfig {
        delimiter,
        ..Default::default()
    }
    .delimiter_byte()
}

fn cmd_parse(file: &Path, delimiter: char, limit: usize) -> roster_core::Result<()> {
    let table = parse_file(file, delimiter_byte(delimiter)?)?;

    println!("File: {}", file.display());
    println!("Rows: {}", table.row_count());
    println!("Widest row: {} cells", table.max_width());
    println!();

    for (i, row) in table.rows.iter().take(limit).enumerate() {
        println!("{:>4}: {}", i, row.cells.join(" | "));
    }

    if table.row_count() > limit {
        println!("... ({} more rows)", table.row_count() - limit);
    }

    Ok(())
}

fn cmd_decode(cell: &str, json: bool) -> roster_core::Result<()> {
    let builds = InvestmentCodec::default().decode_builds("", "", cell);

    if json {
        println!("{}", serde_json::to_string_pretty(&builds)?);
        return Ok(());
    }

    for (i, build) in builds.iter().enumerate() {
        let kind = if build.is_alternative { "alternative" } else { "primary" };
        let nodes: Vec<String> = build
            .engraving_nodes
            .iter()
            .map(|n| {
                if n.found {
                    format!("{} ({})", n.display_label(), n.original)
                } else {
                    format!("{} (?)", n.display_label())
                }
            })
            .collect();

        println!("Variant {} [{}]", i + 1, kind);
        println!("  SI:         {}", build.si_level);
        println!("  Furniture:  {}", build.furniture_level);
        println!("  Engravings: {}", build.engraving_level);
        if !nodes.is_empty() {
            println!("  Nodes:      {}", nodes.join(" > "));
        }
    }

    Ok(())
}

fn cmd_assemble(
    config_path: &Path,
    metadata: Option<String>,
    builds: Option<String>,
    output: Option<&Path>,
) -> roster_core::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(metadata) = metadata {
        config.metadata_source = metadata;
    }
    if let Some(builds) = builds {
        config.builds_source = builds;
    }

    let (metadata_location, builds_location) = config.sources()?;
    let delimiter = config.delimiter_byte()?;
    let metadata_source = open_source(metadata_location, config.http_timeout())?;
    let builds_source = open_source(builds_location, config.http_timeout())?;

    let metadata_table = parse_delimited(&metadata_source.fetch()?, delimiter, metadata_source.name());
    let builds_table = parse_delimited(&builds_source.fetch()?, delimiter, builds_source.name());

    let assembler = RecordAssembler::new(InvestmentCodec::new(config.node_dictionary()));
    let records = assembler.assemble(&metadata_table, &builds_table);

    if let Some(output) = output {
        let list: Vec<_> = records.values().collect();
        std::fs::write(output, serde_json::to_string_pretty(&list)?)?;
        println!("Wrote {} heroes to {}", records.len(), output.display());
        return Ok(());
    }

    println!("Heroes ({}):", records.len());
    for record in records.values() {
        println!(
            "  {:<24} {:<20} {:<4} {:>5.2}  {} builds",
            record.key,
            record.localized_name,
            record.tier,
            record.score,
            record.builds.len()
        );
    }

    Ok(())
}

fn cmd_sync(config_path: &Path) -> roster_core::Result<()> {
    let config = load_config(config_path)?;
    let (metadata_location, builds_location) = config.sources()?;
    let metadata = open_source(metadata_location, config.http_timeout())?;
    let builds = open_source(builds_location, config.http_timeout())?;

    let service = SyncService::from_config(&config)?;
    match service.sync(metadata.as_ref(), builds.as_ref())? {
        SyncOutcome::Completed(report) => {
            println!("Sync complete:");
            println!("  {} merged", report.merged);
            println!("  {} new", report.created);
            println!("  {} promoted", report.promoted.len());
            for (old, new) in &report.promoted {
                println!("    {} -> {}", old, new);
            }
            println!("  {} removed from source", report.removed);
            println!("  {} local only", report.local_only);
            println!("  {} with differences", report.with_differences);
            if report.with_differences > 0 {
                println!();
                println!("Review them with:");
                println!("  roster-cli mismatches --config {}", config_path.display());
            }
        }
        SyncOutcome::Coalesced => println!("A sync is already running."),
    }

    Ok(())
}

fn cmd_mismatches(config_path: &Path) -> roster_core::Result<()> {
    let config = load_config(config_path)?;
    let records = JsonFileStore::new(&config.store_path).load()?;

    let mismatched: Vec<_> = records.iter().filter(|r| r.has_mismatches()).collect();
    println!("Heroes with source differences ({}):", mismatched.len());
    println!();

    for record in mismatched {
        let Some(diff) = &record.diff else {
            continue;
        };
        println!("{} ({})", record.key, record.localized_name);
        for field in diff.fields() {
            let source_value = match field {
                TrackedField::OriginName => diff.origin_name.clone().unwrap_or_default(),
                TrackedField::LocalizedName => diff.localized_name.clone().unwrap_or_default(),
                TrackedField::Faction => diff.faction.clone().unwrap_or_default(),
                TrackedField::Awakened => diff.awakened.map(|v| v.to_string()).unwrap_or_default(),
                TrackedField::Tier => diff.tier.map(|v| v.to_string()).unwrap_or_default(),
                TrackedField::Score => diff.score.map(|v| v.to_string()).unwrap_or_default(),
                TrackedField::RankingComment => diff.ranking_comment.clone().unwrap_or_default(),
                TrackedField::Builds => diff
                    .builds
                    .as_ref()
                    .map(|b| format!("{} builds", b.len()))
                    .unwrap_or_default(),
            };
            println!("  {:<16} source: {}", field, source_value);
        }
        println!();
    }

    Ok(())
}

fn cmd_accept(config_path: &Path, key: &str, field: Option<&str>) -> roster_core::Result<()> {
    let config = load_config(config_path)?;
    let store = JsonFileStore::new(&config.store_path);
    let mut records = store.load()?;

    match field {
        Some(name) => {
            let field = TrackedField::from_name(name).ok_or_else(|| roster_core::Error::InvalidEdit {
                key: key.to_string(),
                message: format!("unknown field '{}'", name),
            })?;
            if accept_field(&mut records, key, field)? {
                println!("Took source {} for {}", field, key);
            } else {
                println!("{} of {} matches the source", field, key);
                return Ok(());
            }
        }
        None => {
            let taken = accept_all(&mut records, key)?;
            println!("Took {} source values for {}", taken, key);
            if taken == 0 {
                return Ok(());
            }
        }
    }

    store.save(&records)
}

fn cmd_edit(config_path: &Path, edits_path: &Path) -> roster_core::Result<()> {
    let config = load_config(config_path)?;
    let store = JsonFileStore::new(&config.store_path);
    let edits = EditFile::load(edits_path)?;
    println!("Loaded {} edits", edits.edits.len());

    let mut records = store.load()?;
    let report = apply_edit_file(&mut records, &edits);

    if !report.failed.is_empty() {
        println!("\nWarning: {} edits could not be applied:", report.failed.len());
        for (edit, reason) in &report.failed {
            println!("  - {}: {}", edit.key, reason);
        }
    }

    if report.applied > 0 {
        store.save(&records)?;
    }
    println!("\n{} edits applied", report.applied);

    Ok(())
}

fn cmd_add_hero(config_path: &Path) -> roster_core::Result<()> {
    let config = load_config(config_path)?;
    let store = JsonFileStore::new(&config.store_path);

    let mut records = store.load()?;
    let key = add_local_hero(&mut records, Utc::now());
    store.save(&records)?;

    println!("Added hero {}", key);
    println!("Name it with an edit file, e.g.:");
    println!("  roster-cli create-edits --output edits.json --example {}:S", key);

    Ok(())
}

fn cmd_backup(config_path: &Path, list: bool) -> roster_core::Result<()> {
    let config = load_config(config_path)?;

    if list {
        let backups = find_backups(&config.backup_dir)?;
        println!("Backups in {} ({}):", config.backup_dir.display(), backups.len());
        for backup in backups {
            println!("  {}  {}", backup.created_at.format("%Y-%m-%d %H:%M:%S"), backup.path.display());
        }
        return Ok(());
    }

    let records = JsonFileStore::new(&config.store_path).load()?;
    let translations = TranslationCache::load(&config.translations_path)?;
    let backup = BackupFile::new(Utc::now(), records, translations);
    let path = backup.save_to_dir(&config.backup_dir)?;

    println!("Backed up {} heroes to {}", backup.records.len(), path.display());

    Ok(())
}

fn cmd_restore(config_path: &Path, file: Option<&Path>) -> roster_core::Result<()> {
    let config = load_config(config_path)?;

    let path = match file {
        Some(path) => path.to_path_buf(),
        None => match latest_backup(&config.backup_dir)? {
            Some(entry) => entry.path,
            None => {
                println!("No backups in {}", config.backup_dir.display());
                return Ok(());
            }
        },
    };

    let backup = BackupFile::load(&path)?;
    JsonFileStore::new(&config.store_path).save(&backup.records)?;
    backup.translations.save(&config.translations_path)?;

    println!(
        "Restored {} heroes and {} translations from {}",
        backup.records.len(),
        backup.translations.len(),
        path.display()
    );

    Ok(())
}

fn cmd_history(config_path: &Path, limit: usize) -> roster_core::Result<()> {
    let config = load_config(config_path)?;
    let history = SyncHistory::load(&config.history_path)?;

    println!("Syncs ({}):", history.len());
    for entry in history.recent(limit) {
        let r = &entry.report;
        println!(
            "  {}  {} merged, {} new, {} promoted, {} removed, {} with differences",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            r.merged,
            r.created,
            r.promoted.len(),
            r.removed,
            r.with_differences
        );
    }

    Ok(())
}

fn cmd_create_config(output: &Path, metadata: String, builds: String) -> roster_core::Result<()> {
    let config = SyncConfig {
        metadata_source: metadata,
        builds_source: builds,
        ..Default::default()
    };

    config.save(output)?;
    println!("Created config file: {}", output.display());
    println!();
    println!("Fill in the sheet locations, then run:");
    println!("  roster-cli sync --config {}", output.display());

    Ok(())
}

fn cmd_create_edits(output: &Path, examples: &[String]) -> roster_core::Result<()> {
    let mut edits = EditFile::new();

    // Parse example edits: "key:tier"
    for example in examples {
        let Some((key, tier)) = example.rsplit_once(':') else {
            eprintln!("Warning: Invalid example format '{}', expected 'key:tier'", example);
            continue;
        };
        edits.add_edit(KeyedEdit::new(key, FieldEdit::Tier(Tier::parse(tier))));
    }

    if edits.edits.is_empty() {
        edits.add_edit(KeyedEdit::new("hero-key", FieldEdit::LocalizedName("Name".into())));
        edits.add_edit(KeyedEdit::new("hero-key", FieldEdit::Tier(Tier::A)));
    }

    edits.save(output)?;
    println!("Created edit file: {}", output.display());
    println!("Edits: {}", edits.edits.len());
    println!();
    println!("Edit the file to add your changes, then run:");
    println!("  roster-cli edit --edits {}", output.display());

    Ok(())
}
