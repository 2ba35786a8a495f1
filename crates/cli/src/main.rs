use clap::{Parser, Subcommand};
use mpr_core::config::data_dir_from_env_value;
use mpr_core::{
    ArchivalError, ArchivalService, CoreConfig, EntityRef, PatientTreeBuilder, RecordId,
    YamlFileStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "mpr")]
#[command(about = "Medical practice records CLI")]
struct Cli {
    /// Record directory (overrides MPR_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a patient with a medical history and optional children
    Seed {
        /// Patient name
        name: String,
        /// Representative name (repeatable)
        #[arg(long = "representative")]
        representatives: Vec<String>,
        /// Consultation reason (repeatable)
        #[arg(long = "consultation")]
        consultations: Vec<String>,
        /// Prescribed medication (repeatable)
        #[arg(long = "prescription")]
        prescriptions: Vec<String>,
    },
    /// Show every record of a patient
    Show {
        /// Patient UUID
        patient_id: String,
    },
    /// Archive a record and everything it owns
    Archive {
        /// Entity type (patient, medical-history, representative, consultation, prescription)
        entity_type: String,
        /// Record UUID
        id: String,
    },
    /// Check whether restoring a record needs confirmation
    Probe {
        /// Entity type
        entity_type: String,
        /// Record UUID
        id: String,
    },
    /// Restore an archived record
    Restore {
        /// Entity type
        entity_type: String,
        /// Record UUID
        id: String,
        /// Restore the whole patient record if an ancestor is archived
        #[arg(long)]
        cascade: bool,
    },
    /// Report active records under archived ancestors
    Check {
        /// Patient UUID
        patient_id: String,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mpr=warn".parse()?)
                .add_directive("mpr_core=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'mpr --help' for commands");
        return Ok(());
    };

    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("MPR_DATA_DIR").ok()));
    let cfg = Arc::new(CoreConfig::new(data_dir)?);
    let store = Arc::new(YamlFileStore::open(cfg)?);
    let service = ArchivalService::new(store.clone());

    match command {
        Commands::Seed {
            name,
            representatives,
            consultations,
            prescriptions,
        } => {
            let mut builder = PatientTreeBuilder::named(name)?;
            for rep in representatives {
                builder = builder.representative(rep)?;
            }
            for reason in consultations {
                builder = builder.consultation(reason);
            }
            for medication in prescriptions {
                builder = builder.prescription(medication);
            }
            let tree = builder.build();
            for record in tree.records() {
                store.insert(record)?;
                println!("{:<16} {}", record.entity_type(), record.id());
            }
            tracing::info!(
                "seeded patient {} with {} record(s)",
                tree.patient_id(),
                tree.records().len()
            );
        }
        Commands::Show { patient_id } => {
            let snapshot = service.snapshot(RecordId::parse(&patient_id)?)?;
            for record in snapshot.records() {
                println!(
                    "{:<16} {}  {:<8}  {}",
                    record.entity_type(),
                    record.id(),
                    if record.is_active() { "active" } else { "archived" },
                    record.display_name()
                );
            }
        }
        Commands::Archive { entity_type, id } => {
            let target = EntityRef::parse(&entity_type, &id)?;
            tracing::info!("archiving {}", target);
            report(service.archive(target).map(|outcome| {
                println!("Archived {} row(s)", outcome.archived_count);
            }))?;
        }
        Commands::Probe { entity_type, id } => {
            let target = EntityRef::parse(&entity_type, &id)?;
            let probe = service.probe(target)?;
            match probe.ancestor {
                Some(ancestor) => println!(
                    "Confirmation needed: {} is archived. Re-run restore with --cascade to restore the whole patient record.",
                    ancestor
                ),
                None => println!("No confirmation needed"),
            }
        }
        Commands::Restore {
            entity_type,
            id,
            cascade,
        } => {
            let target = EntityRef::parse(&entity_type, &id)?;
            tracing::info!("restoring {} (cascade: {})", target, cascade);
            report(service.commit(target, cascade).map(|outcome| {
                println!(
                    "Restored {} row(s) ({:?})",
                    outcome.restored_count, outcome.scope
                );
                if outcome.remaining_inactive > 0 {
                    println!(
                        "{} record(s) of this patient are still archived; restore the patient to bring them back",
                        outcome.remaining_inactive
                    );
                }
            }))?;
        }
        Commands::Check { patient_id } => {
            let violations = service.check(RecordId::parse(&patient_id)?)?;
            if violations.is_empty() {
                println!("No violations");
            } else {
                for v in &violations {
                    println!("{v}");
                }
                tracing::warn!("patient {} is inconsistent", patient_id);
                anyhow::bail!("{} violation(s) found", violations.len());
            }
        }
    }

    Ok(())
}

/// Prints the partial-write count and retry hint before handing the error to `main`.
fn report(result: Result<(), ArchivalError>) -> anyhow::Result<()> {
    if let Err(e) = &result {
        tracing::warn!("operation failed: {}", e);
        if e.rows_changed() > 0 {
            eprintln!("{} row(s) changed before the failure", e.rows_changed());
        }
        if e.is_retryable() {
            eprintln!("The operation is safe to retry");
        }
    }
    result.map_err(Into::into)
}
