use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use anamnesis_lib::clock::SystemClock;
use anamnesis_lib::config;
use anamnesis_lib::models::PatientIntakeRecord;
use anamnesis_lib::pipeline::DegradationChain;
use anamnesis_lib::pipeline_config::PipelineConfig;

#[derive(Parser)]
#[command(name = "anamnesis")]
#[command(version = config::APP_VERSION)]
#[command(about = "Clinical anamnesis narrative and red-flag generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce the narrative and red flags for an intake record
    Narrative {
        /// Path to the intake record JSON
        record: PathBuf,
        /// Store the narrative back into the record file
        #[arg(long)]
        write_back: bool,
    },
    /// Evaluate red flags only
    RedFlags {
        /// Path to the intake record JSON
        record: PathBuf,
    },
    /// Suggest follow-up questions
    Questions {
        /// Path to the intake record JSON
        record: PathBuf,
    },
    /// List models offered by the generation backend
    Models,
    /// Check that the generation backend is reachable
    Ping,
    /// Delete every cached response
    ClearCache,
}

fn read_record(path: &Path) -> Result<PatientIntakeRecord, Box<dyn std::error::Error>> {
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn log_cache_stats(chain: &DegradationChain) {
    if let Some(cache) = chain.gateway().cache() {
        let stats = cache.stats();
        tracing::info!(
            memory_hits = stats.memory_hits,
            disk_hits = stats.disk_hits,
            misses = stats.misses,
            writes = stats.writes,
            "Cache statistics"
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    anamnesis_lib::init_tracing();

    let cli = Cli::parse();
    let pipeline_config = PipelineConfig::from_env()?;
    tracing::info!(
        version = config::APP_VERSION,
        production = pipeline_config.production,
        "{} starting",
        config::APP_NAME
    );

    let chain = DegradationChain::from_config(&pipeline_config, Arc::new(SystemClock))?;

    match cli.command {
        Commands::Narrative { record: path, write_back } => {
            let mut record = read_record(&path)?;
            let result = chain.produce_narrative(&record)?;
            if write_back {
                record.attach_narrative(result.text.clone());
                std::fs::write(&path, serde_json::to_string_pretty(&record)?)?;
            }
            println!("{}", serde_json::to_string_pretty(&result)?);
            log_cache_stats(&chain);
        }
        Commands::RedFlags { record } => {
            let record = read_record(&record)?;
            let flags = chain.detect_red_flags(&record);
            println!("{}", serde_json::to_string_pretty(&flags)?);
        }
        Commands::Questions { record } => {
            let record = read_record(&record)?;
            for question in chain.follow_up_questions(&record) {
                println!("{question}");
            }
            log_cache_stats(&chain);
        }
        Commands::Models => {
            for model in chain.gateway().get_available_models()? {
                println!("{}\t{}", model.id, model.created);
            }
        }
        Commands::Ping => {
            if chain.gateway().test_connection() {
                println!("Generation backend '{}' is reachable", chain.gateway().backend_name());
            } else {
                eprintln!("Generation backend '{}' is not reachable", chain.gateway().backend_name());
                std::process::exit(1);
            }
        }
        Commands::ClearCache => {
            let report = chain.gateway().clear_cache();
            println!(
                "Removed {} cached responses ({} could not be deleted)",
                report.removed, report.failed
            );
        }
    }

    Ok(())
}
