mod backend;
mod cli;

use crate::backend::Backend;
use crate::cli::{Command, GenerateArgs, LogFormat, CLI};
use anyhow::Context;
use clap::Parser;
use seqcode_core::{CodeSpec, CounterStore, EntityCode, EntityKind, SequenceName};
use seqcode_generator::{GeneratorSettings, SequentialCodeGenerator};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize)]
struct Generated<'a> {
    code: EntityCode,
    sequence: &'a str,
    collection: &'a str,
}

#[derive(Debug, Serialize)]
struct CatalogEntry {
    kind: EntityKind,
    collection: &'static str,
    spec: CodeSpec,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    match &config.command {
        Command::Entities => {
            let catalog: Vec<CatalogEntry> = EntityKind::ALL
                .into_iter()
                .map(|kind| CatalogEntry {
                    kind,
                    collection: kind.collection(),
                    spec: kind.spec(),
                })
                .collect();
            print_json(&catalog)
        }
        Command::Peek { sequence } => {
            let sequence = SequenceName::new(sequence.as_str())?;
            let backend = Backend::open(&config, config.command.access()).await?;
            let record = backend
                .counters()
                .current(&sequence)
                .await
                .with_context(|| format!("failed to read counter '{sequence}'"))?;
            print_json(&record)
        }
        Command::Generate(args) => generate(&config, args).await,
    }
}

async fn generate(config: &CLI, args: &GenerateArgs) -> anyhow::Result<()> {
    let (spec, collection) = args.target()?;
    let backend = Backend::open(config, config.command.access()).await?;
    let target = backend.lookup(&collection)?;

    let settings = GeneratorSettings::builder()
        .max_attempts(config.max_attempts)
        .build();
    let generator = SequentialCodeGenerator::new(backend.counters(), settings)?;

    info!(
        storage = %config.storage,
        sequence = spec.sequence(),
        collection = %collection,
        "generating code"
    );

    let code = generator
        .generate(target.as_ref(), &spec)
        .await
        .with_context(|| format!("failed to generate a code for '{}'", spec.sequence()))?;

    print_json(&Generated {
        code,
        sequence: spec.sequence(),
        collection: &collection,
    })
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Logs go to stderr so stdout carries only the JSON result.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
