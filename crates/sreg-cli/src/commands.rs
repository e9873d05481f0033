use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use colored::Colorize;
use serde_json::json;

use sreg_core::{Registry, RegistryConfig};
use sreg_log::{EventLog, LogBackend, LogError, PositionedRecord};
use sreg_types::{Entity, EntityType, Status};
use sreg_view::replay_all;

use crate::cli::*;
use crate::document::{with_service, Document};

/// Log file used when neither `--log` nor the config names one.
const DEFAULT_LOG_PATH: &str = "sreg.log";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::Create(args) => cmd_create(config, format, args).await,
        Command::Update(args) => cmd_update(config, format, args).await,
        Command::Delete(args) => cmd_delete(config, format, args).await,
        Command::Get(args) => cmd_get(config, format, args).await,
        Command::Status(args) => cmd_status(config, format, args).await,
        Command::List(args) => cmd_list(config, format, args).await,
        Command::Replay(args) => cmd_replay(config, format, args).await,
        Command::Config(_) => cmd_config(&config),
    }
}

/// The config file (or defaults) with `--log` applied. The CLI always runs
/// over a file log: an in-memory log would not outlive the process.
fn load_config(cli: &Cli) -> anyhow::Result<RegistryConfig> {
    let mut config = match &cli.config {
        Some(path) => RegistryConfig::load(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(path) = &cli.log {
        config.log.backend = LogBackend::File;
        config.log.path = Some(path.clone());
    } else if config.log.backend == LogBackend::Memory {
        config.log.backend = LogBackend::File;
        config.log.path = Some(PathBuf::from(DEFAULT_LOG_PATH));
    }
    Ok(config)
}

/// Open the registry and fold the whole log, so validation sees every
/// entity written by earlier invocations.
async fn open(config: RegistryConfig) -> anyhow::Result<Registry> {
    let registry = Registry::open(config)
        .await
        .context("cannot open the registry log")?;
    registry.sync().await?;
    Ok(registry)
}

fn print_document(format: OutputFormat, verb: &str, document: &Document) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(document)?),
        OutputFormat::Text => {
            println!("{} {} {}", "✓".green().bold(), verb, document.key().to_string().yellow());
            println!("{}", serde_json::to_string_pretty(document)?);
        }
    }
    Ok(())
}

async fn cmd_create(config: RegistryConfig, format: OutputFormat, args: DocumentArgs) -> anyhow::Result<()> {
    let document = Document::load(&args.document)?;
    let registry = open(config).await?;
    let created = with_service!(registry, document, |service, model| {
        service.create(&model).await.map(Document::from)
    })?;
    print_document(format, "created", &created)
}

async fn cmd_update(config: RegistryConfig, format: OutputFormat, args: DocumentArgs) -> anyhow::Result<()> {
    let document = Document::load(&args.document)?;
    let registry = open(config).await?;
    let updated = with_service!(registry, document, |service, model| {
        service.update(&model).await.map(Document::from)
    })?;
    print_document(format, "updated", &updated)
}

async fn cmd_delete(config: RegistryConfig, format: OutputFormat, args: DocumentArgs) -> anyhow::Result<()> {
    let document = Document::load(&args.document)?;
    let key = document.key();
    let registry = open(config).await?;
    let head = registry.log().head().await?;
    with_service!(registry, document, |service, model| {
        service.delete_key(&model.key).await
    })?;
    let removed = registry.log().head().await? - head;

    match format {
        OutputFormat::Json => println!("{}", json!({"deleted": key, "tombstones": removed})),
        OutputFormat::Text => println!(
            "{} deleted {} ({} tombstone{})",
            "✓".green().bold(),
            key.to_string().yellow(),
            removed,
            if removed == 1 { "" } else { "s" }
        ),
    }
    Ok(())
}

async fn cmd_get(config: RegistryConfig, format: OutputFormat, args: DocumentArgs) -> anyhow::Result<()> {
    let document = Document::load(&args.document)?;
    let key = document.key();
    let registry = open(config).await?;
    let stored = with_service!(registry, document, |service, model| {
        service.get(&model.key).await.map(|found| found.map(Document::from))
    })?;
    match stored {
        Some(document) => print_document(format, "found", &document),
        None => bail!("{key} not found"),
    }
}

async fn cmd_status(config: RegistryConfig, format: OutputFormat, args: StatusArgs) -> anyhow::Result<()> {
    let state: serde_json::Value = serde_json::from_str(&args.state).context("--state is not valid JSON")?;
    let document = Document::load(&args.document)?;
    let registry = open(config).await?;
    let updated = with_service!(registry, document, |service, model| {
        service
            .update_status(&model.key, Status::new(state))
            .await
            .map(Document::from)
    })?;
    print_document(format, "status set on", &updated)
}

async fn cmd_list(config: RegistryConfig, format: OutputFormat, args: ListArgs) -> anyhow::Result<()> {
    let entity_type = EntityType::from(args.kind);
    let registry = open(config).await?;
    let scan = registry.views().view(entity_type).find_all(|_| true)?;
    let entities: Vec<&Entity> = scan.iter().collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entities)?),
        OutputFormat::Text => {
            if entities.is_empty() {
                println!("No {entity_type} entities.");
            }
            for entity in entities {
                println!(
                    "{}  {}",
                    entity.key.to_string().yellow(),
                    entity.specification.spec_type.cyan()
                );
            }
        }
    }
    Ok(())
}

async fn read_all(registry: &Registry, batch: usize) -> anyhow::Result<Vec<PositionedRecord>> {
    let millis = registry.config().materializer.read_timeout_ms;
    let mut records = Vec::new();
    loop {
        let read = registry.log().read_from(records.len() as u64, batch.max(1));
        let next = tokio::time::timeout(Duration::from_millis(millis), read)
            .await
            .map_err(|_| LogError::Timeout { millis })??;
        if next.is_empty() {
            return Ok(records);
        }
        records.extend(next);
    }
}

async fn cmd_replay(config: RegistryConfig, format: OutputFormat, args: ReplayArgs) -> anyhow::Result<()> {
    let registry = open(config).await?;
    let records = read_all(&registry, args.batch).await?;
    let views = replay_all(&records)?;
    let digest = views.digest()?;
    if digest != registry.views().digest()? {
        bail!("replayed views differ from the materialized views");
    }

    let mut counts = BTreeMap::new();
    for view in views.iter() {
        counts.insert(view.entity_type().to_string(), view.len()?);
    }

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "records": records.len(),
                "entities": counts,
                "digest": digest,
            }))?
        ),
        OutputFormat::Text => {
            println!(
                "{} Replayed {} records",
                "✓".green().bold(),
                records.len().to_string().bold()
            );
            for (entity_type, count) in &counts {
                println!("  {entity_type:<18} {count}");
            }
            println!("  Digest: {}", digest.cyan());
        }
    }
    Ok(())
}

fn cmd_config(config: &RegistryConfig) -> anyhow::Result<()> {
    print!("{}", config.to_toml_string()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;

    use super::*;
    use sreg_types::{Specification, Zone, ZoneKey};

    fn cli(log: &Path, args: &[&str]) -> Cli {
        let log = log.to_string_lossy().into_owned();
        let mut argv = vec!["sreg", "--log", log.as_str(), "--format", "json"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn write_document(dir: &Path, name: &str, document: serde_json::Value) -> String {
        let path = dir.join(name);
        std::fs::write(&path, document.to_string()).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn create_status_and_delete_over_a_file_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("registry.log");
        let zone = write_document(
            dir.path(),
            "zone.json",
            json!({"kind": "zone", "key": {"name": "aws"}, "specification": {"type": "cloud"}}),
        );

        run_command(cli(&log, &["create", zone.as_str()])).await.unwrap();
        assert!(run_command(cli(&log, &["create", zone.as_str()])).await.is_err());
        run_command(cli(&log, &["status", zone.as_str(), "--state", r#"{"phase":"ready"}"#]))
            .await
            .unwrap();

        let registry = open(RegistryConfig {
            log: sreg_log::LogConfig::file(&log),
            ..RegistryConfig::default()
        })
        .await
        .unwrap();
        let stored = registry.zones().get(&ZoneKey::new("aws")).await.unwrap().unwrap();
        let mut expected = Zone::new(ZoneKey::new("aws"), Specification::new("", "cloud"));
        expected.status = Some(Status::new(json!({"phase": "ready"})));
        assert_eq!(stored, expected);
        drop(registry);

        run_command(cli(&log, &["delete", zone.as_str()])).await.unwrap();
        assert!(run_command(cli(&log, &["get", zone.as_str()])).await.is_err());
        run_command(cli(&log, &["replay"])).await.unwrap();
    }

    #[tokio::test]
    async fn missing_parent_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("registry.log");
        let infra = write_document(
            dir.path(),
            "infra.json",
            json!({
                "kind": "infrastructure",
                "key": {"zone": {"name": "aws"}, "name": "kafka-1"},
                "specification": {"type": "kafka"}
            }),
        );

        let err = run_command(cli(&log, &["create", infra.as_str()])).await.unwrap_err();
        assert!(err.to_string().contains("referential integrity"), "{err}");
        run_command(cli(&log, &["list", "infrastructure"])).await.unwrap();
    }

    #[test]
    fn log_flag_overrides_config() {
        let config = load_config(&cli(Path::new("/tmp/x.log"), &["config"])).unwrap();
        assert_eq!(config.log.backend, LogBackend::File);
        assert_eq!(config.log.path, Some(PathBuf::from("/tmp/x.log")));

        let config = load_config(&Cli::try_parse_from(["sreg", "config"]).unwrap()).unwrap();
        assert_eq!(config.log.path, Some(PathBuf::from(DEFAULT_LOG_PATH)));
    }
}
