use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use sreg_types::EntityType;

#[derive(Parser)]
#[command(
    name = "sreg",
    about = "Stream registry: typed entities over an append-only event log",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at DEBUG level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Segment file holding the registry log.
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    /// TOML configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the entity described by a document
    Create(DocumentArgs),
    /// Replace the specification of an existing entity
    Update(DocumentArgs),
    /// Delete an entity and everything that references it
    Delete(DocumentArgs),
    /// Show the stored version of an entity
    Get(DocumentArgs),
    /// Set the status of an existing entity
    Status(StatusArgs),
    /// List every entity of one kind
    List(ListArgs),
    /// Rebuild all views from the log and print their digest
    Replay(ReplayArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct DocumentArgs {
    /// JSON document with a `kind` field, or `-` for stdin.
    pub document: PathBuf,
}

#[derive(Args)]
pub struct StatusArgs {
    pub document: PathBuf,
    /// New status as JSON.
    #[arg(long)]
    pub state: String,
}

#[derive(Args)]
pub struct ListArgs {
    pub kind: Kind,
}

#[derive(Args)]
pub struct ReplayArgs {
    /// Records read per batch.
    #[arg(long, default_value = "1024")]
    pub batch: usize,
}

#[derive(Args)]
pub struct ConfigArgs {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Kind {
    Domain,
    Schema,
    Stream,
    Zone,
    Infrastructure,
    Producer,
    Consumer,
    StreamBinding,
    ProducerBinding,
    ConsumerBinding,
    ProcessBinding,
}

impl From<Kind> for EntityType {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Domain => EntityType::Domain,
            Kind::Schema => EntityType::Schema,
            Kind::Stream => EntityType::Stream,
            Kind::Zone => EntityType::Zone,
            Kind::Infrastructure => EntityType::Infrastructure,
            Kind::Producer => EntityType::Producer,
            Kind::Consumer => EntityType::Consumer,
            Kind::StreamBinding => EntityType::StreamBinding,
            Kind::ProducerBinding => EntityType::ProducerBinding,
            Kind::ConsumerBinding => EntityType::ConsumerBinding,
            Kind::ProcessBinding => EntityType::ProcessBinding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_create() {
        let cli = Cli::try_parse_from(["sreg", "create", "zone.json"]).unwrap();
        if let Command::Create(args) = cli.command {
            assert_eq!(args.document, PathBuf::from("zone.json"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_status_requires_state() {
        assert!(Cli::try_parse_from(["sreg", "status", "zone.json"]).is_err());
        let cli =
            Cli::try_parse_from(["sreg", "status", "zone.json", "--state", r#"{"up":true}"#])
                .unwrap();
        if let Command::Status(args) = cli.command {
            assert_eq!(args.state, r#"{"up":true}"#);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_list_kind() {
        let cli = Cli::try_parse_from(["sreg", "list", "stream-binding"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(EntityType::from(args.kind), EntityType::StreamBinding);
        } else {
            panic!("wrong command");
        }
        assert!(Cli::try_parse_from(["sreg", "list", "topic"]).is_err());
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "sreg",
            "replay",
            "--log",
            "/tmp/registry.log",
            "--format",
            "json",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.format, OutputFormat::Json));
        assert_eq!(cli.log, Some(PathBuf::from("/tmp/registry.log")));
        assert!(matches!(cli.command, Command::Replay(ReplayArgs { batch: 1024 })));
    }

    #[test]
    fn parse_config() {
        let cli = Cli::try_parse_from(["sreg", "config", "--config", "sreg.toml"]).unwrap();
        assert!(matches!(cli.command, Command::Config(_)));
        assert_eq!(cli.config, Some(PathBuf::from("sreg.toml")));
    }
}
