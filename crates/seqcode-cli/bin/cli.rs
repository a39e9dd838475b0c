use crate::backend::Access;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use seqcode_core::{CodeSpec, EntityKind, GenerateError};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "SEQCODE_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SEQCODE_MYSQL_DSN";
pub const REDIS_URL_ENV: &str = "SEQCODE_REDIS_URL";
pub const COUNTER_TABLE_ENV: &str = "SEQCODE_COUNTER_TABLE";
pub const MAX_ATTEMPTS_ENV: &str = "SEQCODE_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "SEQCODE_LOG_FORMAT";

pub const DEFAULT_COUNTER_TABLE: &str = seqcode_storage::mysql::DEFAULT_COUNTER_TABLE;
pub const DEFAULT_MAX_ATTEMPTS: u32 = seqcode_generator::DEFAULT_MAX_ATTEMPTS;
pub const DEFAULT_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "seqcode", about = "Allocate sequential entity codes")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = COUNTER_TABLE_ENV, default_value = DEFAULT_COUNTER_TABLE)]
    pub counter_table: String,

    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate the next free code of a sequence.
    Generate(GenerateArgs),
    /// Show the counter record of a sequence without changing it.
    Peek {
        #[arg(long)]
        sequence: String,
    },
    /// List the built-in entity kinds and their code specs.
    Entities,
}

impl Command {
    /// Storage access the command needs.
    pub fn access(&self) -> Access {
        match self {
            Command::Generate(_) => Access::ReadWrite,
            Command::Peek { .. } | Command::Entities => Access::ReadOnly,
        }
    }
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("target").required(true).args(["entity", "sequence"])))]
pub struct GenerateArgs {
    /// Built-in entity kind, by sequence name (e.g. `cuentas`).
    #[arg(long, value_parser = parse_entity, conflicts_with_all = ["collection", "field", "prefix", "length"])]
    pub entity: Option<EntityKind>,

    /// Sequence name of a custom spec.
    #[arg(long, requires_all = ["collection", "field"])]
    pub sequence: Option<String>,

    /// Collection (table) the code will be inserted into.
    #[arg(long)]
    pub collection: Option<String>,

    /// Field of the collection that holds the code.
    #[arg(long)]
    pub field: Option<String>,

    #[arg(long)]
    pub prefix: Option<String>,

    /// Digits of the zero-padded numeric portion.
    #[arg(long)]
    pub length: Option<usize>,
}

impl GenerateArgs {
    /// Returns the code spec and target collection selected by the arguments.
    pub fn target(&self) -> Result<(CodeSpec, String), GenerateError> {
        if let Some(kind) = self.entity {
            return Ok((kind.spec(), kind.collection().to_string()));
        }

        match (&self.sequence, &self.collection, &self.field) {
            (Some(sequence), Some(collection), Some(field)) => {
                let spec = CodeSpec::new(
                    sequence.as_str(),
                    field.as_str(),
                    self.prefix.clone().unwrap_or_default(),
                    self.length.unwrap_or(DEFAULT_LENGTH),
                );
                Ok((spec, collection.clone()))
            }
            _ => Err(GenerateError::InvalidArgument(
                "either --entity or --sequence, --collection and --field are required".to_string(),
            )),
        }
    }
}

fn parse_entity(value: &str) -> Result<EntityKind, GenerateError> {
    value.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CLI, clap::Error> {
        CLI::try_parse_from(std::iter::once("seqcode").chain(args.iter().copied()))
    }

    #[test]
    fn generate_by_entity() {
        let cli = parse(&["generate", "--entity", "cuentas"]).unwrap();
        assert_eq!(cli.storage, StorageBackendArg::InMemory);
        assert_eq!(cli.max_attempts, DEFAULT_MAX_ATTEMPTS);

        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let (spec, collection) = args.target().unwrap();
        assert_eq!(spec, EntityKind::Account.spec());
        assert_eq!(collection, "cuentas");
    }

    #[test]
    fn generate_by_custom_spec() {
        let cli = parse(&[
            "generate",
            "--sequence",
            "lugares",
            "--collection",
            "lugares",
            "--field",
            "codigo",
            "--prefix",
            "LUG-",
        ])
        .unwrap();

        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let (spec, _) = args.target().unwrap();
        assert_eq!(spec.prefix(), "LUG-");
        assert_eq!(spec.width(), DEFAULT_LENGTH);
    }

    #[test]
    fn generate_requires_a_target() {
        assert!(parse(&["generate"]).is_err());
        assert!(parse(&["generate", "--sequence", "lugares"]).is_err());
    }

    #[test]
    fn unknown_entity_is_rejected() {
        assert!(parse(&["generate", "--entity", "nope"]).is_err());
    }

    #[test]
    fn mysql_backend_requires_dsn() {
        assert!(parse(&["--storage", "mysql", "entities"]).is_err());
        assert!(parse(&["--storage", "mysql", "--mysql-dsn", "mysql://x", "entities"]).is_ok());
    }

    #[test]
    fn only_generate_may_create_tables() {
        let generate = parse(&["generate", "--entity", "flota"]).unwrap();
        assert_eq!(generate.command.access(), Access::ReadWrite);

        let peek = parse(&[
            "--storage",
            "mysql",
            "--mysql-dsn",
            "mysql://x",
            "peek",
            "--sequence",
            "flota",
        ])
        .unwrap();
        assert_eq!(peek.command.access(), Access::ReadOnly);
    }

    #[test]
    fn zero_attempts_is_rejected() {
        assert!(parse(&["--max-attempts", "0", "entities"]).is_err());
    }
}
