//! liquictl CLI - thin driver for the external liquibase tool
//!
//! Maps one subcommand onto each supported liquibase command, renders the
//! global configuration and per-command attributes into flags, and exits
//! with the tool's own exit code.

use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use liquictl_core::{
    CalculateCheckSumAttrs, FutureRollbackCountSqlAttrs, GenerateChangeLogAttrs, Liquibase,
    LiquibaseConfig, UpdateAttrs,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "liquictl",
    author,
    version,
    about = "Run liquibase commands with merged defaults and relayed output",
    long_about = "Thin wrapper around the liquibase CLI: merges a defaults file \
                  with command-line overrides, renders --key=value flags, spawns \
                  the tool, and relays its output and exit code."
)]
struct Cli {
    #[command(flatten)]
    globals: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Path to the liquibase executable
    #[arg(long, global = true)]
    liquibase: Option<String>,

    /// Changelog file the tool operates on
    #[arg(long, global = true)]
    changelog_file: Option<String>,

    /// JDBC connection URL
    #[arg(long, global = true)]
    url: Option<String>,

    #[arg(long, global = true)]
    username: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    /// Driver classpath handed through to the tool
    #[arg(long, global = true)]
    classpath: Option<String>,

    /// Liquibase's own log level (not liquictl's; use RUST_LOG for that)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// TOML defaults file (default: ~/.liquictl/config.toml if present)
    #[arg(long, global = true)]
    defaults_file: Option<PathBuf>,

    /// Extra global flag as key=value, repeatable
    #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_val,
          action = ArgAction::Append, global = true)]
    set: Vec<(String, String)>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending changesets (liquibase update)
    Update(UpdateArgs),
    /// Compute a changeset checksum (liquibase calculateCheckSum)
    CalculateChecksum(CalculateChecksumArgs),
    /// Preview rollback SQL for future changesets (liquibase futureRollbackCountSQL)
    FutureRollbackCountSql(FutureRollbackCountSqlArgs),
    /// Reverse-engineer a changelog from a database (liquibase generateChangeLog)
    GenerateChangelog(GenerateChangelogArgs),
}

#[derive(Args, Debug)]
struct UpdateArgs {
    /// Contexts to run, scoped to this invocation
    #[arg(long)]
    contexts: Option<String>,

    /// Label expression, scoped to this invocation
    #[arg(long)]
    labels: Option<String>,

    /// Extra attribute flag as key=value, repeatable
    #[arg(short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_val,
          action = ArgAction::Append)]
    attr: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct CalculateChecksumArgs {
    #[arg(long)]
    change_set_path: Option<String>,

    #[arg(long)]
    change_set_author: Option<String>,

    #[arg(long)]
    change_set_id: Option<String>,

    #[arg(short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_val,
          action = ArgAction::Append)]
    attr: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct FutureRollbackCountSqlArgs {
    /// Number of future changesets to preview
    #[arg(long)]
    count: Option<i64>,

    #[arg(long)]
    output_file: Option<String>,

    #[arg(short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_val,
          action = ArgAction::Append)]
    attr: Vec<(String, String)>,
}

#[derive(Args, Debug)]
struct GenerateChangelogArgs {
    /// Output changelog path
    #[arg(long)]
    output_changelog: Option<String>,

    #[arg(long)]
    data_output_directory: Option<String>,

    #[arg(short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_val,
          action = ArgAction::Append)]
    attr: Vec<(String, String)>,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build the final configuration: built-in defaults, then the defaults file,
/// then command-line overrides, each layer winning key by key.
fn load_config(globals: &GlobalArgs) -> Result<LiquibaseConfig> {
    let mut config = match &globals.defaults_file {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read defaults file {}", path.display()))?;
            LiquibaseConfig::from_toml_str(&text)
                .with_context(|| format!("failed to parse defaults file {}", path.display()))?
        }
        None => match default_config_path() {
            Some(path) if path.exists() => {
                let text = fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                debug!("loaded defaults from {}", path.display());
                LiquibaseConfig::from_toml_str(&text)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            _ => LiquibaseConfig::default(),
        },
    };

    if let Some(liquibase) = &globals.liquibase {
        config.liquibase = liquibase.clone();
    }
    if let Some(changelog) = &globals.changelog_file {
        config.change_log_file = changelog.clone();
    }
    if globals.url.is_some() {
        config.url = globals.url.clone();
    }
    if globals.username.is_some() {
        config.username = globals.username.clone();
    }
    if globals.password.is_some() {
        config.password = globals.password.clone();
    }
    if globals.classpath.is_some() {
        config.classpath = globals.classpath.clone();
    }
    if globals.log_level.is_some() {
        config.log_level = globals.log_level.clone();
    }
    config.extra.extend(globals.set.iter().cloned());

    Ok(config)
}

/// Implicit defaults-file location: `LIQUICTL_CONFIG` when set, otherwise
/// `~/.liquictl/config.toml`.
fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("LIQUICTL_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".liquictl").join("config.toml"))
}

fn extra_attrs(pairs: &[(String, String)]) -> Vec<(String, liquictl_core::AttrValue)> {
    pairs
        .iter()
        .map(|(key, value)| (key.clone(), value.as_str().into()))
        .collect()
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize tracing: {e}"))?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().ok();
    let cli = Cli::parse();

    let config = load_config(&cli.globals)?;
    let liquibase = Liquibase::new(config);

    let exit = match cli.command {
        Commands::Update(args) => {
            liquibase
                .update(UpdateAttrs {
                    contexts: args.contexts,
                    labels: args.labels,
                    extra: extra_attrs(&args.attr),
                })
                .await?
        }
        Commands::CalculateChecksum(args) => {
            liquibase
                .calculate_checksum(CalculateCheckSumAttrs {
                    change_set_path: args.change_set_path,
                    change_set_author: args.change_set_author,
                    change_set_id: args.change_set_id,
                    extra: extra_attrs(&args.attr),
                })
                .await?
        }
        Commands::FutureRollbackCountSql(args) => {
            liquibase
                .future_rollback_count_sql(FutureRollbackCountSqlAttrs {
                    count: args.count,
                    output_file: args.output_file,
                    extra: extra_attrs(&args.attr),
                })
                .await?
        }
        Commands::GenerateChangelog(args) => {
            liquibase
                .generate_changelog(GenerateChangeLogAttrs {
                    change_log_file: args.output_changelog,
                    data_output_directory: args.data_output_directory,
                    extra: extra_attrs(&args.attr),
                })
                .await?
        }
    };

    // Relay the tool's own exit code; a signal kill maps to 1
    std::process::exit(exit.code.unwrap_or(1));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_val_parsing() {
        assert_eq!(
            parse_key_val("contexts=prod").unwrap(),
            ("contexts".to_string(), "prod".to_string())
        );
        assert_eq!(
            parse_key_val("labels=").unwrap(),
            ("labels".to_string(), String::new())
        );
        assert!(parse_key_val("no-equals").is_err());
        assert!(parse_key_val("=value").is_err());
    }

    // Keep load_config away from any real ~/.liquictl/config.toml
    fn ignore_home_config() {
        std::env::set_var("LIQUICTL_CONFIG", "/nonexistent/liquictl-config.toml");
    }

    #[test]
    fn cli_flags_override_defaults() {
        ignore_home_config();
        let cli = Cli::parse_from([
            "liquictl",
            "--liquibase",
            "/opt/liquibase/liquibase",
            "--url",
            "jdbc:h2:mem:test",
            "-D",
            "liquibaseSchemaName=public",
            "update",
        ]);
        let config = load_config(&cli.globals).unwrap();
        assert_eq!(config.liquibase, "/opt/liquibase/liquibase");
        assert_eq!(config.url.as_deref(), Some("jdbc:h2:mem:test"));
        assert!(config
            .extra
            .contains(&("liquibaseSchemaName".to_string(), "public".to_string())));
    }

    #[test]
    fn update_contexts_is_a_command_attribute_not_a_global_flag() {
        ignore_home_config();
        let cli = Cli::parse_from([
            "liquictl",
            "update",
            "--contexts",
            "prod",
            "--labels",
            "v1.*",
        ]);
        let config = load_config(&cli.globals).unwrap();
        assert!(config.contexts.is_none());
        assert!(config.labels.is_none());

        let Commands::Update(args) = cli.command else {
            panic!("expected update subcommand");
        };
        assert_eq!(args.contexts.as_deref(), Some("prod"));
        assert_eq!(args.labels.as_deref(), Some("v1.*"));
    }
}
