//! Supported liquibase commands and their attribute bags.
//!
//! Each command carries a typed attribute struct: named optional fields for
//! the flags we model, plus an ordered `extra` bag for anything the tool
//! accepts that we don't. Attributes are scoped to a single invocation and
//! never merged with the global configuration. Nothing is validated here;
//! a bad value becomes a flag the tool itself rejects.

use crate::config::LiquibaseConfig;
use crate::value::AttrValue;

/// A single liquibase command invocation.
#[derive(Debug, Clone)]
pub enum LiquibaseCommand {
    /// Apply pending changesets.
    Update(UpdateAttrs),
    /// Compute the checksum of one changeset.
    CalculateCheckSum(CalculateCheckSumAttrs),
    /// Preview the rollback SQL for a number of future changesets.
    FutureRollbackCountSql(FutureRollbackCountSqlAttrs),
    /// Reverse-engineer a changelog from an existing database.
    GenerateChangeLog(GenerateChangeLogAttrs),
}

#[derive(Debug, Clone, Default)]
pub struct UpdateAttrs {
    pub contexts: Option<String>,
    pub labels: Option<String>,
    pub extra: Vec<(String, AttrValue)>,
}

#[derive(Debug, Clone, Default)]
pub struct CalculateCheckSumAttrs {
    pub change_set_path: Option<String>,
    pub change_set_author: Option<String>,
    pub change_set_id: Option<String>,
    pub extra: Vec<(String, AttrValue)>,
}

#[derive(Debug, Clone, Default)]
pub struct FutureRollbackCountSqlAttrs {
    pub count: Option<i64>,
    pub output_file: Option<String>,
    pub extra: Vec<(String, AttrValue)>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateChangeLogAttrs {
    pub change_log_file: Option<String>,
    pub data_output_directory: Option<String>,
    pub extra: Vec<(String, AttrValue)>,
}

impl LiquibaseCommand {
    /// The literal command token the external tool expects.
    pub fn name(&self) -> &'static str {
        match self {
            LiquibaseCommand::Update(_) => "update",
            LiquibaseCommand::CalculateCheckSum(_) => "calculateCheckSum",
            LiquibaseCommand::FutureRollbackCountSql(_) => "futureRollbackCountSQL",
            LiquibaseCommand::GenerateChangeLog(_) => "generateChangeLog",
        }
    }

    /// One `--key=value` token per attribute entry, named fields first, then
    /// `extra` in insertion order.
    pub fn attr_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        match self {
            LiquibaseCommand::Update(attrs) => {
                push_str(&mut flags, "contexts", &attrs.contexts);
                push_str(&mut flags, "labels", &attrs.labels);
                push_extra(&mut flags, &attrs.extra);
            }
            LiquibaseCommand::CalculateCheckSum(attrs) => {
                push_str(&mut flags, "changeSetPath", &attrs.change_set_path);
                push_str(&mut flags, "changeSetAuthor", &attrs.change_set_author);
                push_str(&mut flags, "changeSetId", &attrs.change_set_id);
                push_extra(&mut flags, &attrs.extra);
            }
            LiquibaseCommand::FutureRollbackCountSql(attrs) => {
                if let Some(count) = attrs.count {
                    flags.push(format!("--count={}", AttrValue::Int(count)));
                }
                push_str(&mut flags, "outputFile", &attrs.output_file);
                push_extra(&mut flags, &attrs.extra);
            }
            LiquibaseCommand::GenerateChangeLog(attrs) => {
                push_str(&mut flags, "changeLogFile", &attrs.change_log_file);
                push_str(&mut flags, "dataOutputDirectory", &attrs.data_output_directory);
                push_extra(&mut flags, &attrs.extra);
            }
        }
        flags
    }

    /// Build the full argument array for this invocation: global flags from
    /// the configuration, the command token, then the attribute flags. The
    /// tool path itself is not included; it is the program, not an argument.
    pub fn build_args(&self, config: &LiquibaseConfig) -> Vec<String> {
        let mut args = config.global_flags();
        args.push(self.name().to_string());
        args.extend(self.attr_flags());
        args
    }

    /// Human-readable single-string rendering, for logs only. Joining with
    /// spaces loses token boundaries; the tool is always invoked with the
    /// argument array from [`build_args`](Self::build_args).
    pub fn command_line(&self, config: &LiquibaseConfig) -> String {
        let mut tokens = vec![config.liquibase.clone()];
        tokens.extend(self.build_args(config));
        tokens.join(" ")
    }
}

fn push_str(flags: &mut Vec<String>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        flags.push(format!("--{key}={}", AttrValue::Str(value.clone())));
    }
}

fn push_extra(flags: &mut Vec<String>, extra: &[(String, AttrValue)]) {
    for (key, value) in extra {
        flags.push(format!("--{key}={value}"));
    }
}
