//! snowsql-backed client for the live system
//!
//! Each call spawns one `snowsql` process, so there is no session shared
//! between calls. `USE ROLE` statements are therefore run once to check the
//! role is usable and then remembered and passed as `--rolename` to every
//! following call, which gives the executor the session semantics it expects.

use anyhow::{Context, Result, bail};
use reconcile::StatementRunner;
use reconcile::ddl::redact;
use serde_json::Value;
use std::process::Command;
use std::sync::Mutex;

use crate::config::ConnectionConfig;
use crate::inspector::{Row, SqlClient};

/// Client that shells out to the snowsql CLI
#[derive(Debug)]
pub struct SnowsqlClient {
    binary: String,
    connection: Option<String>,
    role: Mutex<Option<String>>,
}

impl SnowsqlClient {
    pub fn new(config: &ConnectionConfig) -> Self {
        Self {
            binary: config.snowsql.clone(),
            connection: config.name.clone(),
            role: Mutex::new(None),
        }
    }

    fn current_role(&self) -> Option<String> {
        match self.role.lock() {
            Ok(role) => role.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_role(&self, role: String) {
        match self.role.lock() {
            Ok(mut current) => *current = Some(role),
            Err(poisoned) => *poisoned.into_inner() = Some(role),
        }
    }

    /// Arguments for one snowsql invocation
    pub fn args(&self, sql: &str, role: Option<&str>) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(connection) = &self.connection {
            args.extend(["--connection".to_string(), connection.clone()]);
        }
        if let Some(role) = role {
            args.extend(["--rolename".to_string(), role.to_string()]);
        }
        args.extend(["--query".to_string(), sql.to_string()]);
        for option in [
            "output_format=json",
            "friendly=false",
            "header=true",
            "timing=false",
            "exit_on_error=true",
            "log_level=CRITICAL",
        ] {
            args.extend(["--option".to_string(), option.to_string()]);
        }
        args
    }

    /// Run snowsql and capture stdout
    fn run_capture(&self, sql: &str, role: Option<&str>) -> Result<String> {
        let args = self.args(sql, role);
        log::trace!("{} {}", self.binary, redact(&args.join(" ")));

        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .with_context(|| format!("Failed to execute: {}", self.binary))?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if output.status.success() {
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            bail!("snowsql failed: {message}")
        }
    }
}

impl SqlClient for SnowsqlClient {
    fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let stdout = self.run_capture(sql, self.current_role().as_deref())?;
        parse_json_rows(&stdout).with_context(|| format!("Unexpected output for: {sql}"))
    }
}

impl StatementRunner for SnowsqlClient {
    fn run(&self, statement: &str) -> Result<()> {
        if let Some(role) = parse_use_role(statement) {
            self.run_capture(statement, Some(&role))?;
            self.set_role(role);
            return Ok(());
        }
        self.run_capture(statement, self.current_role().as_deref())?;
        Ok(())
    }
}

/// Role name from a `USE ROLE <name>` statement
pub fn parse_use_role(statement: &str) -> Option<String> {
    let mut words = statement.split_whitespace();
    let is_use_role = words.next()?.eq_ignore_ascii_case("USE") && words.next()?.eq_ignore_ascii_case("ROLE");
    let role = words.next()?.trim_end_matches(';');
    (is_use_role && words.next().is_none() && !role.is_empty()).then(|| role.to_string())
}

/// Parse snowsql JSON output into rows with lower-cased column names.
///
/// JSON `null` becomes the literal `null`, matching how the live system
/// reports unset attributes elsewhere.
pub fn parse_json_rows(stdout: &str) -> Result<Vec<Row>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(trimmed).context("Invalid JSON from snowsql")?;
    let Value::Array(items) = value else {
        bail!("Expected a JSON array of rows");
    };

    items
        .into_iter()
        .map(|item| match item {
            Value::Object(map) => Ok(map
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), json_text(v)))
                .collect()),
            other => bail!("Expected a JSON object row, found {other}"),
        })
        .collect()
}

fn json_text(value: Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}
