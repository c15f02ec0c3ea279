use anyhow::{Context, Result, bail};
use reconcile::ObjectKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Get the default config file path
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("floe").join("config.toml"))
}

// ============================================================================
// Main Config Schema
// ============================================================================

/// The floe configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the Permifrost-style spec document
    pub spec: String,

    /// How to reach the live system
    pub connection: ConnectionConfig,

    /// Context role used for each object kind
    pub roles: RolesConfig,

    /// Glob patterns of object names floe never touches
    pub ignore: IgnoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spec: "permifrost.yml".to_string(),
            connection: ConnectionConfig::default(),
            roles: RolesConfig::default(),
            ignore: IgnoreConfig::default(),
        }
    }
}

impl Config {
    /// Load config from an explicit path, or from the default location.
    ///
    /// A missing default file yields the default config; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_path()?, false),
        };

        if !path.exists() {
            if explicit {
                bail!("Config file not found: {}", path.display());
            }
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate TOML config content
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid TOML format in floe config")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for kind in reconcile::KIND_ORDER {
            if self.roles.for_kind(kind).trim().is_empty() {
                bail!("roles.{kind} must not be empty");
            }
            for pattern in self.ignore.patterns(kind) {
                glob::Pattern::new(pattern)
                    .with_context(|| format!("Invalid ignore pattern for {}: '{pattern}'", kind.plural()))?;
            }
        }
        if self.connection.snowsql.trim().is_empty() {
            bail!("connection.snowsql must not be empty");
        }
        Ok(())
    }

    /// Spec path with `~` and environment variables expanded
    pub fn spec_path(&self) -> Result<PathBuf> {
        let expanded = shellexpand::full(&self.spec)
            .with_context(|| format!("Could not expand spec path '{}'", self.spec))?;
        Ok(PathBuf::from(expanded.as_ref()))
    }
}

// ============================================================================
// Sections
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Named snowsql connection (from ~/.snowsql/config)
    pub name: Option<String>,
    /// snowsql binary
    pub snowsql: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            name: None,
            snowsql: "snowsql".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolesConfig {
    pub warehouse: String,
    pub database: String,
    pub role: String,
    pub user: String,
    pub schema: String,
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            warehouse: "SYSADMIN".to_string(),
            database: "SYSADMIN".to_string(),
            role: "SECURITYADMIN".to_string(),
            user: "SECURITYADMIN".to_string(),
            schema: "SYSADMIN".to_string(),
        }
    }
}

impl RolesConfig {
    pub fn for_kind(&self, kind: ObjectKind) -> &str {
        match kind {
            ObjectKind::Warehouse => &self.warehouse,
            ObjectKind::Database => &self.database,
            ObjectKind::Role => &self.role,
            ObjectKind::User => &self.user,
            ObjectKind::Schema => &self.schema,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    pub warehouses: Vec<String>,
    pub databases: Vec<String>,
    pub roles: Vec<String>,
    pub users: Vec<String>,
    pub schemas: Vec<String>,
}

impl IgnoreConfig {
    pub fn patterns(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Warehouse => &self.warehouses,
            ObjectKind::Database => &self.databases,
            ObjectKind::Role => &self.roles,
            ObjectKind::User => &self.users,
            ObjectKind::Schema => &self.schemas,
        }
    }
}
