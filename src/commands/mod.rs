//! Subcommand implementations

pub mod inspect;
pub mod reconcile;
pub mod validate;

use anyhow::Result;
use std::path::Path;

use crate::Context;
use crate::config::Config;
use crate::filter::IgnoreRules;
use crate::loader::{DesiredState, load_spec};
use crate::password::RandomPassword;

/// Config and ignore rules shared by the subcommands
pub struct Session {
    pub config: Config,
    pub rules: IgnoreRules,
}

impl Session {
    pub fn open(ctx: &Context) -> Result<Self> {
        let config = Config::load(ctx.config_path.as_deref())?;
        let rules = IgnoreRules::from_config(&config.ignore)?;
        Ok(Self { config, rules })
    }

    /// Load the spec named on the command line, or the one from config
    pub fn desired(&self, spec_override: Option<&Path>) -> Result<DesiredState> {
        let path = match spec_override {
            Some(p) => p.to_path_buf(),
            None => self.config.spec_path()?,
        };
        log::info!("Loading spec from {}", path.display());
        load_spec(&path, &RandomPassword::default())
    }
}
