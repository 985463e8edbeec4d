//! Orchestrator configuration

use crate::amm::{AmmParams, FundingPolicy};
use crate::compiler::DEFAULT_PROGRAM_VERSION;
use crate::confirm::DEFAULT_TIMEOUT_ROUNDS;
use crate::types::{AppId, AssetId};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "AMM_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "amm-config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Node REST endpoint
    pub node_url: String,

    /// Node API token
    pub api_token: String,

    /// Signing account keypair path
    pub keypair_path: String,

    /// Approval program source
    pub approval_program_path: String,

    /// Clear-state program source
    pub clear_program_path: String,

    /// Program version passed to the compiler
    pub program_version: u8,

    /// Rounds to wait for each confirmation
    pub confirmation_timeout_rounds: u64,

    /// Assets the escrow is funded for during setup
    pub funded_asset_count: u64,

    pub token_a: AssetId,
    pub token_b: AssetId,

    /// Swap fee in basis points
    pub fee_bps: u64,

    /// Minimum supply increment
    pub min_increment: u64,

    /// Application created by a previous run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<AppId>,

    /// Pool token returned by a previous setup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_token: Option<AssetId>,
}

/// Program sources read from disk
#[derive(Debug, Clone)]
pub struct ProgramSources {
    pub approval: String,
    pub clear: String,
}

impl Config {
    /// Config file named by `AMM_CONFIG`, or `amm-config.toml`
    pub fn path() -> String {
        std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Load from `path`, or use localnet defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            log::warn!("No config at {}, using localnet defaults", path);
            return Ok(Self::default_localnet());
        }
        Self::load_from(path)
    }

    pub fn load_from(path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&config_str).context("Failed to parse config TOML")?;

        Ok(config)
    }

    /// Local sandbox node defaults
    pub fn default_localnet() -> Self {
        Self {
            node_url: "http://localhost:4001".to_string(),
            api_token: "a".repeat(64),
            keypair_path: "~/.config/amm/id.json".to_string(),
            approval_program_path: "contracts/amm_approval.teal".to_string(),
            clear_program_path: "contracts/amm_clear.teal".to_string(),
            program_version: DEFAULT_PROGRAM_VERSION,
            confirmation_timeout_rounds: DEFAULT_TIMEOUT_ROUNDS,
            funded_asset_count: FundingPolicy::default().asset_count,
            token_a: 0,
            token_b: 0,
            fee_bps: 30,
            min_increment: 1_000,
            app_id: None,
            pool_token: None,
        }
    }

    /// Write default config to file
    pub fn write_default(path: &str) -> Result<()> {
        Self::default_localnet().save(path)?;
        log::info!("Created default config at {}", path);
        Ok(())
    }

    /// Write this config to `path`, replacing the file
    pub fn save(&self, path: &str) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, toml_str).context(format!("Failed to write config to {}", path))
    }

    pub fn amm_params(&self) -> AmmParams {
        AmmParams {
            token_a: self.token_a,
            token_b: self.token_b,
            fee_bps: self.fee_bps,
            min_increment: self.min_increment,
        }
    }

    pub fn funding(&self) -> FundingPolicy {
        FundingPolicy::new(self.funded_asset_count)
    }

    pub fn read_programs(&self) -> Result<ProgramSources> {
        let read = |path: &str| {
            let expanded = shellexpand::tilde(path);
            std::fs::read_to_string(expanded.as_ref())
                .context(format!("Failed to read program source {}", path))
        };

        Ok(ProgramSources {
            approval: read(&self.approval_program_path)?,
            clear: read(&self.clear_program_path)?,
        })
    }
}
