//! AMM Orchestrator CLI
//!
//! Deploys the AMM application and drives liquidity operations against a node.
//!
//! ```text
//! amm-orchestrator init-config [path]
//! amm-orchestrator deploy
//! amm-orchestrator create | setup | opt-in
//! amm-orchestrator supply <amount_a> <amount_b>
//! ```

use amm_orchestrator::{
    config::Config, wallet, Address, AlgodClient, AppId, AssetId, ContractPrograms, Orchestrator,
};
use anyhow::{bail, Context, Result};
use solana_sdk::signature::Keypair;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("deploy");

    if command == "init-config" {
        let path = args.get(1).map(String::as_str).unwrap_or("amm-config.toml");
        return Config::write_default(path);
    }

    let config_path = Config::path();
    let mut config = Config::load_or_default(&config_path)?;

    log::info!("Connecting to node: {}", config.node_url);
    let client = AlgodClient::new(&config.node_url, &config.api_token)?;

    let account = wallet::load_keypair(&config.keypair_path)?;
    log::info!("Signing account: {}", Address::of(&account));

    let orchestrator = Orchestrator::new(&client)
        .with_timeout_rounds(config.confirmation_timeout_rounds)
        .with_funding(config.funding());

    match command {
        "deploy" => {
            let app_id = create(&orchestrator, &config, &account)?;
            config.app_id = Some(app_id);
            config.pool_token = None;
            record(&config, &config_path)?;

            let pool_token =
                orchestrator.setup_app(app_id, config.token_a, config.token_b, &account)?;
            config.pool_token = Some(pool_token);
            record(&config, &config_path)?;

            orchestrator.opt_in_to_pool_token(&account, pool_token)?;
            println!("app_id = {app_id}");
            println!("pool_token = {pool_token}");
        }
        "create" => {
            let app_id = create(&orchestrator, &config, &account)?;
            config.app_id = Some(app_id);
            config.pool_token = None;
            record(&config, &config_path)?;
            println!("app_id = {app_id}");
        }
        "setup" => {
            let app_id = require_app_id(&config)?;
            let pool_token =
                orchestrator.setup_app(app_id, config.token_a, config.token_b, &account)?;
            config.pool_token = Some(pool_token);
            record(&config, &config_path)?;
            println!("pool_token = {pool_token}");
        }
        "opt-in" => {
            let pool_token = require_pool_token(&orchestrator, &config)?;
            orchestrator.opt_in_to_pool_token(&account, pool_token)?;
        }
        "supply" => {
            let app_id = require_app_id(&config)?;
            let amount_a = parse_amount(args.get(1), "amount_a")?;
            let amount_b = parse_amount(args.get(2), "amount_b")?;
            let confirmed = orchestrator.supply_to_pool(app_id, amount_a, amount_b, &account)?;
            log::info!(
                "Supply confirmed in round {}",
                confirmed.confirmed_round.unwrap_or_default()
            );
        }
        other => bail!("Unknown command: {}", other),
    }

    Ok(())
}

fn create(
    orchestrator: &Orchestrator<'_, AlgodClient>,
    config: &Config,
    account: &Keypair,
) -> Result<AppId> {
    let sources = config.read_programs()?;
    let programs = ContractPrograms::compile(
        orchestrator.client(),
        &sources.approval,
        &sources.clear,
        config.program_version,
    )?;

    Ok(orchestrator.create_app(&programs, &config.amm_params(), account)?)
}

/// Persist ids so later commands pick them up
fn record(config: &Config, path: &str) -> Result<()> {
    config.save(path)?;
    log::info!("Saved application ids to {}", path);
    Ok(())
}

fn require_app_id(config: &Config) -> Result<AppId> {
    config
        .app_id
        .context("app_id is not set in the config; run create first")
}

fn require_pool_token(
    orchestrator: &Orchestrator<'_, AlgodClient>,
    config: &Config,
) -> Result<AssetId> {
    if let Some(pool_token) = config.pool_token {
        return Ok(pool_token);
    }
    let app_id = require_app_id(config)?;
    Ok(orchestrator.pool_state(app_id)?.pool_token)
}

fn parse_amount(arg: Option<&String>, name: &str) -> Result<u64> {
    let raw = arg.context(format!("Missing argument <{}>", name))?;
    raw.parse().context(format!("Invalid {}: {}", name, raw))
}
