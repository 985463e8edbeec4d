//! Generate a new signing account
//!
//! Prints the address and base58 secret. With a path argument the keypair is
//! also written there as a JSON byte array.

use amm_orchestrator::{wallet, Address};
use anyhow::Result;
use solana_sdk::signature::Keypair;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let keypair = Keypair::new();

    println!("Address: {}", Address::of(&keypair));
    println!("Private key: {}", keypair.to_base58_string());

    if let Some(path) = std::env::args().nth(1) {
        wallet::write_keypair_json(&keypair, &path)?;
        log::info!("Wrote keypair to {}", path);
    }

    Ok(())
}
