//! AMM application lifecycle
//!
//! Builders produce unsigned transactions and groups; [`Orchestrator`] signs,
//! submits and confirms them against a caller-held node client.

use crate::compiler::ContractPrograms;
use crate::confirm::{wait_for_transaction, DEFAULT_TIMEOUT_ROUNDS};
use crate::error::{Error, Result};
use crate::global_state::{GlobalState, PoolState};
use crate::node::{NodeClient, PendingTransactionInfo};
use crate::types::{
    app_address, Address, AppId, ApplicationCall, AssetId, AtomicGroup, OnComplete, StateSchema,
    SuggestedParams, Transaction,
};
use solana_sdk::signature::Keypair;

/// Base minimum balance of any account
pub const MIN_ACCOUNT_BALANCE: u64 = 100_000;

/// Extra minimum balance per asset an account holds
pub const ASSET_MIN_BALANCE: u64 = 100_000;

/// Fee budget per inner asset operation the setup call performs
pub const ASSET_SETUP_FEE: u64 = 1_000;

/// Paid to the escrow on supply to cover returning the pool token
pub const SUPPLY_FEE: u64 = 2_000;

pub const SETUP_ARG: &[u8] = b"setup";
pub const SUPPLY_ARG: &[u8] = b"supply";

/// Global schema: token ids, pool token, fee, increment and reserves
pub const GLOBAL_SCHEMA: StateSchema = StateSchema {
    num_uints: 7,
    num_byte_slices: 1,
};
pub const LOCAL_SCHEMA: StateSchema = StateSchema {
    num_uints: 0,
    num_byte_slices: 0,
};

/// Creation parameters passed to the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmmParams {
    pub token_a: AssetId,
    pub token_b: AssetId,
    pub fee_bps: u64,
    pub min_increment: u64,
}

/// Assets referenced by a supply call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolAssets {
    pub token_a: AssetId,
    pub token_b: AssetId,
    pub pool_token: AssetId,
}

impl From<PoolState> for PoolAssets {
    fn from(state: PoolState) -> Self {
        Self {
            token_a: state.token_a,
            token_b: state.token_b,
            pool_token: state.pool_token,
        }
    }
}

/// How much the escrow is funded with during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundingPolicy {
    /// Assets the escrow ends up holding (token A, token B, pool token)
    pub asset_count: u64,
}

impl Default for FundingPolicy {
    fn default() -> Self {
        Self { asset_count: 3 }
    }
}

impl FundingPolicy {
    pub fn new(asset_count: u64) -> Self {
        Self { asset_count }
    }

    /// Minimum balance the escrow must hold once opted into every asset
    pub fn min_balance(&self) -> u64 {
        MIN_ACCOUNT_BALANCE + ASSET_MIN_BALANCE * self.asset_count
    }

    /// Payment made to the escrow in the setup group
    pub fn amount(&self) -> u64 {
        self.min_balance() + ASSET_SETUP_FEE * self.asset_count
    }
}

/// Creation arguments in the contract's wire format
pub fn create_args(creator: &Address, params: &AmmParams) -> Vec<Vec<u8>> {
    vec![
        creator.as_bytes().to_vec(),
        params.token_a.to_be_bytes().to_vec(),
        params.token_b.to_be_bytes().to_vec(),
        params.fee_bps.to_be_bytes().to_vec(),
        params.min_increment.to_be_bytes().to_vec(),
    ]
}

/// Application creation transaction
pub fn build_create_txn(
    creator: &Address,
    programs: &ContractPrograms,
    params: &AmmParams,
    suggested: &SuggestedParams,
) -> Transaction {
    let call = ApplicationCall {
        app_id: 0,
        on_complete: OnComplete::NoOp,
        app_args: create_args(creator, params),
        approval_program: programs.approval.clone(),
        clear_program: programs.clear.clone(),
        global_schema: GLOBAL_SCHEMA,
        local_schema: LOCAL_SCHEMA,
        ..Default::default()
    };

    Transaction::application_call(*creator, call, suggested)
}

/// Funding payment followed by the setup call
pub fn build_setup_group(
    funder: &Address,
    app_id: AppId,
    token_a: AssetId,
    token_b: AssetId,
    funding: &FundingPolicy,
    suggested: &SuggestedParams,
) -> Result<AtomicGroup> {
    let fund = Transaction::payment(*funder, app_address(app_id), funding.amount(), suggested);

    let setup = Transaction::application_call(
        *funder,
        ApplicationCall {
            app_id,
            on_complete: OnComplete::NoOp,
            app_args: vec![SETUP_ARG.to_vec()],
            foreign_assets: vec![token_a, token_b],
            ..Default::default()
        },
        suggested,
    );

    AtomicGroup::new(vec![fund, setup])
}

pub fn build_opt_in_txn(
    account: &Address,
    pool_token: AssetId,
    suggested: &SuggestedParams,
) -> Transaction {
    Transaction::asset_opt_in(*account, pool_token, suggested)
}

/// Fee payment, token A, token B, then the supply call
pub fn build_supply_group(
    supplier: &Address,
    app_id: AppId,
    amount_a: u64,
    amount_b: u64,
    assets: &PoolAssets,
    suggested: &SuggestedParams,
) -> Result<AtomicGroup> {
    let escrow = app_address(app_id);

    let fee = Transaction::payment(*supplier, escrow, SUPPLY_FEE, suggested);
    let token_a =
        Transaction::asset_transfer(*supplier, escrow, assets.token_a, amount_a, suggested);
    let token_b =
        Transaction::asset_transfer(*supplier, escrow, assets.token_b, amount_b, suggested);
    let call = Transaction::application_call(
        *supplier,
        ApplicationCall {
            app_id,
            on_complete: OnComplete::NoOp,
            app_args: vec![SUPPLY_ARG.to_vec()],
            foreign_assets: vec![assets.token_a, assets.token_b, assets.pool_token],
            ..Default::default()
        },
        suggested,
    );

    AtomicGroup::new(vec![fee, token_a, token_b, call])
}

/// Drives the AMM application through a borrowed node client
pub struct Orchestrator<'c, C: NodeClient + ?Sized> {
    client: &'c C,
    timeout_rounds: u64,
    funding: FundingPolicy,
}

impl<'c, C: NodeClient + ?Sized> Orchestrator<'c, C> {
    pub fn new(client: &'c C) -> Self {
        Self {
            client,
            timeout_rounds: DEFAULT_TIMEOUT_ROUNDS,
            funding: FundingPolicy::default(),
        }
    }

    pub fn with_timeout_rounds(mut self, timeout_rounds: u64) -> Self {
        self.timeout_rounds = timeout_rounds;
        self
    }

    pub fn with_funding(mut self, funding: FundingPolicy) -> Self {
        self.funding = funding;
        self
    }

    pub fn client(&self) -> &C {
        self.client
    }

    /// Create the application and return its id
    pub fn create_app(
        &self,
        programs: &ContractPrograms,
        params: &AmmParams,
        creator: &Keypair,
    ) -> Result<AppId> {
        let suggested = self.client.suggested_params()?;
        let txn = build_create_txn(&Address::of(creator), programs, params, &suggested);
        let signed = txn.sign(creator)?;

        self.client.send_transaction(&signed)?;
        log::info!("Submitted application create {}", signed.txid());

        let confirmed = wait_for_transaction(self.client, &signed.txid(), self.timeout_rounds)?;
        let app_id = confirmed
            .application_index
            .filter(|id| *id > 0)
            .ok_or(Error::MissingApplicationIndex(signed.txid()))?;

        log::info!("Created AMM application {}", app_id);
        Ok(app_id)
    }

    /// Fund the escrow and run the setup call; returns the pool token id
    pub fn setup_app(
        &self,
        app_id: AppId,
        token_a: AssetId,
        token_b: AssetId,
        funder: &Keypair,
    ) -> Result<AssetId> {
        let suggested = self.client.suggested_params()?;
        let group = build_setup_group(
            &Address::of(funder),
            app_id,
            token_a,
            token_b,
            &self.funding,
            &suggested,
        )?;
        let signed = group.sign(funder)?;

        self.client.send_transactions(&signed)?;
        log::info!(
            "Submitted setup group {} for application {} (funding {})",
            group.id(),
            app_id,
            self.funding.amount()
        );

        wait_for_transaction(self.client, &signed[0].txid(), self.timeout_rounds)?;

        let state = GlobalState::fetch(self.client, app_id)?;
        let pool_token = state.pool_token().ok_or(Error::PoolTokenNotFound(app_id))?;

        log::info!("Application {} pool token is {}", app_id, pool_token);
        Ok(pool_token)
    }

    /// Let `account` hold the pool token
    pub fn opt_in_to_pool_token(&self, account: &Keypair, pool_token: AssetId) -> Result<()> {
        let suggested = self.client.suggested_params()?;
        let signed = build_opt_in_txn(&Address::of(account), pool_token, &suggested).sign(account)?;

        self.client.send_transaction(&signed)?;
        log::info!(
            "Submitted opt-in of {} to pool token {}",
            Address::of(account),
            pool_token
        );

        wait_for_transaction(self.client, &signed.txid(), self.timeout_rounds)?;
        Ok(())
    }

    /// Supply `amount_a` of token A and `amount_b` of token B.
    ///
    /// Minting and refunds of the excess side are decided by the contract.
    pub fn supply(
        &self,
        app_id: AppId,
        amount_a: u64,
        amount_b: u64,
        assets: &PoolAssets,
        supplier: &Keypair,
    ) -> Result<PendingTransactionInfo> {
        let suggested = self.client.suggested_params()?;
        let group = build_supply_group(
            &Address::of(supplier),
            app_id,
            amount_a,
            amount_b,
            assets,
            &suggested,
        )?;
        let signed = group.sign(supplier)?;

        self.client.send_transactions(&signed)?;
        log::info!(
            "Submitted supply group {} to application {}: {} A, {} B",
            group.id(),
            app_id,
            amount_a,
            amount_b
        );

        let app_call = &signed[signed.len() - 1];
        wait_for_transaction(self.client, &app_call.txid(), self.timeout_rounds)
    }

    /// Asset ids recorded in the application's global state
    pub fn pool_state(&self, app_id: AppId) -> Result<PoolState> {
        let state = GlobalState::fetch(self.client, app_id)?;
        PoolState::from_global(app_id, &state)
    }

    /// Supply using the asset ids read from global state
    pub fn supply_to_pool(
        &self,
        app_id: AppId,
        amount_a: u64,
        amount_b: u64,
        supplier: &Keypair,
    ) -> Result<PendingTransactionInfo> {
        let assets = PoolAssets::from(self.pool_state(app_id)?);
        self.supply(app_id, amount_a, amount_b, &assets, supplier)
    }
}
