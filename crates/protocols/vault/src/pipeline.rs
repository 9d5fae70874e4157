//! Deposit/Withdraw Transaction Pipeline
//!
//! Turns a user action and a raw amount string into a transaction accepted by
//! the network:
//!
//! ```text
//! Idle -> Validating -> Building -> Simulating -> AwaitingSignature -> Submitting -> Succeeded
//!            \______________\____________\_______________\__________________\-> Failed(stage, reason)
//! ```
//!
//! Every stage consumes the previous stage's output. Nothing is retried: a
//! failure ends the run, and a retry is a new run from `Idle`. "Submitted"
//! is the success boundary; confirmation is not polled.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use soroban_rpc_client::ChainRpc;
use soroban_tx::{
    account_key, assemble, build_amount_call, contract_address, to_stroops, InvokeContractTx,
};
use xhedge_core::{Address, ContractId, Stroops, TxBlob, TxError, TxHash, WalletSigner};

use crate::state::VaultAction;

/// Seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Non-terminal pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Building,
    Simulating,
    AwaitingSignature,
    Submitting,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Simulating => "simulating",
            Self::AwaitingSignature => "awaiting_signature",
            Self::Submitting => "submitting",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Observable pipeline state
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Validating,
    Building,
    Simulating,
    AwaitingSignature,
    Submitting,
    Succeeded { hash: TxHash },
    Failed { stage: Stage, reason: String },
}

impl From<Stage> for PipelineState {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Validating => Self::Validating,
            Stage::Building => Self::Building,
            Stage::Simulating => Self::Simulating,
            Stage::AwaitingSignature => Self::AwaitingSignature,
            Stage::Submitting => Self::Submitting,
        }
    }
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded { .. } | Self::Failed { .. })
    }
}

/// Terminal failure, tagged with the stage that produced it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub error: TxError,
}

impl PipelineFailure {
    fn at(stage: Stage) -> impl FnOnce(TxError) -> Self {
        move |error| Self { stage, error }
    }

    /// Reason shown to the user, unchanged from the failing stage
    pub fn reason(&self) -> String {
        self.error.reason()
    }
}

/// Accepted submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSuccess {
    pub hash: TxHash,
    pub action: VaultAction,
    pub amount: Stroops,
    /// Total fee of the submitted envelope, resource fee included
    pub fee: u32,
}

type Observer = Box<dyn Fn(&PipelineState) + Send + Sync>;
type Clock = Box<dyn Fn() -> u64 + Send + Sync>;
type SuccessHook = Box<dyn Fn(&PipelineSuccess) + Send + Sync>;

/// One deposit/withdraw run against a chain and a wallet.
///
/// Holds no state between runs; callers keep at most one run in flight per
/// user surface.
pub struct Pipeline<'a, R, W> {
    rpc: &'a R,
    wallet: &'a W,
    contract_id: ContractId,
    observer: Option<Observer>,
    clock: Clock,
    on_success: Option<SuccessHook>,
}

impl<'a, R: ChainRpc, W: WalletSigner> Pipeline<'a, R, W> {
    pub fn new(rpc: &'a R, wallet: &'a W, contract_id: ContractId) -> Self {
        Self {
            rpc,
            wallet,
            contract_id,
            observer: None,
            clock: Box::new(unix_now),
            on_success: None,
        }
    }

    /// Report every state transition to `observer`
    pub fn with_observer(mut self, observer: impl Fn(&PipelineState) + Send + Sync + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> u64 + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Called once after an accepted submission. Must not block; long work
    /// such as a metrics refresh belongs on a spawned task.
    pub fn on_success(mut self, hook: impl Fn(&PipelineSuccess) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(hook));
        self
    }

    fn emit(&self, state: PipelineState) {
        if let Some(observer) = &self.observer {
            observer(&state);
        }
    }

    fn enter(&self, stage: Stage) {
        tracing::debug!(stage = %stage, "Pipeline stage");
        self.emit(stage.into());
    }

    /// Run `action` for `amount` (a decimal string) on behalf of `user`,
    /// the connected wallet's address if any.
    pub async fn run(
        &self,
        user: Option<&Address>,
        action: VaultAction,
        amount: &str,
    ) -> Result<PipelineSuccess, PipelineFailure> {
        let outcome = self.execute(user, action, amount).await;

        match &outcome {
            Ok(success) => {
                tracing::info!(
                    action = %action,
                    amount = success.amount,
                    fee = success.fee,
                    hash = %success.hash,
                    "Vault transaction submitted"
                );
                self.emit(PipelineState::Succeeded {
                    hash: success.hash.clone(),
                });
                if let Some(hook) = &self.on_success {
                    hook(success);
                }
            }
            Err(failure) => {
                tracing::warn!(
                    action = %action,
                    stage = %failure.stage,
                    code = failure.error.error_code(),
                    "Vault transaction failed: {}",
                    failure.reason()
                );
                self.emit(PipelineState::Failed {
                    stage: failure.stage,
                    reason: failure.reason(),
                });
            }
        }

        outcome
    }

    async fn execute(
        &self,
        user: Option<&Address>,
        action: VaultAction,
        amount: &str,
    ) -> Result<PipelineSuccess, PipelineFailure> {
        self.enter(Stage::Validating);
        let (user, stroops) = self
            .validate(user, amount)
            .map_err(PipelineFailure::at(Stage::Validating))?;

        self.enter(Stage::Building);
        let (unsigned, unsigned_blob) = self
            .build(user, action, stroops)
            .await
            .map_err(PipelineFailure::at(Stage::Building))?;

        self.enter(Stage::Simulating);
        let (assembled, assembled_blob) = self
            .simulate(&unsigned, &unsigned_blob)
            .await
            .map_err(PipelineFailure::at(Stage::Simulating))?;

        self.enter(Stage::AwaitingSignature);
        let signed = self
            .sign(&assembled_blob)
            .await
            .map_err(PipelineFailure::at(Stage::AwaitingSignature))?;

        self.enter(Stage::Submitting);
        let hash = self
            .submit(&assembled, &signed)
            .await
            .map_err(PipelineFailure::at(Stage::Submitting))?;

        Ok(PipelineSuccess {
            hash,
            action,
            amount: stroops,
            fee: assembled.fee,
        })
    }

    /// Amount and wallet checks; no network access
    fn validate<'u>(
        &self,
        user: Option<&'u Address>,
        amount: &str,
    ) -> Result<(&'u Address, Stroops), TxError> {
        let stroops = to_stroops(amount)?;
        if stroops <= 0 {
            return Err(TxError::InvalidAmount {
                message: "Amount must be greater than zero".to_string(),
            });
        }

        let user = user.ok_or(TxError::WalletNotConnected)?;
        account_key(user)?;
        contract_address(&self.contract_id)?;

        Ok((user, stroops))
    }

    async fn build(
        &self,
        user: &Address,
        action: VaultAction,
        stroops: Stroops,
    ) -> Result<(InvokeContractTx, TxBlob), TxError> {
        let account = self
            .rpc
            .load_account(user)
            .await
            .map_err(TxError::from_rpc)?;

        let built = build_amount_call(
            &self.contract_id,
            action.function(),
            user,
            stroops,
            account.sequence,
            (self.clock)(),
        )?;
        tracing::debug!(
            contract = %built.summary.contract_id,
            function = %built.summary.function,
            source = %built.summary.source,
            sequence = built.unsigned_tx.sequence,
            valid_until = built.summary.valid_until,
            "Built vault invocation"
        );

        let blob = built.unsigned_tx.to_blob().map_err(|e| TxError::InvalidAmount {
            message: format!("Transaction encoding failed: {}", e),
        })?;
        Ok((built.unsigned_tx, blob))
    }

    async fn simulate(
        &self,
        unsigned: &InvokeContractTx,
        unsigned_blob: &TxBlob,
    ) -> Result<(InvokeContractTx, TxBlob), TxError> {
        let sim = self
            .rpc
            .simulate(unsigned_blob)
            .await
            .map_err(TxError::from_rpc)?;
        let assembled = assemble(unsigned, &sim)?;

        let blob = assembled.to_blob().map_err(|e| TxError::SimulationFailed {
            message: format!("Transaction encoding failed: {}", e),
        })?;
        if let Ok(hash) = assembled.hash(self.rpc.network().passphrase()) {
            tracing::debug!(fee = assembled.fee, hash = %hex::encode(hash), "Assembled transaction");
        }
        Ok((assembled, blob))
    }

    async fn sign(&self, assembled_blob: &TxBlob) -> Result<TxBlob, TxError> {
        let signed = self
            .wallet
            .sign(assembled_blob, self.rpc.network().passphrase())
            .await?;
        if signed.is_empty() {
            return Err(TxError::SigningDeclined {
                message: "Wallet returned an empty transaction".to_string(),
            });
        }
        Ok(signed)
    }

    async fn submit(&self, assembled: &InvokeContractTx, signed: &TxBlob) -> Result<TxHash, TxError> {
        if assembled.is_expired((self.clock)()) {
            return Err(TxError::SubmissionRejected {
                reason: "Transaction validity window elapsed before submission".to_string(),
            });
        }

        let result = self.rpc.submit(signed).await.map_err(TxError::from_rpc)?;
        if !result.is_accepted() {
            // The hash of a rejected envelope is not reported
            return Err(TxError::SubmissionRejected {
                reason: result.rejection_reason(),
            });
        }
        Ok(result.hash)
    }
}
