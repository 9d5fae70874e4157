//! In-process fakes of the chain and wallet capabilities

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use soroban_rpc_client::horizon::HostParameter;
use soroban_rpc_client::{AccountState, ChainRpc, SubmitResult};
use soroban_tx::{
    encode_sc_val_base64, i128_val, HostFunctionResult, InvokeContractTx, ScVal, SimulationResult,
};
use stellar_xdr::curr::{Limits, ReadXdr, SorobanTransactionData, WriteXdr};
use xhedge_core::{
    Address, ContractId, Network, RpcError, TxBlob, TxHash, WalletError, WalletProbe, WalletSigner,
};

pub const USER: &str = "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX";

pub const RESOURCE_FEE: u32 = 51_234;

pub fn contract() -> ContractId {
    ContractId::new(xhedge_core::constants::DEFAULT_CONTRACT_ID)
}

pub fn param(val: &ScVal, kind: &str) -> HostParameter {
    HostParameter {
        value: encode_sc_val_base64(val).unwrap(),
        kind: kind.into(),
    }
}

/// The parts of an invocation envelope the tests look at
#[derive(Debug)]
pub struct DecodedCall {
    pub fee: u32,
    pub sequence: i64,
    pub max_time: u64,
    pub function: String,
    pub args: Vec<ScVal>,
}

pub fn decode_call(blob: &TxBlob) -> DecodedCall {
    let tx = InvokeContractTx::from_blob(blob).unwrap();
    DecodedCall {
        fee: tx.fee,
        sequence: tx.sequence,
        max_time: tx.max_time(),
        function: tx.function(),
        args: tx.args().to_vec(),
    }
}

/// Base64 `SorobanTransactionData` with an empty footprint
pub fn transaction_data(resource_fee: u32) -> String {
    let raw = [[0u8; 24].as_slice(), &(resource_fee as i64).to_be_bytes()].concat();
    SorobanTransactionData::from_xdr(raw, Limits::none())
        .unwrap()
        .to_xdr_base64(Limits::none())
        .unwrap()
}

#[derive(Debug, Clone, Copy)]
pub enum Outage {
    NotFound,
    Down,
    /// JSON-RPC error object from the node
    Rejected,
}

impl Outage {
    /// `target` is the account for lookups and the method name for RPC calls
    fn error(self, target: &str) -> RpcError {
        match self {
            Self::NotFound => RpcError::AccountNotFound {
                address: target.to_string(),
            },
            Self::Rejected => RpcError::Rejected {
                method: target.to_string(),
                code: -32602,
                message: "invalid transaction envelope".into(),
            },
            Self::Down => RpcError::Unreachable {
                url: "http://rpc.invalid".into(),
                message: "connection refused".into(),
            },
        }
    }
}

/// Scripted chain: every call is recorded
pub struct FakeChain {
    pub sequence: i64,
    reads: HashMap<String, i128>,
    load_outage: Option<Outage>,
    simulation_error: Option<String>,
    simulate_outage: Option<Outage>,
    submit_status: String,
    submit_outage: Option<Outage>,
    pub loads: AtomicUsize,
    pub simulated: Mutex<Vec<TxBlob>>,
    pub submitted: Mutex<Vec<TxBlob>>,
}

impl Default for FakeChain {
    fn default() -> Self {
        Self {
            sequence: 100,
            reads: HashMap::new(),
            load_outage: None,
            simulation_error: None,
            simulate_outage: None,
            submit_status: "PENDING".into(),
            submit_outage: None,
            loads: AtomicUsize::new(0),
            simulated: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }
}

impl FakeChain {
    pub fn with_read(mut self, function: &str, value: i128) -> Self {
        self.reads.insert(function.to_string(), value);
        self
    }

    pub fn with_simulation_error(mut self, error: &str) -> Self {
        self.simulation_error = Some(error.to_string());
        self
    }

    pub fn with_load_outage(mut self, outage: Outage) -> Self {
        self.load_outage = Some(outage);
        self
    }

    pub fn with_simulate_outage(mut self, outage: Outage) -> Self {
        self.simulate_outage = Some(outage);
        self
    }

    pub fn with_submit_status(mut self, status: &str) -> Self {
        self.submit_status = status.to_string();
        self
    }

    pub fn with_submit_outage(mut self, outage: Outage) -> Self {
        self.submit_outage = Some(outage);
        self
    }

    pub fn simulated_functions(&self) -> Vec<String> {
        self.simulated
            .lock()
            .unwrap()
            .iter()
            .map(|blob| decode_call(blob).function)
            .collect()
    }

    pub fn submit_count(&self) -> usize {
        self.submitted.lock().unwrap().len()
    }
}

impl ChainRpc for FakeChain {
    fn network(&self) -> Network {
        Network::Testnet
    }

    async fn load_account(&self, address: &Address) -> Result<AccountState, RpcError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if let Some(outage) = self.load_outage {
            return Err(outage.error(address.as_str()));
        }
        Ok(AccountState {
            account_id: address.clone(),
            sequence: self.sequence,
        })
    }

    async fn simulate(&self, unsigned: &TxBlob) -> Result<SimulationResult, RpcError> {
        self.simulated.lock().unwrap().push(unsigned.clone());
        if let Some(outage) = self.simulate_outage {
            return Err(outage.error("simulateTransaction"));
        }

        let function = decode_call(unsigned).function;
        let value = match self.reads.get(&function) {
            Some(v) => i128_val(*v),
            None => ScVal::Void,
        };

        Ok(SimulationResult {
            error: self.simulation_error.clone(),
            transaction_data: Some(transaction_data(RESOURCE_FEE)),
            min_resource_fee: Some(RESOURCE_FEE.to_string()),
            results: vec![HostFunctionResult {
                auth: vec![],
                xdr: encode_sc_val_base64(&value).unwrap(),
            }],
            restore_preamble: None,
            latest_ledger: Some(1_000),
        })
    }

    async fn submit(&self, signed: &TxBlob) -> Result<SubmitResult, RpcError> {
        self.submitted.lock().unwrap().push(signed.clone());
        if let Some(outage) = self.submit_outage {
            return Err(outage.error("sendTransaction"));
        }
        Ok(SubmitResult {
            status: self.submit_status.clone(),
            hash: TxHash::new("abc123"),
            error_result_xdr: None,
        })
    }
}

/// Scripted wallet: signs by prefixing the envelope, or declines
#[derive(Default)]
pub struct FakeWallet {
    pub decline: Option<String>,
    pub sign_requests: Mutex<Vec<(TxBlob, String)>>,
}

impl FakeWallet {
    pub fn declining(reason: &str) -> Self {
        Self {
            decline: Some(reason.to_string()),
            ..Default::default()
        }
    }

    pub fn sign_count(&self) -> usize {
        self.sign_requests.lock().unwrap().len()
    }
}

impl WalletSigner for FakeWallet {
    async fn probe(&self) -> Result<WalletProbe, WalletError> {
        Ok(WalletProbe {
            extension_present: true,
            previously_authorized: true,
        })
    }

    async fn request_access(&self) -> Result<Address, WalletError> {
        Ok(Address::new(USER))
    }

    async fn public_key(&self) -> Result<Address, WalletError> {
        Ok(Address::new(USER))
    }

    async fn sign(&self, unsigned: &TxBlob, passphrase: &str) -> Result<TxBlob, WalletError> {
        self.sign_requests
            .lock()
            .unwrap()
            .push((unsigned.clone(), passphrase.to_string()));
        match &self.decline {
            Some(reason) => Err(WalletError::Declined {
                reason: reason.clone(),
            }),
            None => Ok(TxBlob::new(format!("signed:{}", unsigned))),
        }
    }
}
