//! Contract invocation transaction envelope
//!
//! One `invokeHostFunction(invokeContract)` operation, time-bound
//! preconditions and no memo. Serializes to a `TransactionEnvelope` with an
//! empty signature list, which is what wallets expect to be handed for signing.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    Hash, HostFunction, InvokeContractArgs, InvokeHostFunctionOp, Limits, Memo, MuxedAccount,
    Operation, OperationBody, Preconditions, ReadXdr, ScVal, SequenceNumber,
    SorobanAuthorizationEntry, SorobanTransactionData, TimeBounds, TimePoint, Transaction,
    TransactionEnvelope, TransactionExt, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, TransactionV1Envelope, VecM, WriteXdr,
};
use xhedge_core::TxBlob;

use crate::scval::XdrError;

/// Unsigned contract invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeContractTx {
    pub source: MuxedAccount,
    pub fee: u32,
    pub sequence: i64,
    pub time_bounds: TimeBounds,
    pub invocation: InvokeContractArgs,
    /// Authorization entries from simulation
    pub auth: Vec<SorobanAuthorizationEntry>,
    /// Footprint and resources from simulation
    pub soroban_data: Option<SorobanTransactionData>,
}

impl InvokeContractTx {
    pub fn new(
        source: MuxedAccount,
        fee: u32,
        sequence: i64,
        valid_until: u64,
        invocation: InvokeContractArgs,
    ) -> Self {
        Self {
            source,
            fee,
            sequence,
            time_bounds: TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(valid_until),
            },
            invocation,
            auth: Vec::new(),
            soroban_data: None,
        }
    }

    /// Name of the invoked contract function
    pub fn function(&self) -> String {
        self.invocation.function_name.0.to_utf8_string_lossy()
    }

    pub fn args(&self) -> &[ScVal] {
        &self.invocation.args
    }

    pub fn max_time(&self) -> u64 {
        self.time_bounds.max_time.0
    }

    pub fn transaction(&self) -> Result<Transaction, XdrError> {
        let operation = Operation {
            source_account: None,
            body: OperationBody::InvokeHostFunction(InvokeHostFunctionOp {
                host_function: HostFunction::InvokeContract(self.invocation.clone()),
                auth: self.auth.clone().try_into()?,
            }),
        };

        Ok(Transaction {
            source_account: self.source.clone(),
            fee: self.fee,
            seq_num: SequenceNumber(self.sequence),
            cond: Preconditions::Time(self.time_bounds.clone()),
            memo: Memo::None,
            operations: vec![operation].try_into()?,
            ext: match &self.soroban_data {
                Some(data) => TransactionExt::V1(data.clone()),
                None => TransactionExt::V0,
            },
        })
    }

    pub fn envelope(&self) -> Result<TransactionEnvelope, XdrError> {
        Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
            tx: self.transaction()?,
            signatures: VecM::default(),
        }))
    }

    /// Base64 envelope, the form wallets and RPC servers exchange
    pub fn to_blob(&self) -> Result<TxBlob, XdrError> {
        Ok(TxBlob::new(self.envelope()?.to_xdr_base64(Limits::none())?))
    }

    /// Parse an envelope holding a single contract invocation
    pub fn from_blob(blob: &TxBlob) -> Result<Self, XdrError> {
        match TransactionEnvelope::from_xdr_base64(blob.as_str(), Limits::none())? {
            TransactionEnvelope::Tx(envelope) => Self::try_from(envelope.tx),
            _ => Err(XdrError::Invalid),
        }
    }

    /// Transaction hash as signed by the wallet: sha256 of the
    /// `TransactionSignaturePayload` for the network
    pub fn hash(&self, passphrase: &str) -> Result<[u8; 32], XdrError> {
        let payload = TransactionSignaturePayload {
            network_id: Hash(network_id(passphrase)),
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(
                self.transaction()?,
            ),
        };
        Ok(Sha256::digest(payload.to_xdr(Limits::none())?).into())
    }

    /// True once `now` has passed the upper time bound
    pub fn is_expired(&self, now: u64) -> bool {
        let max_time = self.max_time();
        max_time != 0 && now > max_time
    }
}

impl TryFrom<Transaction> for InvokeContractTx {
    type Error = XdrError;

    fn try_from(tx: Transaction) -> Result<Self, Self::Error> {
        let [operation] = tx.operations.as_slice() else {
            return Err(XdrError::Invalid);
        };
        let OperationBody::InvokeHostFunction(invoke) = &operation.body else {
            return Err(XdrError::Invalid);
        };
        let HostFunction::InvokeContract(invocation) = &invoke.host_function else {
            return Err(XdrError::Invalid);
        };
        let time_bounds = match &tx.cond {
            Preconditions::Time(bounds) => bounds.clone(),
            Preconditions::None => TimeBounds {
                min_time: TimePoint(0),
                max_time: TimePoint(0),
            },
            Preconditions::V2(_) => return Err(XdrError::Invalid),
        };

        Ok(Self {
            source: tx.source_account,
            fee: tx.fee,
            sequence: tx.seq_num.0,
            time_bounds,
            invocation: invocation.clone(),
            auth: invoke.auth.to_vec(),
            soroban_data: match tx.ext {
                TransactionExt::V1(data) => Some(data),
                TransactionExt::V0 => None,
            },
        })
    }
}

/// Network id: sha256 of the network passphrase
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}
