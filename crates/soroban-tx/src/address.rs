//! Stellar address utilities
//!
//! Strkey parsing goes through `stellar-strkey`; the results are the typed
//! XDR addresses contract calls carry.

use stellar_strkey::{ed25519, Contract};
use stellar_xdr::curr::{AccountId, Hash, MuxedAccount, PublicKey, ScAddress, Uint256};
use xhedge_core::{Address, ContractId, TxError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid account address")]
    InvalidAccount(String),

    #[error("Invalid contract id")]
    InvalidContract(String),
}

impl AddressError {
    pub fn address(&self) -> &str {
        match self {
            Self::InvalidAccount(a) | Self::InvalidContract(a) => a,
        }
    }
}

impl From<AddressError> for TxError {
    fn from(e: AddressError) -> Self {
        TxError::InvalidAddress {
            address: e.address().to_string(),
            reason: e.to_string(),
        }
    }
}

/// Ed25519 key of a `G...` account
pub fn account_key(address: &Address) -> Result<[u8; 32], AddressError> {
    ed25519::PublicKey::from_string(address.as_str())
        .map(|key| key.0)
        .map_err(|_| AddressError::InvalidAccount(address.to_string()))
}

/// Hash of a `C...` contract
pub fn contract_hash(contract_id: &ContractId) -> Result<[u8; 32], AddressError> {
    Contract::from_string(contract_id.as_str())
        .map(|contract| contract.0)
        .map_err(|_| AddressError::InvalidContract(contract_id.to_string()))
}

/// Account as a transaction source
pub fn muxed_account(address: &Address) -> Result<MuxedAccount, AddressError> {
    Ok(MuxedAccount::Ed25519(Uint256(account_key(address)?)))
}

/// Account as a contract call argument
pub fn account_address(address: &Address) -> Result<ScAddress, AddressError> {
    Ok(ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(
        Uint256(account_key(address)?),
    ))))
}

pub fn contract_address(contract_id: &ContractId) -> Result<ScAddress, AddressError> {
    Ok(ScAddress::Contract(Hash(contract_hash(contract_id)?)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use xhedge_core::constants::DEFAULT_CONTRACT_ID;

    const ZERO_ACCOUNT: &str = "GAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAWHF";

    #[test]
    fn test_default_contract_hash() {
        let hash = contract_hash(&ContractId::new(DEFAULT_CONTRACT_ID)).unwrap();
        assert_eq!(
            hex::encode(hash),
            "d7928b72c2703ccfeaf7eb9ff4ef4d504a55a8b979fc9b450ea2c842b4d1ce61"
        );
    }

    #[test]
    fn test_account_key() {
        assert_eq!(account_key(&Address::new(ZERO_ACCOUNT)).unwrap(), [0u8; 32]);

        let mut seq = [0u8; 32];
        for (i, b) in seq.iter_mut().enumerate() {
            *b = i as u8;
        }
        let user = Address::new(ed25519::PublicKey(seq).to_string());
        assert_eq!(
            user.as_str(),
            "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX"
        );
        assert_eq!(
            account_address(&user).unwrap(),
            ScAddress::Account(AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(seq))))
        );
    }

    #[test]
    fn test_rejects_malformed() {
        // contract id where an account is expected, and the reverse
        assert_eq!(
            account_key(&Address::new(DEFAULT_CONTRACT_ID)),
            Err(AddressError::InvalidAccount(DEFAULT_CONTRACT_ID.into()))
        );
        assert!(contract_hash(&ContractId::new(ZERO_ACCOUNT)).is_err());

        let tampered = ZERO_ACCOUNT.replace("WHF", "WHG");
        assert!(account_key(&Address::new(tampered)).is_err());
        assert!(account_key(&Address::new("GABC")).is_err());
    }

    #[test]
    fn test_tx_error_mapping() {
        let err: TxError = account_key(&Address::new("GNOTAKEY")).unwrap_err().into();
        assert_eq!(err.error_code(), "invalid_address");
        assert_eq!(err.reason(), "Invalid account address: GNOTAKEY");
    }
}
