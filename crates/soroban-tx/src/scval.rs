//! SCVal helpers for contract arguments and return values
//!
//! Contract calls take and return `SCVal`s. RPC and Horizon responses carry
//! them as base64 XDR.

use stellar_xdr::curr::{Int128Parts, Limits, ReadXdr, ScSymbol, ScVal, StringM, WriteXdr};

pub use stellar_xdr::curr::Error as XdrError;

/// `SCV_I128` from a native integer
pub fn i128_val(value: i128) -> ScVal {
    ScVal::I128(Int128Parts {
        hi: (value >> 64) as i64,
        lo: value as u64,
    })
}

/// Integer value of any integral `SCVal`
pub fn val_as_i128(val: &ScVal) -> Option<i128> {
    match val {
        ScVal::I128(parts) => Some(((parts.hi as i128) << 64) | parts.lo as i128),
        ScVal::I64(v) => Some(*v as i128),
        ScVal::U64(v) => Some(*v as i128),
        ScVal::I32(v) => Some(*v as i128),
        ScVal::U32(v) => Some(*v as i128),
        _ => None,
    }
}

pub fn val_as_symbol(val: &ScVal) -> Option<String> {
    match val {
        ScVal::Symbol(symbol) => symbol.0.to_utf8_string().ok(),
        _ => None,
    }
}

/// Contract function name; at most 32 bytes
pub fn symbol(name: &str) -> Result<ScSymbol, XdrError> {
    Ok(ScSymbol(StringM::try_from(name)?))
}

pub fn symbol_val(name: &str) -> Result<ScVal, XdrError> {
    Ok(ScVal::Symbol(symbol(name)?))
}

pub fn decode_sc_val_base64(encoded: &str) -> Result<ScVal, XdrError> {
    ScVal::from_xdr_base64(encoded.trim(), Limits::none())
}

pub fn encode_sc_val_base64(val: &ScVal) -> Result<String, XdrError> {
    val.to_xdr_base64(Limits::none())
}
