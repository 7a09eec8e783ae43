use rusty_shared_types::{AddressError, Amount, AmountError};
use thiserror::Error;

/// Reasons a trigger could not be turned into a superblock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SuperblockError {
    #[error("mismatched payments and amounts: {addresses} addresses, {amounts} amounts")]
    ScheduleMismatch { addresses: usize, amounts: usize },

    #[error("no payments in schedule")]
    EmptySchedule,

    #[error("invalid payment address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("invalid payment amount {amount:?}: {source}")]
    InvalidAmount {
        amount: String,
        #[source]
        source: AmountError,
    },

    #[error("invalid payment found: address = {address}, amount = {amount}")]
    InvalidPayment { address: String, amount: Amount },

    #[error("governance object {0} not found")]
    ObjectNotFound(String),

    #[error("governance object {0} is not a trigger")]
    WrongObjectType(String),

    #[error("malformed trigger payload: {0}")]
    MalformedPayload(String),
}
