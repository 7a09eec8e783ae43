//! Payment schedule parsing.
//!
//! A trigger carries its payees as two parallel `|`-separated lists, one of
//! addresses and one of amounts. Parsing is all-or-nothing: either every
//! position yields a valid payment or no schedule is produced.

use log::{debug, warn};
use rusty_shared_types::{
    format_money, money_range, parse_fixed_point, Address, Amount, AmountError,
};

use crate::error::SuperblockError;

/// Longest amount string accepted before the fixed-point grammar is applied.
const MAX_AMOUNT_STRING_LEN: usize = 20;

/// A single required superblock output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernancePayment {
    pub address: Address,
    pub script: Vec<u8>,
    pub amount: Amount,
}

impl GovernancePayment {
    pub fn new(address: Address, amount: Amount) -> Self {
        Self {
            script: address.script_pubkey(),
            address,
            amount,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.script.is_empty() && money_range(self.amount)
    }
}

/// Splits on `|`, dropping empty tokens.
pub fn split_payment_list(list: &str) -> Vec<&str> {
    list.split('|').filter(|part| !part.is_empty()).collect()
}

/// Parses one schedule amount, in coins with up to 8 decimals.
///
/// No spaces, signs or scientific notation are allowed.
pub fn parse_payment_amount(amount: &str) -> Result<Amount, AmountError> {
    if amount.is_empty() {
        return Err(AmountError::Empty);
    }
    if amount.len() > MAX_AMOUNT_STRING_LEN {
        return Err(AmountError::TooLong);
    }
    if !amount.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(AmountError::InvalidCharacter);
    }
    if let Some(pos) = amount.find('.') {
        if pos == 0 {
            return Err(AmountError::LeadingDecimalPoint);
        }
        if amount[pos + 1..].contains('.') {
            return Err(AmountError::MultipleDecimalPoints);
        }
    }
    let value = parse_fixed_point(amount, 8).ok_or(AmountError::NotFixedPoint)?;
    let value = Amount::try_from(value).map_err(|_| AmountError::OutOfRange)?;
    if !money_range(value) {
        return Err(AmountError::OutOfRange);
    }
    Ok(value)
}

/// Turns parallel address and amount lists into an ordered payment schedule.
pub fn parse_payment_schedule(
    addresses: &str,
    amounts: &str,
    address_version: u8,
) -> Result<Vec<GovernancePayment>, SuperblockError> {
    let addresses = split_payment_list(addresses);
    let amounts = split_payment_list(amounts);

    if addresses.len() != amounts.len() {
        return Err(SuperblockError::ScheduleMismatch {
            addresses: addresses.len(),
            amounts: amounts.len(),
        });
    }
    if addresses.is_empty() {
        debug!(target: "gobject", "parse_payment_schedule -- no payments");
        return Err(SuperblockError::EmptySchedule);
    }

    let mut payments = Vec::with_capacity(addresses.len());
    for (encoded, amount_str) in addresses.iter().zip(amounts.iter()) {
        let address = Address::parse(encoded, address_version).map_err(|source| {
            warn!("parse_payment_schedule -- invalid address {}: {}", encoded, source);
            SuperblockError::InvalidAddress {
                address: encoded.to_string(),
                source,
            }
        })?;

        let amount = parse_payment_amount(amount_str).map_err(|source| SuperblockError::InvalidAmount {
            amount: amount_str.to_string(),
            source,
        })?;

        let payment = GovernancePayment::new(address, amount);
        if !payment.is_valid() {
            warn!(
                "parse_payment_schedule -- invalid payment found: address = {}, amount = {}",
                address,
                format_money(amount)
            );
            return Err(SuperblockError::InvalidPayment {
                address: address.to_string(),
                amount,
            });
        }
        payments.push(payment);
    }

    Ok(payments)
}
