use thiserror::Error;

use crate::domain::Cents;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account is frozen: {0}")]
    AccountFrozen(String),

    #[error("Account number already exists: {0}")]
    DuplicateAccountNumber(String),

    #[error("A user with national id {0} is already registered")]
    DuplicateUser(String),

    #[error(
        "Insufficient funds in account {account_number}: balance {balance_cents}, requested {requested_cents}"
    )]
    InsufficientFunds {
        account_number: String,
        balance_cents: Cents,
        requested_cents: Cents,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
