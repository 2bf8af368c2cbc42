use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, UserId};

pub type AccountId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Normal operation: logins and balance mutations are allowed.
    Active,
    /// Administratively blocked: the account exists but accepts no
    /// logins, deposits or withdrawals.
    Frozen,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Frozen => "frozen",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(AccountStatus::Active),
            "frozen" => Some(AccountStatus::Frozen),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A balance-bearing bank account ("card") owned by a user.
///
/// The balance is mutated only through the ledger engine; every mutation
/// appends a matching ledger entry in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner_user_id: UserId,
    /// Externally visible identifier, unique across all time.
    pub account_number: String,
    pub credential_hash: String,
    pub balance_cents: Cents,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new active account with the given opening balance.
    /// The credential must already be hashed.
    pub fn new(
        owner_user_id: UserId,
        account_number: impl Into<String>,
        credential_hash: impl Into<String>,
        balance_cents: Cents,
    ) -> Self {
        assert!(balance_cents >= 0, "Opening balance must be non-negative");
        Self {
            id: Uuid::new_v4(),
            owner_user_id,
            account_number: account_number.into(),
            credential_hash: credential_hash.into(),
            balance_cents,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}
