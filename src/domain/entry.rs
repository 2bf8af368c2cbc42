use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type EntryId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// The opening entry written when the account is created. Its amount
    /// is the initial deposit and may be zero.
    Open,
    Deposit,
    Withdraw,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Open => "open",
            EntryKind::Deposit => "deposit",
            EntryKind::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "open" => Some(EntryKind::Open),
            "deposit" => Some(EntryKind::Deposit),
            "withdraw" => Some(EntryKind::Withdraw),
            _ => None,
        }
    }

    /// The signed effect of an entry of this kind on the account balance.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            EntryKind::Open | EntryKind::Deposit => amount_cents,
            EntryKind::Withdraw => -amount_cents,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable record of a balance-affecting event.
/// Entries are append-only - the ledger never updates or deletes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    /// Monotonically increasing sequence number for ordering.
    pub sequence: i64,
    pub account_id: AccountId,
    pub kind: EntryKind,
    /// Unsigned magnitude of the event. Strictly positive except for the
    /// opening entry of a zero-deposit account.
    pub amount_cents: Cents,
    /// Snapshot of the account balance immediately after this entry.
    pub balance_after_cents: Cents,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Create a new entry. Sequence number must be assigned by the repository.
    pub fn new(
        account_id: AccountId,
        kind: EntryKind,
        amount_cents: Cents,
        balance_after_cents: Cents,
    ) -> Self {
        assert!(
            amount_cents > 0 || (amount_cents == 0 && kind == EntryKind::Open),
            "Entry amount must be positive"
        );
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            account_id,
            kind,
            amount_cents,
            balance_after_cents,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
