use std::collections::HashMap;

use super::{Account, AccountId, Cents, EntryKind, LedgerEntry};

/// Replay a ledger history in sequence order by summing signed amounts,
/// starting from zero. The result is the balance the account should hold.
pub fn replay_balance(entries: &[LedgerEntry]) -> Cents {
    entries
        .iter()
        .fold(0, |balance, entry| balance + entry.kind.signed(entry.amount_cents))
}

/// Problems found while walking one account's ledger history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryFault {
    /// An entry's balance snapshot disagrees with the running sum.
    BalanceAfterMismatch {
        sequence: i64,
        expected: Cents,
        actual: Cents,
    },
    /// The running sum dipped below zero at this entry.
    NegativeBalance { sequence: i64, balance: Cents },
    /// The history does not start with an open entry, or has more than one.
    OpenEntryCount(usize),
}

/// Walk a single account's entries (in sequence order) and verify that the
/// ledger is a faithful, gapless history of the balance: each snapshot
/// equals the running sum, the sum never goes negative, and exactly one
/// open entry exists at the start.
pub fn verify_history(entries: &[LedgerEntry]) -> Result<Cents, HistoryFault> {
    let open_count = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Open)
        .count();
    if open_count != 1 || entries.first().map(|e| e.kind) != Some(EntryKind::Open) {
        return Err(HistoryFault::OpenEntryCount(open_count));
    }

    let mut running = 0;
    for entry in entries {
        running += entry.kind.signed(entry.amount_cents);
        if running < 0 {
            return Err(HistoryFault::NegativeBalance {
                sequence: entry.sequence,
                balance: running,
            });
        }
        if entry.balance_after_cents != running {
            return Err(HistoryFault::BalanceAfterMismatch {
                sequence: entry.sequence,
                expected: running,
                actual: entry.balance_after_cents,
            });
        }
    }
    Ok(running)
}

/// One account whose stored balance disagrees with its replayed history,
/// or whose history itself is inconsistent.
#[derive(Debug, Clone)]
pub struct AccountFault {
    pub account_number: String,
    pub stored_balance_cents: Cents,
    pub fault: AccountFaultKind,
}

#[derive(Debug, Clone)]
pub enum AccountFaultKind {
    /// History replays cleanly but to a different balance than stored.
    BalanceMismatch { replayed_cents: Cents },
    /// The history itself is broken.
    History(HistoryFault),
    /// The account has no entries at all (missing its open entry).
    EmptyHistory,
}

/// Ledger-wide integrity report.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub account_count: i64,
    pub entry_count: i64,
    pub has_sequence_gaps: bool,
    pub orphan_entries: i64,
    pub invalid_amounts: i64,
    pub account_faults: Vec<AccountFault>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        !self.has_sequence_gaps
            && self.orphan_entries == 0
            && self.invalid_amounts == 0
            && self.account_faults.is_empty()
    }
}

/// Cross-check every account against its replayed ledger history.
/// Entries must be grouped per account and sorted by sequence.
pub fn build_integrity_report(
    accounts: &[Account],
    entries_by_account: &HashMap<AccountId, Vec<LedgerEntry>>,
    entry_count: i64,
    has_sequence_gaps: bool,
    orphan_entries: i64,
    invalid_amounts: i64,
) -> IntegrityReport {
    let mut account_faults = Vec::new();

    for account in accounts {
        let fault = match entries_by_account.get(&account.id) {
            None => Some(AccountFaultKind::EmptyHistory),
            Some(entries) if entries.is_empty() => Some(AccountFaultKind::EmptyHistory),
            Some(entries) => match verify_history(entries) {
                Err(fault) => Some(AccountFaultKind::History(fault)),
                Ok(replayed) if replayed != account.balance_cents => {
                    Some(AccountFaultKind::BalanceMismatch {
                        replayed_cents: replayed,
                    })
                }
                Ok(_) => None,
            },
        };

        if let Some(fault) = fault {
            account_faults.push(AccountFault {
                account_number: account.account_number.clone(),
                stored_balance_cents: account.balance_cents,
                fault,
            });
        }
    }

    IntegrityReport {
        account_count: accounts.len() as i64,
        entry_count,
        has_sequence_gaps,
        orphan_entries,
        invalid_amounts,
        account_faults,
    }
}
