use crate::domain::LedgerEntry;
use crate::storage::Repository;

use super::AppError;

/// Page size used when the caller doesn't ask for one.
pub const DEFAULT_HISTORY_LIMIT: i64 = 20;

/// Read path over the append-only transaction log.
///
/// Never writes and needs no transaction: entries are immutable once
/// committed, so a plain snapshot read is always consistent.
pub struct AuditTrail {
    repo: Repository,
}

impl AuditTrail {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// The most recent ledger entries for an account, newest first,
    /// bounded to `limit` entries (default 20).
    ///
    /// A missing account is an error, distinct from an account that
    /// merely has an empty page.
    pub async fn history(
        &self,
        account_number: &str,
        limit: Option<i64>,
    ) -> Result<Vec<LedgerEntry>, AppError> {
        let account = self
            .repo
            .get_account_by_number(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))?;

        let limit = limit.unwrap_or(DEFAULT_HISTORY_LIMIT).max(0);
        Ok(self.repo.list_entries_for_account(account.id, limit).await?)
    }
}
