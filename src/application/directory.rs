use crate::domain::{Account, User};
use crate::storage::Repository;

use super::AppError;

/// Read-only lookups over account and user state.
///
/// Used by the authentication service and the audit trail; never mutates
/// anything and runs outside any transaction (point reads observe only
/// committed state, since all mutation is transactional).
pub struct AccountDirectory {
    repo: Repository,
}

impl AccountDirectory {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Look up an account by its externally visible number.
    pub async fn lookup_by_account_number(&self, account_number: &str) -> Result<Account, AppError> {
        self.repo
            .get_account_by_number(account_number)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_number.to_string()))
    }

    /// Look up a user by national identity number. Returns `None` when no
    /// such user exists; registration uses this to reject duplicates.
    pub async fn lookup_user_by_national_id(
        &self,
        national_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self.repo.get_user_by_national_id(national_id).await?)
    }

    /// Resolve the user owning an account. A dangling owner reference is a
    /// storage-level corruption, not a business outcome.
    pub async fn owner_of(&self, account: &Account) -> Result<User, AppError> {
        self.repo
            .get_user(account.owner_user_id)
            .await?
            .ok_or_else(|| {
                AppError::Storage(anyhow::anyhow!(
                    "account {} references missing user {}",
                    account.account_number,
                    account.owner_user_id
                ))
            })
    }
}
