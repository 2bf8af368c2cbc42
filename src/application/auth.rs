use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::{verify_credential, Cents};

use super::{AccountDirectory, AppError};

/// Customer-facing view of a user and their account, as returned after a
/// successful login.
pub struct UserInfo {
    pub name: String,
    pub phone: String,
    pub account_number: String,
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

/// Credential verification and read-only customer queries.
/// Depends on the account directory only; never writes.
pub struct AuthService {
    directory: AccountDirectory,
}

impl AuthService {
    pub fn new(directory: AccountDirectory) -> Self {
        Self { directory }
    }

    /// Verify a login attempt. Succeeds only for an existing, active
    /// account whose stored hash matches the supplied password.
    ///
    /// Unknown account, frozen account and wrong password are all reported
    /// as a plain `false`: the caller learns nothing about which check
    /// failed.
    pub async fn verify_login(
        &self,
        account_number: &str,
        password: &str,
    ) -> Result<bool, AppError> {
        let verified = match self.directory.lookup_by_account_number(account_number).await {
            Ok(account) => {
                account.is_active() && verify_credential(password, &account.credential_hash)
            }
            Err(AppError::AccountNotFound(_)) => false,
            Err(e) => return Err(e),
        };

        info!(account = %account_number, verified, "login attempt");
        Ok(verified)
    }

    /// Join user and account state for display after login.
    pub async fn user_info(&self, account_number: &str) -> Result<UserInfo, AppError> {
        let account = self.directory.lookup_by_account_number(account_number).await?;
        let user = self.directory.owner_of(&account).await?;

        Ok(UserInfo {
            name: user.name,
            phone: user.phone,
            account_number: account.account_number,
            balance_cents: account.balance_cents,
            created_at: account.created_at,
        })
    }

    /// Current balance for an account.
    pub async fn balance(&self, account_number: &str) -> Result<Cents, AppError> {
        let account = self.directory.lookup_by_account_number(account_number).await?;
        Ok(account.balance_cents)
    }
}
