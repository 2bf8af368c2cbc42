use std::collections::HashMap;

use anyhow::Context;
use sqlx::SqliteConnection;
use tracing::{info, warn};

use crate::domain::{
    build_integrity_report, hash_credential, Account, AccountId, Cents, EntryKind, IntegrityReport,
    LedgerEntry, User, UserId,
};
use crate::storage::Repository;

use super::AppError;

/// Result of the composite registration flow.
pub struct Registration {
    pub user_id: UserId,
    pub account_id: AccountId,
}

/// The transactional core: the sole writer of balances and ledger entries.
///
/// Every operation follows the same four-phase protocol inside a single
/// transaction: validate, fetch, mutate, record. The transaction commits
/// only if all phases succeed, so a balance change without its ledger
/// entry (or the reverse) is never observable.
///
/// The balance mutation is a guarded UPDATE issued as the first write of
/// the transaction. The store serializes writers at that statement, so two
/// concurrent withdrawals against the same account cannot both pass the
/// funds check: the loser re-reads committed state and fails the guard.
pub struct LedgerEngine {
    repo: Repository,
}

impl LedgerEngine {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Deposit into an active account. Returns the new balance.
    pub async fn deposit(
        &self,
        account_number: &str,
        amount_cents: Cents,
    ) -> Result<Cents, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Deposit amount must be positive".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;

        let updated = Repository::credit_balance(&mut *tx, account_number, amount_cents).await?;
        if updated == 0 {
            let account = Repository::account_by_number_tx(&mut *tx, account_number).await?;
            let _ = tx.rollback().await;
            let err = match account {
                None => AppError::AccountNotFound(account_number.to_string()),
                Some(_) => AppError::AccountFrozen(account_number.to_string()),
            };
            warn!(account = %account_number, %err, "deposit rejected");
            return Err(err);
        }

        let account = Repository::account_by_number_tx(&mut *tx, account_number)
            .await?
            .context("Account vanished mid-transaction")?;

        let mut entry = LedgerEntry::new(
            account.id,
            EntryKind::Deposit,
            amount_cents,
            account.balance_cents,
        )
        .with_description("Cash deposit");
        Repository::insert_entry(&mut *tx, &mut entry).await?;

        tx.commit().await.context("Failed to commit deposit")?;

        info!(
            account = %account_number,
            amount = amount_cents,
            balance = account.balance_cents,
            "deposit recorded"
        );
        Ok(account.balance_cents)
    }

    /// Withdraw from an active account with sufficient funds. Returns the
    /// new balance. Withdrawing the exact balance (down to zero) is legal.
    pub async fn withdraw(
        &self,
        account_number: &str,
        amount_cents: Cents,
    ) -> Result<Cents, AppError> {
        if amount_cents <= 0 {
            return Err(AppError::InvalidAmount(
                "Withdrawal amount must be positive".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;

        let updated = Repository::debit_balance(&mut *tx, account_number, amount_cents).await?;
        if updated == 0 {
            let account = Repository::account_by_number_tx(&mut *tx, account_number).await?;
            let _ = tx.rollback().await;
            let err = match account {
                None => AppError::AccountNotFound(account_number.to_string()),
                Some(account) if !account.is_active() => {
                    AppError::AccountFrozen(account_number.to_string())
                }
                Some(account) => AppError::InsufficientFunds {
                    account_number: account_number.to_string(),
                    balance_cents: account.balance_cents,
                    requested_cents: amount_cents,
                },
            };
            warn!(account = %account_number, %err, "withdrawal rejected");
            return Err(err);
        }

        let account = Repository::account_by_number_tx(&mut *tx, account_number)
            .await?
            .context("Account vanished mid-transaction")?;

        let mut entry = LedgerEntry::new(
            account.id,
            EntryKind::Withdraw,
            amount_cents,
            account.balance_cents,
        )
        .with_description("Cash withdrawal");
        Repository::insert_entry(&mut *tx, &mut entry).await?;

        tx.commit().await.context("Failed to commit withdrawal")?;

        info!(
            account = %account_number,
            amount = amount_cents,
            balance = account.balance_cents,
            "withdrawal recorded"
        );
        Ok(account.balance_cents)
    }

    /// Open an account for an existing user. The only constructor of
    /// account rows; writes the opening ledger entry in the same
    /// transaction. The initial deposit may be zero.
    pub async fn open_account(
        &self,
        owner_user_id: UserId,
        account_number: &str,
        credential: &str,
        initial_deposit_cents: Cents,
    ) -> Result<AccountId, AppError> {
        if initial_deposit_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Initial deposit must not be negative".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;

        let account_id = match Self::open_account_in_tx(
            &mut tx,
            owner_user_id,
            account_number,
            credential,
            initial_deposit_cents,
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        tx.commit().await.context("Failed to commit account opening")?;

        info!(
            account = %account_number,
            balance = initial_deposit_cents,
            "account opened"
        );
        Ok(account_id)
    }

    /// Register a new customer: user record plus their first account, as
    /// one atomic unit. If account creation fails, the user insert rolls
    /// back with it - no orphaned user is ever persisted.
    pub async fn register(
        &self,
        name: &str,
        national_id: &str,
        phone: &str,
        address: &str,
        account_number: &str,
        credential: &str,
        initial_deposit_cents: Cents,
    ) -> Result<Registration, AppError> {
        if initial_deposit_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Initial deposit must not be negative".to_string(),
            ));
        }

        let mut tx = self.repo.begin().await?;

        if Repository::user_by_national_id_tx(&mut tx, national_id)
            .await?
            .is_some()
        {
            let _ = tx.rollback().await;
            warn!(national_id, "registration rejected: duplicate user");
            return Err(AppError::DuplicateUser(national_id.to_string()));
        }

        let user = User::new(name, national_id, phone, address);
        Repository::insert_user(&mut tx, &user).await?;

        let account_id = match Self::open_account_in_tx(
            &mut tx,
            user.id,
            account_number,
            credential,
            initial_deposit_cents,
        )
        .await
        {
            Ok(id) => id,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        tx.commit().await.context("Failed to commit registration")?;

        info!(
            account = %account_number,
            user = %user.id,
            "customer registered"
        );
        Ok(Registration {
            user_id: user.id,
            account_id,
        })
    }

    /// Replay every account's ledger history and cross-check it against
    /// stored balances.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let stats = self.repo.get_ledger_stats().await?;
        let accounts = self.repo.list_accounts().await?;
        let entries = self.repo.list_entries().await?;

        let mut by_account: HashMap<AccountId, Vec<LedgerEntry>> = HashMap::new();
        for entry in entries {
            by_account.entry(entry.account_id).or_default().push(entry);
        }

        Ok(build_integrity_report(
            &accounts,
            &by_account,
            stats.entry_count,
            stats.has_sequence_gaps,
            stats.orphan_entries,
            stats.invalid_amounts,
        ))
    }

    /// Shared open step for `open_account` and `register`: duplicate
    /// check, account insert, opening entry, all on the caller's
    /// transaction.
    async fn open_account_in_tx(
        conn: &mut SqliteConnection,
        owner_user_id: UserId,
        account_number: &str,
        credential: &str,
        initial_deposit_cents: Cents,
    ) -> Result<AccountId, AppError> {
        if Repository::account_by_number_tx(conn, account_number)
            .await?
            .is_some()
        {
            warn!(account = %account_number, "open rejected: duplicate account number");
            return Err(AppError::DuplicateAccountNumber(account_number.to_string()));
        }

        let account = Account::new(
            owner_user_id,
            account_number,
            hash_credential(credential),
            initial_deposit_cents,
        );
        Repository::insert_account(conn, &account).await?;

        let mut entry = LedgerEntry::new(
            account.id,
            EntryKind::Open,
            initial_deposit_cents,
            initial_deposit_cents,
        )
        .with_description("Account opened");
        Repository::insert_entry(conn, &mut entry).await?;

        Ok(account.id)
    }
}
