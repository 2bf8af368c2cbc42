use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{
    Account, AccountId, AccountStatus, Cents, EntryKind, LedgerEntry, User, UserId,
};

use super::MIGRATION_001_INITIAL;

/// Structural statistics over the ledger tables, used by integrity checks.
#[derive(Debug, Clone)]
pub struct LedgerStats {
    pub entry_count: i64,
    pub has_sequence_gaps: bool,
    pub orphan_entries: i64,
    pub invalid_amounts: i64,
}

/// Repository for persisting and querying users, accounts and ledger entries.
///
/// Point reads run against the pool directly. Every balance-affecting
/// operation runs inside a transaction obtained from [`Repository::begin`],
/// using the `*_tx` statement helpers; the pool hands each transaction its
/// own connection, so concurrent operations never share a handle.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    ///
    /// WAL mode plus a busy timeout makes concurrent write transactions
    /// queue on the writer lock instead of failing fast; each operation's
    /// guarded UPDATE then runs against the latest committed state.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .context("Invalid database URL")?
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    /// Begin a transaction on a dedicated pooled connection.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .context("Failed to begin transaction")
    }

    // ========================
    // User operations
    // ========================

    /// Get a user by ID.
    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, national_id, phone, address
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a user by national identity number.
    pub async fn get_user_by_national_id(&self, national_id: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, national_id, phone, address
            FROM users
            WHERE national_id = ?
            "#,
        )
        .bind(national_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by national id")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Transaction-scoped variant of [`Repository::get_user_by_national_id`].
    pub async fn user_by_national_id_tx(
        conn: &mut SqliteConnection,
        national_id: &str,
    ) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, national_id, phone, address
            FROM users
            WHERE national_id = ?
            "#,
        )
        .bind(national_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to fetch user by national id")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert a new user row inside a transaction.
    pub async fn insert_user(conn: &mut SqliteConnection, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, national_id, phone, address)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user.id.to_string())
        .bind(&user.name)
        .bind(&user.national_id)
        .bind(&user.phone)
        .bind(&user.address)
        .execute(&mut *conn)
        .await
        .context("Failed to insert user")?;
        Ok(())
    }

    fn row_to_user(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
        let id_str: String = row.get("id");
        Ok(User {
            id: Uuid::parse_str(&id_str).context("Invalid user ID")?,
            name: row.get("name"),
            national_id: row.get("national_id"),
            phone: row.get("phone"),
            address: row.get("address"),
        })
    }

    // ========================
    // Account operations
    // ========================

    const ACCOUNT_COLUMNS: &'static str =
        "id, owner_user_id, account_number, credential_hash, balance_cents, status, created_at";

    /// Get an account by its externally visible number.
    pub async fn get_account_by_number(&self, account_number: &str) -> Result<Option<Account>> {
        let query = format!(
            "SELECT {} FROM accounts WHERE account_number = ?",
            Self::ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(account_number)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Transaction-scoped variant of [`Repository::get_account_by_number`].
    pub async fn account_by_number_tx(
        conn: &mut SqliteConnection,
        account_number: &str,
    ) -> Result<Option<Account>> {
        let query = format!(
            "SELECT {} FROM accounts WHERE account_number = ?",
            Self::ACCOUNT_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(account_number)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// List all accounts, ordered by account number.
    pub async fn list_accounts(&self) -> Result<Vec<Account>> {
        let query = format!(
            "SELECT {} FROM accounts ORDER BY account_number",
            Self::ACCOUNT_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    /// Insert a new account row inside a transaction.
    pub async fn insert_account(conn: &mut SqliteConnection, account: &Account) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, owner_user_id, account_number, credential_hash, balance_cents, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id.to_string())
        .bind(account.owner_user_id.to_string())
        .bind(&account.account_number)
        .bind(&account.credential_hash)
        .bind(account.balance_cents)
        .bind(account.status.as_str())
        .bind(account.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to insert account")?;
        Ok(())
    }

    /// Add to an active account's balance. Returns the number of rows
    /// updated: 0 means the account is missing or not active.
    ///
    /// Issued as the first write of its transaction so the store's writer
    /// lock serializes concurrent mutations of the same account.
    pub async fn credit_balance(
        conn: &mut SqliteConnection,
        account_number: &str,
        amount_cents: Cents,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents + ?1
            WHERE account_number = ?2 AND status = 'active'
            "#,
        )
        .bind(amount_cents)
        .bind(account_number)
        .execute(&mut *conn)
        .await
        .context("Failed to credit balance")?;

        Ok(result.rows_affected())
    }

    /// Subtract from an active account's balance, guarded so the balance
    /// can never go negative. Returns the number of rows updated: 0 means
    /// the account is missing, not active, or has insufficient funds.
    pub async fn debit_balance(
        conn: &mut SqliteConnection,
        account_number: &str,
        amount_cents: Cents,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents - ?1
            WHERE account_number = ?2 AND status = 'active' AND balance_cents >= ?1
            "#,
        )
        .bind(amount_cents)
        .bind(account_number)
        .execute(&mut *conn)
        .await
        .context("Failed to debit balance")?;

        Ok(result.rows_affected())
    }

    /// Administrative status change (freeze/unfreeze). Not part of the
    /// ledger protocol; balances are untouched.
    pub async fn set_account_status(
        &self,
        account_id: AccountId,
        status: AccountStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE accounts SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(account_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to set account status")?;
        Ok(())
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let owner_str: String = row.get("owner_user_id");
        let status_str: String = row.get("status");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            owner_user_id: Uuid::parse_str(&owner_str).context("Invalid owner user ID")?,
            account_number: row.get("account_number"),
            credential_hash: row.get("credential_hash"),
            balance_cents: row.get("balance_cents"),
            status: AccountStatus::from_str(&status_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid account status: {}", status_str))?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Ledger entry operations
    // ========================

    const ENTRY_COLUMNS: &'static str =
        "id, sequence, account_id, kind, amount_cents, balance_after_cents, description, created_at";

    /// Append a ledger entry inside a transaction.
    /// Automatically assigns the next sequence number.
    pub async fn insert_entry(conn: &mut SqliteConnection, entry: &mut LedgerEntry) -> Result<()> {
        let sequence = Self::next_sequence(conn).await?;
        entry.sequence = sequence;

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (id, sequence, account_id, kind, amount_cents, balance_after_cents, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.id.to_string())
        .bind(entry.sequence)
        .bind(entry.account_id.to_string())
        .bind(entry.kind.as_str())
        .bind(entry.amount_cents)
        .bind(entry.balance_after_cents)
        .bind(&entry.description)
        .bind(entry.created_at.to_rfc3339())
        .execute(&mut *conn)
        .await
        .context("Failed to insert ledger entry")?;

        Ok(())
    }

    /// Get the next sequence number and increment the counter.
    async fn next_sequence(conn: &mut SqliteConnection) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counter
            SET value = value + 1
            WHERE name = 'entry_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&mut *conn)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    /// List the most recent entries for an account, newest first,
    /// bounded to `limit` rows.
    pub async fn list_entries_for_account(
        &self,
        account_id: AccountId,
        limit: i64,
    ) -> Result<Vec<LedgerEntry>> {
        let query = format!(
            "SELECT {} FROM ledger_entries WHERE account_id = ? ORDER BY sequence DESC LIMIT ?",
            Self::ENTRY_COLUMNS
        );
        let rows = sqlx::query(&query)
            .bind(account_id.to_string())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list entries for account")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// List every ledger entry, oldest first. Used for replay verification.
    pub async fn list_entries(&self) -> Result<Vec<LedgerEntry>> {
        let query = format!(
            "SELECT {} FROM ledger_entries ORDER BY sequence",
            Self::ENTRY_COLUMNS
        );
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list entries")?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Count entries recorded for an account.
    pub async fn count_entries_for_account(&self, account_id: AccountId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM ledger_entries WHERE account_id = ?")
            .bind(account_id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count entries")?;

        Ok(row.get("count"))
    }

    /// Get structural statistics for integrity checking.
    pub async fn get_ledger_stats(&self) -> Result<LedgerStats> {
        let sequence_check = sqlx::query(
            r#"
            SELECT
                MIN(sequence) as min_seq,
                MAX(sequence) as max_seq,
                COUNT(*) as count
            FROM ledger_entries
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let min_seq: Option<i64> = sequence_check.get("min_seq");
        let max_seq: Option<i64> = sequence_check.get("max_seq");
        let entry_count: i64 = sequence_check.get("count");

        let has_sequence_gaps = match (min_seq, max_seq) {
            (Some(min), Some(max)) => (max - min + 1) != entry_count,
            _ => false,
        };

        // Entries pointing at accounts that don't exist
        let orphan_entries: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM ledger_entries e
            WHERE NOT EXISTS (SELECT 1 FROM accounts a WHERE a.id = e.account_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        // Negative amounts, or zero amounts outside the opening entry
        let invalid_amounts: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM ledger_entries
            WHERE amount_cents < 0 OR (amount_cents = 0 AND kind != 'open')
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        Ok(LedgerStats {
            entry_count,
            has_sequence_gaps,
            orphan_entries,
            invalid_amounts,
        })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<LedgerEntry> {
        let id_str: String = row.get("id");
        let account_str: String = row.get("account_id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        Ok(LedgerEntry {
            id: Uuid::parse_str(&id_str).context("Invalid entry ID")?,
            sequence: row.get("sequence"),
            account_id: Uuid::parse_str(&account_str).context("Invalid account ID")?,
            kind: EntryKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid entry kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            balance_after_cents: row.get("balance_after_cents"),
            description: row.get("description"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
