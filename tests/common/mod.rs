// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use cassa::application::{AccountDirectory, AuditTrail, AuthService, LedgerEngine, Registration};
use cassa::domain::AccountStatus;
use cassa::storage::Repository;
use tempfile::TempDir;

pub const PASSWORD: &str = "s3cret";

/// All services wired over one temporary database.
pub struct TestBank {
    pub repo: Repository,
    pub engine: LedgerEngine,
    pub auth: AuthService,
    pub audit: AuditTrail,
    pub directory: AccountDirectory,
}

/// Helper to create the full service set on a temporary database
pub async fn test_bank() -> Result<(TestBank, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite:{}?mode=rwc", db_path.to_str().unwrap());
    let repo = Repository::init(&db_url).await?;

    Ok((
        TestBank {
            engine: LedgerEngine::new(repo.clone()),
            auth: AuthService::new(AccountDirectory::new(repo.clone())),
            audit: AuditTrail::new(repo.clone()),
            directory: AccountDirectory::new(repo.clone()),
            repo,
        },
        temp_dir,
    ))
}

/// Register a customer with one account. The national id is derived from
/// the account number so fixtures stay unique within a test.
pub async fn register_account(
    bank: &TestBank,
    account_number: &str,
    initial_cents: i64,
) -> Result<Registration> {
    let registration = bank
        .engine
        .register(
            "Ada Lovelace",
            &format!("ID-{account_number}"),
            "555-0100",
            "1 Bank Street",
            account_number,
            PASSWORD,
            initial_cents,
        )
        .await?;
    Ok(registration)
}

/// Administratively freeze an account.
pub async fn freeze_account(bank: &TestBank, account_number: &str) -> Result<()> {
    let account = bank
        .directory
        .lookup_by_account_number(account_number)
        .await?;
    bank.repo
        .set_account_status(account.id, AccountStatus::Frozen)
        .await?;
    Ok(())
}
