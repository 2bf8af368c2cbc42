mod common;

use anyhow::Result;
use cassa::application::AppError;
use cassa::domain::EntryKind;
use common::{register_account, test_bank};

#[tokio::test]
async fn test_register_creates_user_account_and_open_entry() -> Result<()> {
    let (bank, _temp) = test_bank().await?;

    let registration = bank
        .engine
        .register(
            "Grace Hopper",
            "ID-7",
            "555-0101",
            "2 Harbor Road",
            "2002",
            "pw",
            20000,
        )
        .await?;

    let account = bank.directory.lookup_by_account_number("2002").await?;
    assert_eq!(account.id, registration.account_id);
    assert_eq!(account.owner_user_id, registration.user_id);
    assert_eq!(account.balance_cents, 20000);

    let user = bank
        .directory
        .lookup_user_by_national_id("ID-7")
        .await?
        .expect("user should exist after registration");
    assert_eq!(user.id, registration.user_id);
    assert_eq!(user.name, "Grace Hopper");

    let entries = bank.audit.history("2002", None).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Open);
    assert_eq!(entries[0].amount_cents, 20000);
    assert_eq!(entries[0].balance_after_cents, 20000);

    Ok(())
}

#[tokio::test]
async fn test_zero_initial_deposit_still_writes_open_entry() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 0).await?;

    assert_eq!(bank.auth.balance("1001").await?, 0);

    let entries = bank.audit.history("1001", None).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Open);
    assert_eq!(entries[0].amount_cents, 0);
    assert_eq!(entries[0].balance_after_cents, 0);

    Ok(())
}

#[tokio::test]
async fn test_negative_initial_deposit_is_rejected() -> Result<()> {
    let (bank, _temp) = test_bank().await?;

    let result = bank
        .engine
        .register(
            "Grace Hopper",
            "ID-7",
            "555-0101",
            "2 Harbor Road",
            "2002",
            "pw",
            -1,
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_national_id_is_rejected() -> Result<()> {
    let (bank, _temp) = test_bank().await?;

    bank.engine
        .register("A", "ID-7", "555-0101", "addr", "2002", "pw", 0)
        .await?;

    let result = bank
        .engine
        .register("B", "ID-7", "555-0102", "addr", "2003", "pw", 0)
        .await;
    assert!(matches!(result, Err(AppError::DuplicateUser(_))));

    // The second account was never created
    assert!(matches!(
        bank.directory.lookup_by_account_number("2003").await,
        Err(AppError::AccountNotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_account_number_rolls_back_the_user() -> Result<()> {
    let (bank, _temp) = test_bank().await?;

    bank.engine
        .register("A", "ID-1", "555-0101", "addr", "2002", "pw", 0)
        .await?;

    // Same account number, different customer: the account insert fails,
    // and the user created earlier in the same transaction must vanish.
    let result = bank
        .engine
        .register("B", "ID-2", "555-0102", "addr", "2002", "pw", 0)
        .await;
    assert!(matches!(result, Err(AppError::DuplicateAccountNumber(_))));

    assert!(
        bank.directory
            .lookup_user_by_national_id("ID-2")
            .await?
            .is_none(),
        "failed registration must not leave an orphaned user"
    );

    Ok(())
}

#[tokio::test]
async fn test_open_second_account_for_existing_user() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let registration = register_account(&bank, "1001", 10000).await?;

    let account_id = bank
        .engine
        .open_account(registration.user_id, "1002", "pw2", 5000)
        .await?;

    let second = bank.directory.lookup_by_account_number("1002").await?;
    assert_eq!(second.id, account_id);
    assert_eq!(second.owner_user_id, registration.user_id);
    assert_eq!(second.balance_cents, 5000);

    // The first account is untouched
    assert_eq!(bank.auth.balance("1001").await?, 10000);

    Ok(())
}

#[tokio::test]
async fn test_open_account_scenario_from_spec() -> Result<()> {
    // openAccount(user, "2002", "pw", 200.00) -> balance 200.00 and one
    // open entry {amount: 200.00, balance_after: 200.00}
    let (bank, _temp) = test_bank().await?;
    let registration = register_account(&bank, "1001", 0).await?;

    bank.engine
        .open_account(registration.user_id, "2002", "pw", 20000)
        .await?;

    assert_eq!(bank.auth.balance("2002").await?, 20000);
    let entries = bank.audit.history("2002", None).await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Open);
    assert_eq!(entries[0].amount_cents, 20000);
    assert_eq!(entries[0].balance_after_cents, 20000);

    Ok(())
}
