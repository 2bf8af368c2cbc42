mod common;

use anyhow::Result;
use cassa::application::AppError;
use cassa::domain::EntryKind;
use common::{register_account, test_bank};

#[tokio::test]
async fn test_history_is_newest_first() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;

    bank.engine.deposit("1001", 1000).await?;
    bank.engine.withdraw("1001", 500).await?;

    let entries = bank.audit.history("1001", None).await?;
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].kind, EntryKind::Withdraw);
    assert_eq!(entries[1].kind, EntryKind::Deposit);
    assert_eq!(entries[2].kind, EntryKind::Open);

    // Strictly descending sequence
    assert!(entries[0].sequence > entries[1].sequence);
    assert!(entries[1].sequence > entries[2].sequence);

    Ok(())
}

#[tokio::test]
async fn test_history_respects_limit() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;

    for _ in 0..7 {
        bank.engine.deposit("1001", 100).await?;
    }

    let entries = bank.audit.history("1001", Some(5)).await?;
    assert_eq!(entries.len(), 5);
    // The page holds only the most recent entries, so the open entry
    // (the oldest) must have been cut off.
    assert!(entries.iter().all(|e| e.kind == EntryKind::Deposit));

    Ok(())
}

#[tokio::test]
async fn test_history_default_limit_is_twenty() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;

    for _ in 0..25 {
        bank.engine.deposit("1001", 100).await?;
    }

    let entries = bank.audit.history("1001", None).await?;
    assert_eq!(entries.len(), 20);

    Ok(())
}

#[tokio::test]
async fn test_missing_account_is_distinct_from_empty_page() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;

    // Unknown account: an error, not an empty list
    assert!(matches!(
        bank.audit.history("9999", None).await,
        Err(AppError::AccountNotFound(_))
    ));

    // Known account with a zero-entry page: an empty list, not an error
    let entries = bank.audit.history("1001", Some(0)).await?;
    assert!(entries.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_history_only_contains_own_entries() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;
    register_account(&bank, "1002", 20000).await?;

    bank.engine.deposit("1001", 1000).await?;
    bank.engine.deposit("1002", 2000).await?;

    let entries = bank.audit.history("1001", None).await?;
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.amount_cents != 2000));

    Ok(())
}
