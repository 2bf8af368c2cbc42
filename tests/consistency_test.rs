mod common;

use anyhow::Result;
use cassa::domain::{replay_balance, verify_history, EntryKind, LedgerEntry};
use cassa::storage::Repository;
use common::{register_account, test_bank};

#[tokio::test]
async fn test_replaying_the_ledger_reproduces_the_balance() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;

    bank.engine.deposit("1001", 5000).await?;
    bank.engine.withdraw("1001", 2500).await?;
    bank.engine.deposit("1001", 123).await?;
    bank.engine.withdraw("1001", 7623).await?;

    let stored = bank.auth.balance("1001").await?;

    let mut entries = bank.audit.history("1001", Some(100)).await?;
    entries.reverse(); // creation order

    assert_eq!(replay_balance(&entries), stored);
    assert_eq!(verify_history(&entries), Ok(stored));

    Ok(())
}

#[tokio::test]
async fn test_deposit_withdraw_round_trip_nets_to_zero() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    let registration = register_account(&bank, "1001", 10000).await?;

    let before = bank.auth.balance("1001").await?;
    let entries_before = bank
        .repo
        .count_entries_for_account(registration.account_id)
        .await?;

    bank.engine.deposit("1001", 4200).await?;
    bank.engine.withdraw("1001", 4200).await?;

    assert_eq!(bank.auth.balance("1001").await?, before);
    assert_eq!(
        bank.repo
            .count_entries_for_account(registration.account_id)
            .await?,
        entries_before + 2
    );

    let entries = bank.audit.history("1001", None).await?;

    let net: i64 = entries[..2]
        .iter()
        .map(|e| e.kind.signed(e.amount_cents))
        .sum();
    assert_eq!(net, 0);

    Ok(())
}

#[tokio::test]
async fn test_integrity_check_is_clean_after_mixed_operations() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;
    register_account(&bank, "1002", 0).await?;

    bank.engine.deposit("1001", 5000).await?;
    bank.engine.withdraw("1001", 2500).await?;
    bank.engine.deposit("1002", 777).await?;

    let report = bank.engine.check_integrity().await?;
    assert!(report.is_clean(), "expected clean ledger: {report:?}");
    assert_eq!(report.account_count, 2);
    assert_eq!(report.entry_count, 5);

    Ok(())
}

#[tokio::test]
async fn test_failed_append_rolls_back_the_balance_mutation() -> Result<()> {
    let (bank, _temp) = test_bank().await?;
    register_account(&bank, "1001", 10000).await?;

    let mut tx = bank.repo.begin().await?;

    let updated = Repository::debit_balance(&mut tx, "1001", 1000).await?;
    assert_eq!(updated, 1);

    // Force the record phase to fail: a zero-amount withdraw entry
    // violates the schema's amount constraint.
    let account = Repository::account_by_number_tx(&mut tx, "1001")
        .await?
        .unwrap();
    assert_eq!(account.balance_cents, 9000, "mutation visible inside the tx");

    let mut entry = LedgerEntry::new(account.id, EntryKind::Withdraw, 1000, 9000);
    entry.amount_cents = 0;
    let append = Repository::insert_entry(&mut tx, &mut entry).await;
    assert!(append.is_err(), "invalid entry must be refused by the store");

    tx.rollback().await?;

    // The balance change from the same unit of work never became visible
    assert_eq!(bank.auth.balance("1001").await?, 10000);
    assert_eq!(bank.audit.history("1001", None).await?.len(), 1);

    Ok(())
}
