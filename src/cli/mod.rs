use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::application::{AccountDirectory, AuditTrail, AuthService, LedgerEngine};
use crate::domain::{format_cents, parse_cents, AccountFaultKind, IntegrityReport, LedgerEntry};
use crate::storage::Repository;

/// Cassa - Bank Account Ledger
#[derive(Parser)]
#[command(name = "cassa")]
#[command(about = "A transactional bank-account ledger with an append-only audit trail")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "cassa.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Register a new customer with their first account
    Register {
        /// Customer name
        name: String,

        /// National identity number (must be unique)
        #[arg(long)]
        national_id: String,

        /// Phone number
        #[arg(long)]
        phone: String,

        /// Postal address
        #[arg(long)]
        address: String,

        /// Account number for the new account (must be unique)
        #[arg(long)]
        account: String,

        /// Account password
        #[arg(long)]
        password: String,

        /// Initial deposit (e.g., "200.00"; defaults to zero)
        #[arg(long, default_value = "0")]
        initial_deposit: String,
    },

    /// Verify a login
    Login {
        /// Account number
        account: String,

        /// Account password
        password: String,
    },

    /// Show the balance of an account
    Balance {
        /// Account number
        account: String,
    },

    /// Deposit into an account
    Deposit {
        /// Account number
        account: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw from an account
    Withdraw {
        /// Account number
        account: String,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,
    },

    /// Show recent ledger entries for an account, newest first
    History {
        /// Account number
        account: String,

        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<i64>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show customer information for an account
    Info {
        /// Account number
        account: String,
    },

    /// Verify ledger integrity
    Check,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let Cli { database, command } = self;

        match command {
            Commands::Init => {
                let db_url = format!("sqlite:{}?mode=rwc", database);
                Repository::init(&db_url).await?;
                println!("Database initialized: {}", database);
            }

            Commands::Register {
                name,
                national_id,
                phone,
                address,
                account,
                password,
                initial_deposit,
            } => {
                let repo = connect(&database).await?;
                let engine = LedgerEngine::new(repo);

                let initial_cents = parse_cents(&initial_deposit)
                    .context("Invalid amount format. Use '50.00' or '50'")?;

                let registration = engine
                    .register(
                        &name,
                        &national_id,
                        &phone,
                        &address,
                        &account,
                        &password,
                        initial_cents,
                    )
                    .await?;

                println!(
                    "Registered {} with account {} (balance {})",
                    name,
                    account,
                    format_cents(initial_cents)
                );
                println!("User ID: {}", registration.user_id);
                println!("Account ID: {}", registration.account_id);
            }

            Commands::Login { account, password } => {
                let repo = connect(&database).await?;
                let auth = AuthService::new(AccountDirectory::new(repo));

                if auth.verify_login(&account, &password).await? {
                    let balance = auth.balance(&account).await?;
                    println!("Login successful. Balance: {}", format_cents(balance));
                } else {
                    // One message for every failure mode: the caller learns
                    // nothing about which check failed.
                    println!("Login failed: check account number and password");
                }
            }

            Commands::Balance { account } => {
                let repo = connect(&database).await?;
                let auth = AuthService::new(AccountDirectory::new(repo));
                let balance = auth.balance(&account).await?;
                println!("{}: {}", account, format_cents(balance));
            }

            Commands::Deposit { account, amount } => {
                let repo = connect(&database).await?;
                let engine = LedgerEngine::new(repo);
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let new_balance = engine.deposit(&account, amount_cents).await?;
                println!(
                    "Deposited {} into {}. New balance: {}",
                    format_cents(amount_cents),
                    account,
                    format_cents(new_balance)
                );
            }

            Commands::Withdraw { account, amount } => {
                let repo = connect(&database).await?;
                let engine = LedgerEngine::new(repo);
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let new_balance = engine.withdraw(&account, amount_cents).await?;
                println!(
                    "Withdrew {} from {}. New balance: {}",
                    format_cents(amount_cents),
                    account,
                    format_cents(new_balance)
                );
            }

            Commands::History {
                account,
                limit,
                json,
            } => {
                let repo = connect(&database).await?;
                let audit = AuditTrail::new(repo);
                let entries = audit.history(&account, limit).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    print_history(&account, &entries);
                }
            }

            Commands::Info { account } => {
                let repo = connect(&database).await?;
                let auth = AuthService::new(AccountDirectory::new(repo));
                let info = auth.user_info(&account).await?;

                println!("Name:           {}", info.name);
                println!("Phone:          {}", info.phone);
                println!("Account number: {}", info.account_number);
                println!("Balance:        {}", format_cents(info.balance_cents));
                println!("Opened:         {}", info.created_at.format("%Y-%m-%d %H:%M"));
            }

            Commands::Check => {
                let repo = connect(&database).await?;
                let engine = LedgerEngine::new(repo);
                let report = engine.check_integrity().await?;
                print_integrity_report(&report);
            }
        }

        Ok(())
    }
}

async fn connect(database: &str) -> Result<Repository> {
    let db_url = format!("sqlite:{}", database);
    Repository::connect(&db_url).await
}

fn print_history(account: &str, entries: &[LedgerEntry]) {
    if entries.is_empty() {
        println!("No entries for account {}", account);
        return;
    }

    println!("History for account {} (newest first):", account);
    for entry in entries {
        println!(
            "  {}  {:<8}  {:>12}  balance {:>12}  {}",
            entry.created_at.format("%Y-%m-%d %H:%M"),
            entry.kind,
            format_cents(entry.amount_cents),
            format_cents(entry.balance_after_cents),
            entry.description.as_deref().unwrap_or("-")
        );
    }
}

fn print_integrity_report(report: &IntegrityReport) {
    println!(
        "Accounts: {}  Entries: {}",
        report.account_count, report.entry_count
    );

    if report.is_clean() {
        println!("Ledger integrity: OK");
        return;
    }

    println!("Ledger integrity: PROBLEMS FOUND");
    if report.has_sequence_gaps {
        println!("  - sequence numbers have gaps");
    }
    if report.orphan_entries > 0 {
        println!("  - {} entries reference missing accounts", report.orphan_entries);
    }
    if report.invalid_amounts > 0 {
        println!("  - {} entries have invalid amounts", report.invalid_amounts);
    }
    for fault in &report.account_faults {
        match &fault.fault {
            AccountFaultKind::BalanceMismatch { replayed_cents } => println!(
                "  - account {}: stored balance {} but ledger replays to {}",
                fault.account_number,
                format_cents(fault.stored_balance_cents),
                format_cents(*replayed_cents)
            ),
            AccountFaultKind::History(history_fault) => println!(
                "  - account {}: broken history: {:?}",
                fault.account_number, history_fault
            ),
            AccountFaultKind::EmptyHistory => println!(
                "  - account {}: no ledger entries (missing opening entry)",
                fault.account_number
            ),
        }
    }
}
