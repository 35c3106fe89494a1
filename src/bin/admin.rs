//! CLI administration tool for the library portal.
//!
//! Provides commands for seeding accounts, maintaining the catalog, checking
//! the mail outbox and recalculating fines without going through the portal.
//!
//! # Usage
//!
//! ```bash
//! # Create every super admin listed in SUPER_ADMIN_EMAILS
//! cargo run --bin admin -- seed
//!
//! # Add a regular admin
//! cargo run --bin admin -- admin create --email desk@rgmcet.edu.in
//!
//! # Add a book
//! cargo run --bin admin -- book add --title "Dune" --author "Frank Herbert" --copies 3
//!
//! # Show the last 20 outgoing emails
//! cargo run --bin admin -- mail list --limit 20
//!
//! # Bring every fine up to date
//! cargo run --bin admin -- fines recalc
//!
//! # View statistics
//! cargo run --bin admin -- stats
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! The same variables as the server (see `library_portal::config`); at least
//! the database settings and `SESSION_SECRET`.

use library_portal::application::services::catalog_service::AddBookOutcome;
use library_portal::config;
use library_portal::domain::entities::{DeliveryStatus, NewBook};
use library_portal::domain::mail::Notifier;
use library_portal::domain::mail_worker::run_mail_worker;
use library_portal::domain::repositories::OutboxRepository;
use library_portal::infrastructure::mail::LogMailer;
use library_portal::infrastructure::persistence::PgOutboxRepository;
use library_portal::infrastructure::predictor::DisabledPredictor;
use library_portal::server;
use library_portal::state::AppState;
use library_portal::utils::clock;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input, Password};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::mpsc;

/// CLI tool for managing the library portal.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Create missing super admins from SUPER_ADMIN_EMAILS
    Seed {
        /// Initial password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Manage admin accounts
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },

    /// Manage the catalog
    Book {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Inspect outgoing mail
    Mail {
        #[command(subcommand)]
        action: MailAction,
    },

    /// Fine maintenance
    Fines {
        #[command(subcommand)]
        action: FinesAction,
    },

    /// Show library statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a regular admin
    Create {
        #[arg(short, long)]
        email: Option<String>,
    },
    /// List admins
    List,
}

#[derive(Subcommand)]
enum BookAction {
    /// Add a book, or report the existing entry
    Add {
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        author: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        copies: i32,
    },
}

#[derive(Subcommand)]
enum MailAction {
    /// Most recent outgoing emails
    List {
        #[arg(short, long, default_value_t = 20)]
        limit: i64,
    },
}

#[derive(Subcommand)]
enum FinesAction {
    /// Accrue overdue fines for every student
    Recalc,
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = config::load_from_env()?;

    let pool = server::connect(&config).await?;
    let pool = Arc::new(pool);

    let (mail_tx, mail_rx) = mpsc::channel(config.mail_queue_capacity);
    let outbox = Arc::new(PgOutboxRepository::new(pool.clone()));
    let worker = tokio::spawn(run_mail_worker(
        mail_rx,
        Arc::new(LogMailer::new()),
        outbox.clone(),
    ));

    let state = AppState::new(
        &config,
        pool.clone(),
        Notifier::new(mail_tx),
        Arc::new(DisabledPredictor),
    );

    match cli.command {
        Commands::Seed { password } => seed(&state, &config.super_admin_emails, password).await?,
        Commands::Admin { action } => match action {
            AdminAction::Create { email } => create_admin(&state, email).await?,
            AdminAction::List => list_admins(&state).await?,
        },
        Commands::Book { action } => match action {
            BookAction::Add {
                title,
                author,
                copies,
            } => add_book(&state, title, author, copies).await?,
        },
        Commands::Mail { action } => match action {
            MailAction::List { limit } => list_mail(outbox.as_ref(), limit).await?,
        },
        Commands::Fines { action } => match action {
            FinesAction::Recalc => recalc_fines(&state).await?,
        },
        Commands::Stats => handle_stats(&state).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    // Let queued mail (fine notices) reach the outbox before exiting.
    drop(state);
    server::drain_mail(worker).await?;

    Ok(())
}

fn prompt_password(prompt: &str) -> Result<String> {
    Ok(Password::new()
        .with_prompt(prompt)
        .with_confirmation("Repeat password", "Passwords do not match")
        .interact()?)
}

async fn seed(state: &AppState, emails: &[String], password: Option<String>) -> Result<()> {
    println!("{}", "👑 Seed Super Admins".bright_blue().bold());
    println!();

    if emails.is_empty() {
        println!("{}", "  SUPER_ADMIN_EMAILS is empty, nothing to seed".yellow());
        return Ok(());
    }

    for email in emails {
        println!("  {}", email.cyan());
    }
    println!();

    let password = match password {
        Some(p) => p,
        None => prompt_password("Initial password")?,
    };

    let created = state
        .admin_service
        .seed_super_admins(&password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to seed super admins: {}", e))?;

    println!(
        "{} {} created, {} already present",
        "✅".green(),
        created.to_string().bright_white().bold(),
        emails.len() - created
    );
    Ok(())
}

async fn create_admin(state: &AppState, email: Option<String>) -> Result<()> {
    println!("{}", "🔑 Create Admin".bright_blue().bold());
    println!();

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let password = prompt_password("Password")?;

    let admin = state
        .admin_service
        .add_admin(&email, &password)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin: {}", e))?;

    println!();
    println!(
        "{} Admin {} created",
        "✅".green(),
        admin.email.bright_white().bold()
    );
    Ok(())
}

async fn list_admins(state: &AppState) -> Result<()> {
    println!("{}", "📋 Admins".bright_blue().bold());
    println!();

    let admins = state
        .admin_service
        .admins()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list admins: {}", e))?;

    if admins.is_empty() {
        println!("{}", "  No admins found".yellow());
        println!();
        println!(
            "  Seed super admins with: {} admin seed",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<36} {:<20} {}",
        "ID".bright_white().bold(),
        "Email".bright_white().bold(),
        "Created".bright_white().bold(),
        "Role".bright_white().bold()
    );
    println!("  {}", "─".repeat(72).bright_black());

    for account in &admins {
        let role = if account.is_super {
            "SUPER".magenta()
        } else {
            "ADMIN".green()
        };
        println!(
            "  {:<4} {:<36} {:<20} {}",
            account.admin.id.to_string().bright_black(),
            account.admin.email.cyan(),
            account
                .admin
                .created_at
                .format("%Y-%m-%d %H:%M")
                .to_string()
                .bright_black(),
            role
        );
    }
    println!();
    Ok(())
}

async fn add_book(
    state: &AppState,
    title: Option<String>,
    author: Option<String>,
    copies: i32,
) -> Result<()> {
    println!("{}", "📚 Add Book".bright_blue().bold());
    println!();

    let title = match title {
        Some(t) => t,
        None => Input::new().with_prompt("Title").interact_text()?,
    };
    let author = match author {
        Some(a) => a,
        None => Input::new().with_prompt("Author").interact_text()?,
    };

    let outcome = state
        .catalog_service
        .add_book(NewBook {
            title,
            author,
            copies,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to add book: {}", e))?;

    match outcome {
        AddBookOutcome::Created(book) => println!(
            "{} '{}' added as #{} with {} copies",
            "✅".green(),
            book.title.bright_white().bold(),
            book.id,
            book.available_copies
        ),
        AddBookOutcome::AlreadyExists(book) => {
            println!(
                "{} '{}' by {} already exists as #{} ({} copies)",
                "⚠️".yellow(),
                book.title.bright_white().bold(),
                book.author,
                book.id,
                book.available_copies
            );

            let add = Confirm::new()
                .with_prompt(format!("Add {copies} copies to it instead?"))
                .default(false)
                .interact()?;
            if add {
                let book = state
                    .catalog_service
                    .add_copies(book.id, copies)
                    .await
                    .map_err(|e| anyhow::anyhow!("Failed to add copies: {}", e))?;
                println!(
                    "{} {} copies now available",
                    "✅".green(),
                    book.available_copies
                );
            }
        }
    }
    Ok(())
}

/// Lists recent outgoing mail.
///
/// # Output Format
///
/// ```text
/// ✉️  Outgoing Mail
///
///   ID  Sent at           Status  Tries  To                      Subject
///   ─────────────────────────────────────────────────────────────────────
///   12  2026-10-19 10:30  SENT    1      21091a0501@rgmcet...    Your OTP for Library Signup
/// ```
async fn list_mail(outbox: &dyn OutboxRepository, limit: i64) -> Result<()> {
    println!("{}", "✉️  Outgoing Mail".bright_blue().bold());
    println!();

    let emails = outbox
        .recent(limit)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read outbox: {}", e))?;

    if emails.is_empty() {
        println!("{}", "  No mail sent yet".yellow());
        return Ok(());
    }

    println!(
        "  {:<4} {:<17} {:<7} {:<6} {:<30} {}",
        "ID".bright_white().bold(),
        "Sent at".bright_white().bold(),
        "Status".bright_white().bold(),
        "Tries".bright_white().bold(),
        "To".bright_white().bold(),
        "Subject".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    for email in &emails {
        let status = match email.status {
            DeliveryStatus::Sent => "SENT".green(),
            DeliveryStatus::Failed => "FAILED".red(),
        };
        println!(
            "  {:<4} {:<17} {:<7} {:<6} {:<30} {}",
            email.id.to_string().bright_black(),
            email.created_at.format("%Y-%m-%d %H:%M").to_string(),
            status,
            email.attempts,
            email.recipient.cyan(),
            email.subject
        );
    }
    println!();
    Ok(())
}

async fn recalc_fines(state: &AppState) -> Result<()> {
    println!("{}", "💰 Recalculate Fines".bright_blue().bold());
    println!();

    let report = state
        .fine_service
        .accrue_all(clock::today())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to accrue fines: {}", e))?;

    println!("  New fines:      {}", report.created.to_string().bright_white().bold());
    println!("  Raised fines:   {}", report.raised.to_string().bright_white().bold());
    println!("  Notices queued: {}", report.notified.to_string().bright_white().bold());
    println!();
    Ok(())
}

/// Displays library statistics.
///
/// Shows:
/// - Total books, open loans, overdue loans and students
/// - Borrowings per month for the last six months
async fn handle_stats(state: &AppState) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let today = clock::today();
    let stats = state
        .admin_service
        .stats(today)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load statistics: {}", e))?;
    let monthly = state
        .admin_service
        .monthly_borrowings(today, 6)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load monthly borrowings: {}", e))?;

    println!("  Books:      {}", stats.total_books.to_string().bright_white().bold());
    println!("  Borrowed:   {}", stats.total_borrowed.to_string().bright_white().bold());
    println!("  Overdue:    {}", stats.total_overdue.to_string().red().bold());
    println!("  Students:   {}", stats.total_students.to_string().bright_white().bold());
    println!();

    for month in &monthly {
        println!(
            "  {:<9} {:>4} {}",
            month.label(),
            month.count,
            "█".repeat(month.count.min(50)).bright_green()
        );
    }
    println!();

    Ok(())
}

/// Dispatches database commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1")
                .fetch_one(pool)
                .await
                .context("Database connection failed")?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;
            println!("  PostgreSQL: {}", version.bright_white());

            let size: String =
                sqlx::query_scalar("SELECT pg_size_pretty(pg_database_size(current_database()))")
                    .fetch_one(pool)
                    .await?;
            println!("  Size:       {}", size.bright_white());

            let migrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
                .fetch_one(pool)
                .await?;
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
