//! iepf CLI - Administrative commands
//!
//! Usage:
//!   iepf migrate
//!   iepf seed-admin
//!   iepf --config iepf.toml seed-admin

use clap::{Parser, Subcommand};
use iepf_api::{
    auth::password::PasswordHasher,
    logging::init_tracing,
    seed::{seed_admin, SeedOutcome},
};
use iepf_core::{config::AppConfig, PgStore};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "iepf")]
#[command(about = "Administration CLI for the iepf user API")]
#[command(version)]
struct Cli {
    /// TOML configuration file; environment variables override it
    #[arg(long, global = true, env = "IEPF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply database migrations
    Migrate,
    /// Create the initial admin from ADMIN_EMAIL and ADMIN_PASSWORD
    SeedAdmin,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    init_tracing(&config.logging)?;

    let store = PgStore::connect(&config.database.url, config.database.max_connections).await?;
    store.migrate().await?;

    match cli.command {
        Commands::Migrate => {
            println!("Migrations applied");
        }
        Commands::SeedAdmin => {
            config.validate()?;
            let passwords = PasswordHasher::new(config.auth.password_salt.clone());

            match seed_admin(&store, &passwords, &config.admin).await? {
                SeedOutcome::Created(admin) => {
                    tracing::info!(user_id = %admin.id, "Admin user created");
                    println!("Created admin user {} ({})", admin.email, admin.id);
                }
                SeedOutcome::AlreadyExists { email } => {
                    println!("Admin user {email} already exists, nothing to do");
                }
            }
        }
    }

    Ok(())
}
