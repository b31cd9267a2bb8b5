#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]
#![allow(clippy::print_stdout)]

//! Operator tool for checking the Portal API from a shell.
//!
//! Reads the same configuration as the service (config.yaml + `TCN_` env)
//! and prints each directory response as JSON.

use clap::{Parser, Subcommand};
use serde::Serialize;
use tcn_directory_api::{
    config::Config,
    portal::{
        BulletinSync, BulletinSyncRequest, MemberDirectory, MemberQuery, DEFAULT_EXPORT_LIMIT,
        DEFAULT_SEARCH_LIMIT,
    },
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "portal_probe", about = "Query the member directory from the command line")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, default_value = "config.yaml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that the Portal API answers
    Ping,
    /// Search by name or T-number
    Search {
        term: String,
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: u32,
    },
    /// Paged listing with optional filters
    List {
        #[arg(long)]
        community: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        include_deceased: bool,
    },
    /// Look up one member by T-number
    Lookup { t_number: String },
    /// List a community's members
    Community { name: String },
    /// Export members with an email address
    Emails {
        #[arg(long, default_value_t = DEFAULT_EXPORT_LIMIT)]
        limit: u32,
    },
    /// Export members with a phone number
    Phones {
        #[arg(long, default_value_t = DEFAULT_EXPORT_LIMIT)]
        limit: u32,
    },
    /// Build a deduplicated SMS/email recipient list from T-numbers
    Recipients {
        #[arg(required = true)]
        t_numbers: Vec<String>,
    },
    /// Post a bulletin to the Portal
    Bulletin {
        #[arg(long)]
        source_id: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        subject: String,
        /// Absolute URL or a path on the Portal host
        #[arg(long)]
        poster_url: String,
        #[arg(long)]
        category: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), anyhow::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    let config = Config::load_from(&cli.config).map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.level))
        .with_writer(std::io::stderr)
        .init();

    let directory = MemberDirectory::from_config(&config.portal);

    match cli.command {
        Command::Ping => {
            let connected = directory.test_connection().await;
            print_json(&serde_json::json!({
                "configured": directory.is_configured(),
                "connected": connected,
            }))?;
            if !connected {
                anyhow::bail!("Portal API is not reachable");
            }
        }
        Command::Search { term, limit } => {
            print_json(&directory.search_members(&term, limit).await)?;
        }
        Command::List {
            community,
            search,
            limit,
            include_deceased,
        } => {
            let query = MemberQuery {
                page: None,
                limit,
                community,
                search,
                include_deceased,
            };
            print_json(&directory.get_members(&query).await)?;
        }
        Command::Lookup { t_number } => {
            print_json(&directory.get_member_by_t_number(&t_number).await)?;
        }
        Command::Community { name } => {
            print_json(&directory.get_members_by_community(&name).await)?;
        }
        Command::Emails { limit } => {
            print_json(&directory.get_all_emails(limit).await)?;
        }
        Command::Phones { limit } => {
            print_json(&directory.get_all_phone_numbers(limit).await)?;
        }
        Command::Recipients { t_numbers } => {
            let selection = directory.select_recipients(&t_numbers).await;
            print_json(&serde_json::json!({
                "members": selection.members(),
                "phones": selection.phones(),
                "emails": selection.emails(),
            }))?;
        }
        Command::Bulletin {
            source_id,
            title,
            subject,
            poster_url,
            category,
        } => {
            let request = BulletinSyncRequest {
                source_id,
                title,
                subject,
                poster_url,
                category,
            };
            let response = BulletinSync::from_config(&config.portal)
                .sync(&request)
                .await?;
            print_json(&response)?;
        }
    }

    Ok(())
}
