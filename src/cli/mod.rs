//! CLI module - Command-line interface for the workflow server
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

pub use commands::{cmd_create_user, cmd_init, cmd_migrate};

use clap::{Parser, Subcommand};

/// Requisition workflow server
/// Item CRUD with bearer-token auth and an admin approval role
#[derive(Parser)]
#[command(name = "workflow")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Apply pending schema migrations and exit
    Migrate,

    /// Provision a user account, including admins
    CreateUser {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// `admin` grants the admin role
        #[arg(long, default_value = "")]
        position: String,

        #[arg(long, default_value = "")]
        first_name: String,

        #[arg(long, default_value = "")]
        last_name: String,

        #[arg(long)]
        photo_link: Option<String>,
    },

    /// Write a default config.toml if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_serve() {
        let cli = Cli::try_parse_from(["workflow"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_create_user_args() {
        let cli = Cli::try_parse_from([
            "workflow",
            "create-user",
            "--username",
            "root",
            "--password",
            "pw",
            "--position",
            "admin",
        ])
        .unwrap();

        let Some(Commands::CreateUser {
            username,
            position,
            photo_link,
            ..
        }) = cli.command
        else {
            panic!("expected create-user");
        };
        assert_eq!(username, "root");
        assert_eq!(position, "admin");
        assert!(photo_link.is_none());
    }

    #[test]
    fn test_create_user_requires_password() {
        assert!(Cli::try_parse_from(["workflow", "create-user", "--username", "root"]).is_err());
    }
}
