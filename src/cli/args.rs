//! CLI argument definitions using clap
//!
//! Every command takes `--config <path>` (default `./feedloader.json`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// feedloader - feed-based file ingestion service
#[derive(Parser, Debug)]
#[command(name = "feedloader")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config if missing and create an empty catalog
    Init {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        /// Data directory used when a new config is written
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },

    /// Start the HTTP API
    Serve {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        /// Overrides `http.port`
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create a user account
    UserCreate {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        #[arg(long)]
        username: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long)]
        password: String,

        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },

    /// Create a feed
    FeedCreate {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        #[arg(long)]
        name: String,
    },

    /// Grant a user upload rights on a feed
    FeedAddUser {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        #[arg(long)]
        feed: String,

        #[arg(long)]
        username: String,
    },

    /// Revoke a user's upload rights on a feed
    FeedRemoveUser {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        #[arg(long)]
        feed: String,

        #[arg(long)]
        username: String,
    },

    /// Create a column descriptor
    ColumnCreate {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        #[arg(long)]
        name: String,

        /// text, integer, float, boolean, date or datetime
        #[arg(long, default_value = "text")]
        col_type: String,
    },

    /// List the files of a feed
    Files {
        #[arg(long, default_value = "./feedloader.json")]
        config: PathBuf,

        #[arg(long)]
        feed: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feed_add_user() {
        let cli = Cli::try_parse_from([
            "feedloader",
            "feed-add-user",
            "--feed",
            "prices",
            "--username",
            "alice",
        ])
        .unwrap();

        match cli.command {
            Command::FeedAddUser { config, feed, username } => {
                assert_eq!(config, PathBuf::from("./feedloader.json"));
                assert_eq!(feed, "prices");
                assert_eq!(username, "alice");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_user_create_admin_flag() {
        let cli = Cli::try_parse_from([
            "feedloader",
            "user-create",
            "--config",
            "/etc/feedloader.json",
            "--username",
            "root",
            "--password",
            "longpassword1",
            "--admin",
        ])
        .unwrap();

        match cli.command {
            Command::UserCreate { admin, email, .. } => {
                assert!(admin);
                assert_eq!(email, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_arg() {
        assert!(Cli::try_parse_from(["feedloader", "feed-create"]).is_err());
    }
}
