//! Command-line interface.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mailsweep_core::RelativeWindow;

#[derive(Parser, Debug)]
#[command(name = "mailsweep")]
#[command(version)]
#[command(about = "Fetch, classify and clean up your inbox", long_about = None)]
pub struct Cli {
    /// Path to the settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check whether the stored session is signed in
    Status,

    /// Sign in to the triage service
    Login {
        /// Session cookie copied from the browser after signing in
        #[arg(long)]
        cookie: Option<String>,

        /// Print the sign-in URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Fetch the latest emails, classify them and show the results
    Triage {
        /// Number of emails to fetch (10, 25, 50, 100, 200 or 500)
        #[arg(short = 'n', long)]
        count: Option<u32>,

        /// Only fetch emails from a recent window: 7d, 30d, 90d or 1y
        #[arg(short, long, conflicts_with_all = ["from", "to"])]
        window: Option<RelativeWindow>,

        /// First day of a custom range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,

        /// Last day of a custom range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Delete every email suggested for deletion
        #[arg(long)]
        delete_suggested: bool,

        /// Show message bodies
        #[arg(long)]
        bodies: bool,
    },

    /// Show the latest emails as already categorized by the service
    Refresh {
        /// Delete every email suggested for deletion
        #[arg(long)]
        delete_suggested: bool,

        /// Show message bodies
        #[arg(long)]
        bodies: bool,
    },

    /// Manage the settings file
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Write the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective settings
    Show,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_triage_window() {
        let cli = Cli::try_parse_from(["mailsweep", "triage", "-n", "25", "--window", "30d"]).unwrap();
        match cli.command {
            Command::Triage { count, window, .. } => {
                assert_eq!(count, Some(25));
                assert_eq!(window, Some(RelativeWindow::Last30Days));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_custom_range_needs_both_bounds() {
        assert!(Cli::try_parse_from(["mailsweep", "triage", "--from", "2024-01-01"]).is_err());
        assert!(
            Cli::try_parse_from([
                "mailsweep", "triage", "--from", "2024-01-01", "--to", "2024-01-31"
            ])
            .is_ok()
        );
        assert!(
            Cli::try_parse_from([
                "mailsweep", "triage", "--window", "7d", "--from", "2024-01-01", "--to",
                "2024-01-31"
            ])
            .is_err()
        );
    }

    #[test]
    fn test_bad_window_rejected() {
        assert!(Cli::try_parse_from(["mailsweep", "triage", "--window", "2w"]).is_err());
    }
}
