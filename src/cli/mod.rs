//! CLI argument definitions for proftrack.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{EngagementType, Liaison, LinkKind, PipelineStatus};
use crate::storage::BackendType;

/// proftrack - Track outreach to professors through the pipeline.
///
/// Start with `pt system init`, then `pt login <secret>` and `pt admin` to edit.
#[derive(Parser, Debug)]
#[command(name = "pt")]
#[command(
    author,
    version,
    about = "Track professor relationships: pipeline stage, contact history, and notes",
    long_about = None
)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Directory holding the database and state.kdl (overrides PT_DATA_DIR)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Record store to use (overrides PT_BACKEND and config.kdl)
    #[arg(long, global = true, value_parser = parse_backend)]
    pub backend: Option<BackendType>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// System administration commands
    System {
        #[command(subcommand)]
        command: SystemCommands,
    },

    /// Log in with the team's shared secret
    Login {
        /// The shared secret
        secret: String,
    },

    /// Log out and turn admin mode off
    Logout,

    /// Toggle admin mode (required for editing)
    Admin,

    /// Show the current session flags
    Whoami,

    /// Professor management commands
    Professor {
        #[command(subcommand)]
        command: ProfessorCommands,
    },

    /// Activity log commands
    Activity {
        #[command(subcommand)]
        command: ActivityCommands,
    },

    /// Dashboard counters: stages, stale count, liaisons
    Summary,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// System subcommands
#[derive(Subcommand, Debug)]
pub enum SystemCommands {
    /// Create the data directory and local database
    Init {
        /// Store this shared secret in state.kdl
        #[arg(long)]
        secret: Option<String>,

        /// Store this REST API key in state.kdl
        #[arg(long)]
        api_key: Option<String>,
    },
}

/// Professor subcommands
#[derive(Subcommand, Debug)]
pub enum ProfessorCommands {
    /// Add a new professor
    Add {
        /// Full name
        name: String,

        /// Institution
        institution: String,

        /// Role (default: Professor)
        #[arg(long)]
        role: Option<String>,

        /// Pipeline status (Identified, "In Contact", "First Lead", "First Client")
        #[arg(short, long)]
        status: Option<PipelineStatus>,

        /// Assigned liaison
        #[arg(short, long)]
        liaison: Option<Liaison>,

        /// Engagement type
        #[arg(short, long)]
        engagement: Option<EngagementType>,

        /// Core expertise tag (repeatable)
        #[arg(long = "core-ip")]
        core_ip: Vec<String>,

        /// Notes
        #[arg(long)]
        notes: Option<String>,

        /// Next action
        #[arg(long)]
        next_action: Option<String>,
    },

    /// List professors, optionally filtered
    List {
        /// Case-insensitive search over name, institution, and core expertise
        #[arg(short = 'q', long)]
        search: Option<String>,

        /// Only this pipeline status
        #[arg(short, long)]
        status: Option<PipelineStatus>,

        /// Only this liaison ("unassigned" for none)
        #[arg(short, long)]
        liaison: Option<Liaison>,

        /// Only professors without contact in the last 30 days
        #[arg(long)]
        stale: bool,
    },

    /// Show a professor with their activity log
    Show {
        /// Professor ID
        id: String,
    },

    /// Update a professor
    Update {
        /// Professor ID
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        institution: Option<String>,

        #[arg(long)]
        role: Option<String>,

        #[arg(short, long)]
        status: Option<PipelineStatus>,

        #[arg(short, long)]
        liaison: Option<Liaison>,

        #[arg(short, long)]
        engagement: Option<EngagementType>,

        #[arg(long)]
        notes: Option<String>,

        #[arg(long)]
        next_action: Option<String>,

        /// Whether a contract is signed
        #[arg(long)]
        contract_signed: Option<bool>,

        /// Append a core expertise tag (repeatable)
        #[arg(long = "add-core-ip")]
        add_core_ip: Vec<String>,

        /// Remove a core expertise tag by index (repeatable)
        #[arg(long = "remove-core-ip")]
        remove_core_ip: Vec<usize>,

        /// Append an exec-ed program (repeatable)
        #[arg(long = "add-program")]
        add_program: Vec<String>,

        /// Remove an exec-ed program by index (repeatable)
        #[arg(long = "remove-program")]
        remove_program: Vec<usize>,

        /// Append a client (repeatable)
        #[arg(long = "add-client")]
        add_client: Vec<String>,

        /// Remove a client by index (repeatable)
        #[arg(long = "remove-client")]
        remove_client: Vec<usize>,

        /// Set a link as KEY=URL (faculty_page, google_scholar, linkedin, other); empty URL clears
        #[arg(long = "link", value_parser = parse_link)]
        links: Vec<(LinkKind, String)>,
    },
}

/// Activity log subcommands
#[derive(Subcommand, Debug)]
pub enum ActivityCommands {
    /// Log an interaction and mark the professor as contacted now
    Add {
        /// Professor ID
        professor_id: String,

        /// What happened
        entry: String,

        /// Date of the interaction, YYYY-MM-DD (default: today)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Who logged it (default: the professor's liaison, or "Team")
        #[arg(long = "by")]
        created_by: Option<String>,
    },

    /// List a professor's activity log, newest first
    List {
        /// Professor ID
        professor_id: String,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration and where each value came from
    Show,

    /// Set a value in config.kdl
    Set {
        /// One of: backend, rest-url, request-timeout-secs, output-format
        key: String,

        value: String,
    },
}

fn parse_backend(s: &str) -> Result<BackendType, String> {
    BackendType::parse(s)
        .ok_or_else(|| format!("unknown backend '{}' (expected sqlite or rest)", s))
}

fn parse_link(s: &str) -> Result<(LinkKind, String), String> {
    let (key, url) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=URL, got '{}'", s))?;
    let kind = key.parse::<LinkKind>().map_err(|e| e.to_string())?;
    Ok((kind, url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_link() {
        assert_eq!(
            parse_link("linkedin=https://linkedin.com/in/x").unwrap(),
            (LinkKind::Linkedin, "https://linkedin.com/in/x".to_string())
        );
        assert_eq!(parse_link("other=").unwrap(), (LinkKind::Other, String::new()));
        assert!(parse_link("twitter=https://x").is_err());
        assert!(parse_link("no-equals").is_err());
    }

    #[test]
    fn test_parse_enum_args() {
        let cli = Cli::try_parse_from([
            "pt",
            "professor",
            "list",
            "--status",
            "in-contact",
            "--liaison",
            "unassigned",
            "--stale",
        ])
        .unwrap();
        match cli.command {
            Commands::Professor {
                command: ProfessorCommands::List { status, liaison, stale, .. },
            } => {
                assert_eq!(status, Some(PipelineStatus::InContact));
                assert_eq!(liaison, Some(Liaison::Unassigned));
                assert!(stale);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_status_rejected() {
        assert!(Cli::try_parse_from(["pt", "professor", "list", "--status", "Lost"]).is_err());
    }
}
