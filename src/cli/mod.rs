//! CLI module for vidqa.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// vidqa - Ask questions about YouTube videos
///
/// Fetches a video's captions, indexes them semantically and answers
/// questions grounded in the transcript using a local or hosted LLM.
#[derive(Parser, Debug)]
#[command(name = "vidqa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask a question about a video
    Ask {
        /// The question to ask (prompted for when omitted)
        question: Option<String>,

        /// YouTube video ID or URL (prompted for when omitted)
        #[arg(short = 'i', long)]
        video: Option<String>,

        /// Show the transcript chunks the answer was grounded on
        #[arg(short, long)]
        sources: bool,
    },

    /// Show the transcript chunks most relevant to a query, without generating an answer
    Search {
        /// YouTube video ID or URL
        video: String,

        /// Search query
        query: String,
    },

    /// Fetch and print a video's transcript
    Transcript {
        /// YouTube video ID or URL
        video: String,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_video_flag() {
        let cli = Cli::parse_from(["vidqa", "-vv", "ask", "--video", "abc", "What is it?"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, video, sources } => {
                assert_eq!(question.as_deref(), Some("What is it?"));
                assert_eq!(video.as_deref(), Some("abc"));
                assert!(!sources);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_ask_without_inputs() {
        let cli = Cli::parse_from(["vidqa", "ask"]);
        assert!(matches!(
            cli.command,
            Commands::Ask { question: None, video: None, .. }
        ));
    }

    #[test]
    fn test_parse_config_init() {
        let cli = Cli::parse_from(["vidqa", "-c", "/tmp/v.toml", "config", "init", "--force"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/v.toml"));
        assert!(matches!(
            cli.command,
            Commands::Config { action: ConfigAction::Init { force: true } }
        ));
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
