//! CLI module for Cuerag.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// Cuerag - speaker captions and local RAG
///
/// Extract a speaker's words from WebVTT captions, clean them up, and ask
/// questions over a Markdown knowledge base using a local model server.
#[derive(Parser, Debug)]
#[command(name = "cuerag")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "CUERAG_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract everything one speaker said from a .vtt caption file
    Speaker {
        /// Caption file to read
        input: String,

        /// Speaker's first name as it appears in the voice tag
        #[arg(short, long)]
        first_name: String,

        /// Speaker's last name as it appears in the voice tag
        #[arg(short, long)]
        last_name: String,

        /// How to print the utterances
        #[arg(long, value_enum, default_value = "numbered")]
        format: UtteranceFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// Also index the utterances into the collection
        #[arg(long)]
        ingest: bool,
    },

    /// Index a directory of Markdown documents
    Ingest {
        /// Directory to scan recursively
        directory: String,

        /// Collection to write to (defaults to the configured one)
        #[arg(long)]
        collection: Option<String>,

        /// Clear the collection before ingesting
        #[arg(long)]
        reset: bool,
    },

    /// Retrieve the chunks most relevant to a query
    Retrieve {
        /// Search query
        query: String,

        /// Maximum number of results per query
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum similarity score (0.0-1.0)
        #[arg(short, long)]
        min_score: Option<f32>,

        /// Number of model-generated query rephrasings (0 disables)
        #[arg(long)]
        variants: Option<usize>,

        /// Collection to search
        #[arg(long)]
        collection: Option<String>,
    },

    /// Ask a question and get an answer grounded in the collection
    Ask {
        /// The question to ask
        question: String,

        /// Chat model to use for the answer
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of context chunks per query
        #[arg(short = 'k', long)]
        max_chunks: Option<usize>,

        /// Number of model-generated query rephrasings (0 disables)
        #[arg(long)]
        variants: Option<usize>,

        /// Collection to search
        #[arg(long)]
        collection: Option<String>,
    },

    /// Clean up transcript text with the chat model
    Clean {
        /// Text file, or caption file when a speaker name is given
        input: String,

        /// Extract this speaker's first name from the caption file
        #[arg(short, long, requires = "last_name")]
        first_name: Option<String>,

        /// Extract this speaker's last name from the caption file
        #[arg(short, long, requires = "first_name")]
        last_name: Option<String>,

        /// Speaker name used in the prompt
        #[arg(short, long)]
        speaker: Option<String>,

        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// List what a collection holds
    List {
        /// Collection to list
        #[arg(long)]
        collection: Option<String>,

        /// Dump every chunk instead of a per-file summary
        #[arg(long)]
        full: bool,
    },

    /// Delete every document in a collection
    Reset {
        /// Collection to clear
        #[arg(long)]
        collection: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

impl Commands {
    /// Whether the command reads the configuration file and data directory.
    ///
    /// Plain speaker extraction and `config path`/`config init` work even
    /// when the config file is missing or broken.
    pub fn needs_settings(&self) -> bool {
        match self {
            Commands::Speaker { ingest, .. } => *ingest,
            Commands::Config { action } => matches!(action, ConfigAction::Show),
            _ => true,
        }
    }
}

/// Output layout for extracted utterances.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceFormat {
    /// One utterance per line
    Plain,
    /// Numbered lines
    Numbered,
    /// JSON array of strings
    Json,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_speaker() {
        let cli = Cli::try_parse_from([
            "cuerag", "-vv", "speaker", "m.vtt", "-f", "Kai", "-l", "Merklein", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Speaker {
                input,
                first_name,
                last_name,
                format,
                ..
            } => {
                assert_eq!(input, "m.vtt");
                assert_eq!(first_name, "Kai");
                assert_eq!(last_name, "Merklein");
                assert_eq!(format, UtteranceFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_clean_requires_both_names() {
        assert!(Cli::try_parse_from(["cuerag", "clean", "m.vtt", "-f", "Kai"]).is_err());
        assert!(Cli::try_parse_from(["cuerag", "clean", "notes.txt"]).is_ok());
    }

    #[test]
    fn test_needs_settings() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command;

        assert!(!parse(&["cuerag", "speaker", "m.vtt", "-f", "Kai", "-l", "M"]).needs_settings());
        assert!(parse(&["cuerag", "speaker", "m.vtt", "-f", "Kai", "-l", "M", "--ingest"])
            .needs_settings());
        assert!(!parse(&["cuerag", "config", "path"]).needs_settings());
        assert!(!parse(&["cuerag", "config", "init"]).needs_settings());
        assert!(parse(&["cuerag", "config", "show"]).needs_settings());
        assert!(parse(&["cuerag", "ask", "why?"]).needs_settings());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
