//! CLI definitions for Message Enhancer.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use enhancer_protocols::{MessageKind, Tone};

/// Message Enhancer CLI.
#[derive(Parser)]
#[command(name = "message-enhancer")]
#[command(about = "Inline text enhancement for web page inputs")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (defaults to the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Decide whether the content script would run on a URL
    Check {
        url: String,

        /// Comma-separated block list (overrides the configured one)
        #[arg(long)]
        blocked: Option<String>,
    },

    /// Inject into an HTML file and print the content-script state
    Scan {
        /// HTML file to load as the page
        html: PathBuf,

        /// URL the page is served from
        #[arg(long, default_value = "https://example.com/")]
        url: String,
    },

    /// Enhance a piece of text through the completion API
    Enhance {
        text: String,

        #[arg(long, default_value = "neutral")]
        tone: Tone,

        /// Message type (message, email)
        #[arg(long = "type", default_value = "message")]
        kind: MessageKind,

        /// Translate to English
        #[arg(long)]
        translate: bool,

        /// API key (overrides the configured one)
        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Validate the configuration file
    Validate,

    /// Run the full type, click, enhance and replace flow against an HTML file
    Simulate {
        /// HTML file to load as the page
        html: PathBuf,

        /// CSS selector of the field to type into
        #[arg(long)]
        field: String,

        /// Text the user types
        #[arg(long)]
        text: String,

        #[arg(long, default_value = "https://example.com/")]
        url: String,

        /// Echo the input instead of calling the completion API
        #[arg(long)]
        offline: bool,

        #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },
}
