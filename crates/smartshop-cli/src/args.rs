use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use smartshop_core::ViewFilter;

#[derive(Parser)]
#[command(name = "smartshop")]
#[command(about = "Shopping list with AI-assisted item categorization")]
#[command(version)]
pub struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Base directory (default: ~/.smartshop)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add comma-separated items (no classification, category "General")
    Add {
        /// Items, e.g. "Milk, Eggs, Bread"
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Split and categorize free text (a list, a sentence, or a recipe name)
    Smart {
        /// Text to classify; use "-" to read from stdin
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Show the list grouped by category
    #[command(alias = "ls")]
    List {
        /// Hide bought items (same as --view pending)
        #[arg(short, long, conflicts_with = "view")]
        pending: bool,

        /// Which items to show: all, pending
        #[arg(long, default_value_t = ViewFilter::All)]
        view: ViewFilter,

        /// Print the grouped projection as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark an item bought / not bought
    Toggle {
        /// Item id or unique id prefix
        id: String,
    },

    /// Delete an item
    #[command(alias = "rm")]
    Delete {
        /// Item id or unique id prefix
        id: String,
    },

    /// Remove all bought items
    ClearCompleted {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete the entire list
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g., classifier.provider)
        key: String,
    },

    /// Set a config value
    Set {
        /// Config key (e.g., classifier.provider)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all config values
    List,

    /// Show config file path
    Path,

    /// Create config file with default template
    Init,
}
