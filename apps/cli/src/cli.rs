//! CLI definitions for salute.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// salute CLI.
#[derive(Parser)]
#[command(name = "salute")]
#[command(about = "Copy personalized holiday greetings for your contacts")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Show or edit the greeting template
    Template {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// List the first names found in an HTML page
    Extract {
        /// Saved HTML page
        html_file: PathBuf,
    },

    /// Copy the greeting for one name
    Pick {
        /// First name; defaults to the first name found on --page
        name: Option<String>,

        /// Saved HTML page, used for the name and the text direction
        #[arg(long)]
        page: Option<PathBuf>,

        /// Treat the page as right-to-left
        #[arg(long)]
        rtl: bool,
    },

    /// Open several pages, edit the template and show every page pick it up
    Demo {
        /// Number of pages to open
        #[arg(long, default_value_t = 3)]
        pages: usize,

        /// Template to broadcast
        #[arg(long, default_value = "Season's greetings, <name>!")]
        template: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum TemplateAction {
    /// Print the current template
    Show,

    /// Replace the template
    Set {
        /// New template; use <name> where the name goes
        text: String,
    },
}
