use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rulebook-mcp")]
#[command(about = "Search and cross-reference a tabletop rulebook over MCP", long_about = None)]
pub struct Cli {
    /// Config file (default: $RULEBOOK_CONFIG, ./rulebook.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Rules directory, overriding the config file
    #[arg(long, global = true, env = "RULEBOOK_RULES_DIR")]
    pub rules_dir: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve MCP over stdio (default)
    Serve,
    /// Search the rules once and print the results
    Search {
        query: String,
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Resolve a reference key
    Resolve {
        key: String,
        #[arg(long)]
        json: bool,
    },
    /// Annotate text and print it as Markdown
    Annotate {
        text: String,
        #[arg(long)]
        references_only: bool,
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
