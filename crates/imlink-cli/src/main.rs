//! imlink - command-line front end for the link manager.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Env var read before `RUST_LOG` for the log filter.
const LOG_ENV: &str = "IMLINK_LOG";

#[derive(Parser, Debug)]
#[command(name = "imlink", version, about = "Save, tag and search links")]
pub struct Cli {
    /// Config file (default: <config dir>/imlink/config.toml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file; overrides the config's data dir and app name.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Debug logging.
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Save a new link.
    Add(AddArgs),

    /// Change fields of a saved link.
    Update(UpdateArgs),

    /// List every saved link.
    #[command(alias = "ls")]
    List,

    /// Delete a link by id.
    #[command(alias = "rm")]
    Delete { id: i64 },

    /// Search by text and tags.
    Search(SearchArgs),

    /// Manage tags.
    #[command(subcommand)]
    Tag(TagCommand),

    /// Write every link and tag to a JSON file.
    Export {
        /// Output file (default: utility-links-export.json).
        #[arg(long, short = 'o', value_name = "PATH")]
        out: Option<PathBuf>,
    },

    /// Load links and tags from a JSON export.
    Import { file: PathBuf },

    /// Read a browser bookmark export.
    Bookmarks(BookmarksArgs),

    /// Show the pastel color for a hex value.
    Color {
        hex: String,

        /// Also print a darker variant (lightness multiplier).
        #[arg(long, value_name = "FACTOR", num_args = 0..=1, default_missing_value = "0.5")]
        darker: Option<f64>,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    pub url: String,

    #[arg(long, short = 't')]
    pub title: String,

    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Swatch color as `#RRGGBB` (stored pastelized).
    #[arg(long, short = 'c')]
    pub color: Option<String>,

    /// Tag id or title (repeatable).
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub id: i64,

    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'u')]
    pub url: Option<String>,

    #[arg(long, short = 'c')]
    pub color: Option<String>,

    /// Replace the tag list (repeatable). Use `--clear-tags` to remove all.
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Matched case-insensitively against title and description.
    #[arg(default_value = "")]
    pub query: String,

    /// Required tag id or title (repeatable; all must match).
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum TagCommand {
    /// Create a tag.
    Add { title: String },

    /// Rename a tag.
    Rename { id: String, title: String },

    /// Delete a tag. Links keep their reference to it.
    #[command(alias = "rm")]
    Delete { id: String },

    /// List every tag.
    #[command(alias = "ls")]
    List,
}

#[derive(Args, Debug)]
pub struct BookmarksArgs {
    /// Bookmark HTML file exported by a browser.
    pub file: PathBuf,

    /// Save every bookmark as a link instead of listing them.
    #[arg(long)]
    pub save: bool,

    /// Color applied to saved links (`#RRGGBB`).
    #[arg(long, short = 'c', requires = "save")]
    pub color: Option<String>,

    /// Description applied to saved links.
    #[arg(long, short = 'd', requires = "save")]
    pub description: Option<String>,

    /// Tag applied to saved links (repeatable).
    #[arg(long = "tag", value_name = "TAG", requires = "save")]
    pub tags: Vec<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = commands::run(cli) {
        tracing::error!("{}", e);
        if e.is_duplicate_url() {
            eprintln!("warning: {}", e);
        } else {
            eprintln!("error: {}. Check your data and try again.", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = if verbose > 0 {
        EnvFilter::new("debug")
    } else {
        std::env::var(LOG_ENV)
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_search_with_repeated_tags() {
        let cli = Cli::try_parse_from(["imlink", "search", "rust", "--tag", "a", "--tag", "b"])
            .unwrap();
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "rust");
                assert_eq!(args.tags, vec!["a", "b"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["imlink", "list", "--db", "x.sqlite3", "-vv"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("x.sqlite3")));
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn bookmark_options_require_save() {
        assert!(Cli::try_parse_from(["imlink", "bookmarks", "b.html", "--tag", "x"]).is_err());
        assert!(
            Cli::try_parse_from(["imlink", "bookmarks", "b.html", "--save", "--tag", "x"]).is_ok()
        );
    }

    #[test]
    fn darker_defaults_to_half() {
        let cli = Cli::try_parse_from(["imlink", "color", "#ff0000", "--darker"]).unwrap();
        match cli.command {
            Commands::Color { darker, .. } => assert_eq!(darker, Some(0.5)),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
