use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use folio_engine::{ListKind, ListStyle};

#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Inspect and edit folio JSON documents")]
#[command(version)]
pub struct Cli {
    /// Config file to use instead of ~/.config/folio/config.toml
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the document as HTML
    Render {
        #[command(flatten)]
        target: Target,
    },
    /// Report whether wrapping the selection in a list would apply, without editing
    Probe {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Wrap the selection in a list and print the result
    Wrap {
        #[command(flatten)]
        target: Target,
        #[command(flatten)]
        list: ListArgs,
        /// Print the edited document as JSON instead of HTML
        #[arg(long)]
        json: bool,
    },
    /// Type text at the selection, running input rules, and print the result
    Type {
        #[command(flatten)]
        target: Target,
        /// Text to type; each character is typed separately
        #[arg(long, short = 't')]
        text: String,
    },
    /// List toolbar items and whether each applies to the selection
    Menu {
        #[command(flatten)]
        target: Target,
    },
}

/// The document and the selection a command works on.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// JSON document; defaults to `default_document` from the config
    pub document: Option<PathBuf>,

    /// Selection start; defaults to the first text position
    #[arg(long)]
    pub from: Option<usize>,

    /// Selection end; defaults to `--from`
    #[arg(long)]
    pub to: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value_t = KindArg::Ordered)]
    pub kind: KindArg,

    /// Numbering or marker style, by keyword (`upper-roman`) or code (`I`)
    #[arg(long)]
    pub style: Option<ListStyle>,

    /// First number of an ordered list
    #[arg(long, default_value_t = 1)]
    pub start: u32,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Ordered,
    Bullet,
}

impl From<KindArg> for ListKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ordered => ListKind::Ordered,
            KindArg::Bullet => ListKind::Bullet,
        }
    }
}
