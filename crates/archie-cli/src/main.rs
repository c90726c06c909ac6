mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "archie",
    about = "Technical design workspace: scaffold docs, track feature status, export a single bundle",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .archie/)
    #[arg(long, global = true, env = "ARCHIE_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scaffold an archie project
    Init {
        /// Directory to scaffold (default: project root)
        path: Option<PathBuf>,
    },

    /// Show feature status, details and dependencies
    Status {
        /// One-screen summary
        #[arg(long, short = 'c')]
        compact: bool,

        /// List features by status, or show one feature when KEY is given
        #[arg(long, short = 'f', value_name = "KEY")]
        feature: Option<Option<String>>,

        /// Dependency tree and recommended design order
        #[arg(long, short = 'd')]
        deps: bool,
    },

    /// Merge the design into a single markdown file
    Export {
        /// Output file (default: ./archie-export-YYYY-MM-DD.md)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Skip the table of contents
        #[arg(long)]
        no_toc: bool,

        /// Skip the status statistics section
        #[arg(long)]
        no_stats: bool,

        /// Skip the mermaid dependency graph
        #[arg(long)]
        no_dep_graph: bool,

        /// Only export these features (repeatable)
        #[arg(long = "feature", value_name = "KEY")]
        features: Vec<String>,

        /// Only export these root documents, e.g. background.md or api (repeatable)
        #[arg(long = "root-doc", value_name = "NAME")]
        root_docs: Vec<String>,

        /// Include workflow/<feature>/ documents and diagrams
        #[arg(long)]
        workflows: bool,

        /// Include spec/<feature>.spec.md documents
        #[arg(long)]
        specs: bool,
    },

    /// Copy documents from another archie project
    Clone {
        /// Source project directory
        source: PathBuf,

        /// Target directory (default: project root)
        target: Option<PathBuf>,

        /// context, light, full or custom (default: context, or custom when --item is given)
        #[arg(long, short = 's')]
        strategy: Option<String>,

        /// Item to copy with the custom strategy, e.g. storage.md or api (repeatable)
        #[arg(long = "item", value_name = "NAME")]
        items: Vec<String>,
    },

    /// Inspect the project config
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = tracing::Level::WARN;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { path } => {
            let target = path.unwrap_or_else(|| root.clone());
            cmd::init::run(&target, cli.json)
        }
        Commands::Status {
            compact,
            feature,
            deps,
        } => {
            let view = cmd::status::View::from_flags(compact, feature, deps);
            cmd::status::run(&root, view, cli.json)
        }
        Commands::Export {
            output,
            no_toc,
            no_stats,
            no_dep_graph,
            features,
            root_docs,
            workflows,
            specs,
        } => cmd::export::run(
            &root,
            cmd::export::ExportArgs {
                output,
                no_toc,
                no_stats,
                no_dep_graph,
                features,
                root_docs,
                workflows,
                specs,
            },
            cli.json,
        ),
        Commands::Clone {
            source,
            target,
            strategy,
            items,
        } => {
            let target = target.unwrap_or_else(|| root.clone());
            cmd::clone::run(&source, &target, strategy.as_deref(), &items, cli.json)
        }
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
