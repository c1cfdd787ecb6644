use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod ui;

pub(crate) const OUTPUT_SCHEMA_VERSION: u32 = locsync_domain::SCHEMA_VERSION;

#[derive(Parser)]
#[command(
    name = "locsync",
    version,
    about = "Find and fix divergent translations of the same source text across XLIFF files"
)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Only print command payloads and errors
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every translation unit under a directory
    Scan {
        #[arg(short, long)]
        root: PathBuf,
        #[arg(long, default_value = "text", value_parser = ["text", "csv", "json"])]
        format: String,
        /// Write the listing to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Report sources translated in more than one way, with a consistency score
    Check {
        #[arg(short, long)]
        root: PathBuf,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        /// Exit with an error when any inconsistency is found
        #[arg(long, default_value_t = false)]
        strict: bool,
    },

    /// Apply one canonical translation to every unit sharing a source
    Resolve {
        #[arg(short, long)]
        root: PathBuf,
        /// Source text identifying the group (compared after normalization)
        #[arg(long)]
        source: String,
        #[arg(long, conflicts_with = "pick", required_unless_present = "pick")]
        canonical: Option<String>,
        /// 1-based index of an existing variation, as listed by `check`
        #[arg(long)]
        pick: Option<usize>,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Ask the configured recommendation service for a canonical translation
    Suggest {
        #[arg(short, long)]
        root: PathBuf,
        #[arg(long)]
        source: String,
        /// Target language passed to the service
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        timeout_secs: Option<u64>,
        /// Apply the recommendation when it arrives
        #[arg(long, default_value_t = false)]
        apply: bool,
        #[arg(long, default_value_t = false)]
        backup: bool,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Find units whose source or target contains a text
    Search {
        #[arg(short, long)]
        root: PathBuf,
        #[arg(short, long)]
        query: String,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Replace the source text of one unit, addressed by id
    SetSource {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        id: String,
        #[arg(long)]
        text: String,
        #[arg(long, default_value_t = false)]
        backup: bool,
    },

    /// Lint documents for structural and encoding problems
    XmlHealth {
        #[arg(short, long)]
        root: PathBuf,
        #[arg(long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
        #[arg(long, default_value_t = false)]
        strict: bool,
        /// Comma-separated categories to keep
        #[arg(long)]
        only: Vec<String>,
        /// Comma-separated categories to drop
        #[arg(long)]
        except: Vec<String>,
    },

    /// Dump JSON Schemas of the report formats
    Schema {
        #[arg(long, default_value = "")]
        out_dir: PathBuf,
    },
}

trait Runnable {
    fn run(self, use_color: bool) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, use_color: bool) -> Result<()> {
        let cmd_name = command_name(&self);
        info!(event = "command_start", command = cmd_name);

        let result = match self {
            Commands::Scan { root, format, out } => commands::scan::run_scan(root, format, out),
            Commands::Check {
                root,
                format,
                strict,
            } => commands::check::run_check(root, format, strict, use_color),
            Commands::Resolve {
                root,
                source,
                canonical,
                pick,
                dry_run,
                backup,
                format,
            } => commands::resolve::run_resolve(root, source, canonical, pick, dry_run, backup, format),
            Commands::Suggest {
                root,
                source,
                lang,
                timeout_secs,
                apply,
                backup,
                format,
            } => commands::suggest::run_suggest(root, source, lang, timeout_secs, apply, backup, format),
            Commands::Search {
                root,
                query,
                format,
            } => commands::search::run_search(root, query, format, use_color),
            Commands::SetSource {
                file,
                id,
                text,
                backup,
            } => commands::set_source::run_set_source(file, id, text, backup),
            Commands::XmlHealth {
                root,
                format,
                strict,
                only,
                except,
            } => commands::xml_health::run_xml_health(root, format, strict, only, except),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        };

        match &result {
            Ok(_) => info!(event = "command_finished", command = cmd_name),
            Err(e) => error!(event = "command_failed", command = cmd_name, error = ?e),
        }

        result
    }
}

fn command_name(cmd: &Commands) -> &'static str {
    match cmd {
        Commands::Scan { .. } => "scan",
        Commands::Check { .. } => "check",
        Commands::Resolve { .. } => "resolve",
        Commands::Suggest { .. } => "suggest",
        Commands::Search { .. } => "search",
        Commands::SetSource { .. } => "set-source",
        Commands::XmlHealth { .. } => "xml-health",
        Commands::Schema { .. } => "schema",
    }
}

fn init_tracing(quiet: bool) -> WorkerGuard {
    let file_appender = rolling::daily("logs", "locsync.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    ui::set_quiet(cli.quiet);
    let _guard = init_tracing(cli.quiet);

    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();

    cli.cmd.run(use_color)
}
