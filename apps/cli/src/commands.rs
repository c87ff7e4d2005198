//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use docdistill_core::pipeline::{ProgressReporter, RunConfig, RunSummary};
use docdistill_shared::{
    AppConfig, CrawlConfig, ExtractConfig, FieldNaming, init_config, load_config, load_config_from,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use url::Url;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// docdistill: turn documentation sites into prompt/completion datasets.
#[derive(Parser)]
#[command(
    name = "docdistill",
    version,
    about = "Crawl a documentation site into page trees and prompt/completion datasets.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file to load instead of ~/.docdistill/docdistill.toml.
    #[arg(long = "config", global = true, env = "DOCDISTILL_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Key naming of the page-tree JSON files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum NamingArg {
    Prefixed,
    Plain,
}

impl From<NamingArg> for FieldNaming {
    fn from(arg: NamingArg) -> Self {
        match arg {
            NamingArg::Prefixed => FieldNaming::Prefixed,
            NamingArg::Plain => FieldNaming::Plain,
        }
    }
}

/// Flags of the `crawl` subcommand.
#[derive(clap::Args, Debug, Default)]
pub(crate) struct CrawlArgs {
    /// Root URL of the documentation site.
    pub url: String,

    /// Output directory (defaults to `[defaults].output_dir`).
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Topic label for every prompt (defaults to the URL host).
    #[arg(short, long)]
    pub topic: Option<String>,

    /// Site layout: auto, gitbook, or generic.
    #[arg(short, long)]
    pub layout: Option<String>,

    /// Key naming of the page-tree JSON.
    #[arg(long, value_enum)]
    pub field_naming: Option<NamingArg>,

    /// Extra attempts after a failed fetch.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Crawl a documentation site and write its datasets.
    Crawl(CrawlArgs),

    /// Rebuild data.jsonl and data.csv from an existing data.json.
    Regenerate {
        /// Output directory of a previous crawl.
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "docdistill=info",
        1 => "docdistill=debug",
        _ => "docdistill=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_file;
    match cli.command {
        Command::Crawl(args) => cmd_crawl(config_path.as_deref(), &args).await,
        Command::Regenerate { dir } => cmd_regenerate(&dir),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path.as_deref()),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    })
}

/// Merge the file config with `crawl` flags; flags win.
fn build_run_config(app: &AppConfig, args: &CrawlArgs) -> Result<RunConfig> {
    let url = Url::parse(&args.url).map_err(|e| eyre!("invalid URL '{}': {e}", args.url))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(eyre!("unsupported URL scheme '{}': expected http or https", url.scheme()));
    }

    let mut crawl = CrawlConfig::from(app);
    if let Some(retries) = args.retries {
        crawl.retries = retries;
    }
    if let Some(timeout) = args.timeout {
        crawl.timeout_secs = timeout;
    }

    let mut extract = ExtractConfig::from(app);
    if let Some(topic) = &args.topic {
        extract.topic = Some(topic.clone());
    }
    if let Some(layout) = &args.layout {
        extract.layout = layout.clone();
    }
    if let Some(naming) = args.field_naming {
        extract.field_naming = naming.into();
    }

    let output_dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&app.defaults.output_dir));

    Ok(RunConfig {
        url,
        output_dir,
        crawl,
        extract,
        tool_version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_crawl(config_path: Option<&Path>, args: &CrawlArgs) -> Result<()> {
    let app = resolve_config(config_path)?;
    let config = build_run_config(&app, args)?;

    info!(
        url = %config.url,
        out = %config.output_dir.display(),
        layout = %config.extract.layout,
        "crawling documentation site"
    );

    let reporter = CliProgress::new();
    let summary = docdistill_core::pipeline::run(&config, &reporter).await?;

    println!();
    println!("  Dataset written successfully!");
    println!("  Layout:     {}", summary.layout);
    println!("  Discovered: {}", summary.discovered);
    println!("  Pages:      {}", summary.generated_files.len());
    println!("  Records:    {}", summary.records);
    println!("  Skipped:    {}", summary.skipped.len());
    for skipped in &summary.skipped {
        println!("    - {} ({})", skipped.url, skipped.reason);
    }
    println!("  Path:       {}", summary.output_dir.display());
    println!("  Time:       {:.1}s", summary.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_regenerate(dir: &Path) -> Result<()> {
    info!(dir = %dir.display(), "regenerating records");
    let summary = docdistill_core::pipeline::regenerate(dir)?;

    println!();
    println!("  Records regenerated!");
    println!("  Pages:   {}", summary.pages);
    println!("  Records: {}", summary.records);
    println!("  Path:    {}", summary.output_dir.display());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_built(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Building [{current}/{total}] {url}"));
    }

    fn done(&self, _summary: &RunSummary) {
        self.spinner.finish_and_clear();
    }
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
    fn crawl_flags_parse() {
        let cli = Cli::parse_from([
            "docdistill",
            "-vv",
            "crawl",
            "https://whitepaper.axieinfinity.com/",
            "--out",
            "axie",
            "--field-naming",
            "plain",
            "--retries",
            "2",
        ]);
        assert_eq!(cli.verbose, 2);
        let Command::Crawl(args) = cli.command else {
            panic!("expected crawl");
        };
        assert_eq!(args.out, Some(PathBuf::from("axie")));
        assert_eq!(args.field_naming, Some(NamingArg::Plain));
        assert_eq!(args.retries, Some(2));
    }

    #[test]
    fn flags_override_file_config() {
        let mut app = AppConfig::default();
        app.defaults.topic = Some("From file".into());
        app.fetch.retries = 1;

        let args = CrawlArgs {
            url: "https://whitepaper.axieinfinity.com/".into(),
            topic: Some("Axie Infinity".into()),
            layout: Some("gitbook".into()),
            field_naming: Some(NamingArg::Plain),
            ..CrawlArgs::default()
        };
        let config = build_run_config(&app, &args).unwrap();

        assert_eq!(config.topic(), "Axie Infinity");
        assert_eq!(config.extract.layout, "gitbook");
        assert_eq!(config.extract.field_naming, FieldNaming::Plain);
        assert_eq!(config.crawl.retries, 1);
        assert_eq!(config.output_dir, PathBuf::from("data"));
    }

    #[test]
    fn rejects_non_http_urls() {
        let args = CrawlArgs {
            url: "ftp://example.com/docs".into(),
            ..CrawlArgs::default()
        };
        assert!(build_run_config(&AppConfig::default(), &args).is_err());

        let args = CrawlArgs {
            url: "not a url".into(),
            ..CrawlArgs::default()
        };
        assert!(build_run_config(&AppConfig::default(), &args).is_err());
    }
}
