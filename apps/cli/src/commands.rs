//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use notegarden_core::{
    AliasOutcome, BuildPaths, BuildResult, ProgressReporter, RouteManifestWriter, RouteTable,
    build_site, compute_routes,
};
use notegarden_ingest::{
    FetchOptions, ensure_content_dir, ingest_graph_export, resolve_content_dir, scan_local_dir,
};
use notegarden_shared::{
    ContentSourceConfig, GardenFile, MemorySnapshot, NodeKind, default_config_path,
    init_config, load_config, load_config_from,
};
use notegarden_storage::NodeStore;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notegarden: build a routable digital garden from notes and graph exports.
#[derive(Parser)]
#[command(
    name = "notegarden",
    version,
    about = "Turn a notes directory and a knowledge-graph export into a routable site.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Project directory (holds garden.toml, the theme and the build output).
    #[arg(long, default_value = ".", global = true, env = "NOTEGARDEN_PROJECT_DIR")]
    pub project_dir: PathBuf,

    /// Config file to use instead of <project-dir>/garden.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Provision artifacts, build the route table and write routes.json.
    Build,

    /// Load the configured sources into the node store.
    Ingest {
        /// Graph export file or URL (defaults to the configured remote_graph).
        #[arg(long)]
        graph_export: Option<String>,
    },

    /// Print the route table without touching generated artifacts.
    Routes {
        /// Read sources directly instead of the node store.
        #[arg(long)]
        dry_run: bool,

        /// Graph export file or URL for --dry-run (defaults to the configured remote_graph).
        #[arg(long, requires = "dry_run")]
        graph_export: Option<String>,

        /// Print the table as JSON.
        #[arg(long)]
        json: bool,
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
        0 => "notegarden=info",
        1 => "notegarden=debug",
        _ => "notegarden=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        Command::Build => cmd_build(&Project::load(&cli)?).await,
        Command::Ingest { graph_export } => {
            cmd_ingest(&Project::load(&cli)?, graph_export.as_deref()).await
        }
        Command::Routes {
            dry_run,
            graph_export,
            json,
        } => cmd_routes(&Project::load(&cli)?, *dry_run, graph_export.as_deref(), *json).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(&cli),
            ConfigAction::Show => cmd_config_show(&Project::load(&cli)?),
        },
    }
}

/// The loaded config file plus the directory relative paths resolve against.
struct Project {
    dir: PathBuf,
    file: GardenFile,
}

impl Project {
    fn load(cli: &Cli) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => load_config(&cli.project_dir)?,
        };
        Ok(Self {
            dir: cli.project_dir.clone(),
            file,
        })
    }

    /// Freeze the `[garden]` table. Called once per command.
    fn content_config(&self) -> Result<ContentSourceConfig> {
        Ok(ContentSourceConfig::freeze(&self.file.garden)?)
    }

    fn store_path(&self) -> PathBuf {
        self.file.build.resolve(&self.dir).store_path
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(project: &Project) -> Result<()> {
    let config = project.content_config()?;
    let resolved = project.file.build.resolve(&project.dir);
    let paths = BuildPaths::from_config(&project.dir, &project.file.build);
    let mut writer = RouteManifestWriter::new(&resolved.output_dir);

    info!(project = %project.dir.display(), "building garden");

    // Open the store before the spinner starts so a missing store reports cleanly.
    let store = if config.active_sources().is_empty() {
        warn!("no content source configured, building an empty site");
        None
    } else {
        Some(NodeStore::open_readonly(&resolved.store_path).await?)
    };

    let reporter = CliProgress::new();
    let outcome = match &store {
        Some(store) => build_site(&config, &paths, store, &mut writer, &reporter).await,
        None => {
            let empty = MemorySnapshot::default();
            build_site(&config, &paths, &empty, &mut writer, &reporter).await
        }
    };
    let result = outcome.inspect_err(|_| reporter.abandon())?;

    println!();
    println!("  Garden built successfully!");
    println!("  Build:      {}", result.build_id);
    println!("  Pages:      {}", writer.pages().len());
    print_route_counts(&result.table);
    println!("  Root alias: {}", describe_alias(&result.table.alias));
    println!(
        "  Artifacts:  {} copied, {} removed",
        result.fragments.copied() + result.templates.copied(),
        result.fragments.removed() + result.templates.removed()
    );
    println!("  Manifest:   {}", writer.manifest_path().display());
    println!("  Time:       {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

async fn cmd_ingest(project: &Project, graph_export: Option<&str>) -> Result<()> {
    let config = project.content_config()?;
    let store = NodeStore::open(&project.store_path()).await?;

    if let Some(origin) = config.local_content_dir() {
        let dir = resolve_content_dir(&project.dir, origin);
        ensure_content_dir(&dir)?;
        let nodes = scan_local_dir(&dir, origin)?;
        let stored = store
            .replace_nodes(NodeKind::LocalFile, origin, &nodes)
            .await?;
        println!("  Local files:   {stored} from {}", dir.display());
    }

    match (config.remote_graph_endpoint(), graph_export) {
        (Some(origin), location) => {
            let location = location.unwrap_or(origin);
            let export = ingest_graph_export(location, origin, &FetchOptions::default()).await?;
            for kind in [NodeKind::RemotePage, NodeKind::RemoteBlock] {
                store.replace_nodes(kind, origin, export.nodes(kind)).await?;
            }
            println!(
                "  Remote graph:  {} pages, {} blocks from {location}",
                export.pages.len(),
                export.blocks.len()
            );
        }
        (None, Some(_)) => {
            return Err(eyre!(
                "--graph-export given but [garden].remote_graph is not set"
            ));
        }
        (None, None) => {}
    }

    if config.active_sources().is_empty() {
        println!("  No content source configured; nothing ingested.");
    }

    for count in store.origin_counts().await? {
        info!(kind = %count.kind, origin = %count.origin, count = count.count, "stored nodes");
    }

    Ok(())
}

async fn cmd_routes(
    project: &Project,
    dry_run: bool,
    graph_export: Option<&str>,
    json: bool,
) -> Result<()> {
    let config = project.content_config()?;

    let table = if dry_run {
        let snapshot = read_sources(project, &config, graph_export).await?;
        compute_routes(&snapshot, &config).await?
    } else if config.active_sources().is_empty() {
        compute_routes(&MemorySnapshot::default(), &config).await?
    } else {
        let store = NodeStore::open_readonly(&project.store_path()).await?;
        compute_routes(&store, &config).await?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    for route in &table.routes {
        let alias = if route.is_alias { "  (root alias)" } else { "" };
        println!(
            "  {:<13} {}  ->  {}{alias}",
            route.template_kind, route.path, route.context_id
        );
    }
    println!();
    print_route_counts(&table);
    println!("  Root alias: {}", describe_alias(&table.alias));
    Ok(())
}

/// Build an in-memory snapshot straight from the configured sources.
async fn read_sources(
    project: &Project,
    config: &ContentSourceConfig,
    graph_export: Option<&str>,
) -> Result<MemorySnapshot> {
    let mut snapshot = MemorySnapshot::default();

    if let Some(origin) = config.local_content_dir() {
        let dir = resolve_content_dir(&project.dir, origin);
        if dir.is_dir() {
            for node in scan_local_dir(&dir, origin)? {
                snapshot.push(node);
            }
        } else {
            warn!(path = %dir.display(), "content directory does not exist yet");
        }
    }

    if let Some(origin) = config.remote_graph_endpoint() {
        let location = graph_export.unwrap_or(origin);
        let export = ingest_graph_export(location, origin, &FetchOptions::default()).await?;
        for node in export.pages.into_iter().chain(export.blocks) {
            snapshot.push(node);
        }
    }

    if snapshot.is_empty() {
        warn!("no content found in the configured sources");
    } else {
        info!(nodes = snapshot.len(), "sources read for dry run");
    }

    Ok(snapshot)
}

fn cmd_config_init(cli: &Cli) -> Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| default_config_path(&cli.project_dir));
    let path = init_config(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(project: &Project) -> Result<()> {
    let toml_str = toml::to_string_pretty(&project.file)?;
    println!("{toml_str}");

    let frozen = project.content_config()?;
    let active = frozen.active_sources();
    println!("# active sources: local={} remote={}", active.local, active.remote);
    Ok(())
}

// ---------------------------------------------------------------------------
// Output helpers
// ---------------------------------------------------------------------------

fn print_route_counts(table: &RouteTable) {
    println!("  Routes:     {}", table.len());
    for kind in NodeKind::ALL {
        println!("    {:<12} {}", kind, table.count_by_kind(kind));
    }
    if table.excluded > 0 {
        println!("  Excluded:   {}", table.excluded);
    }
    if table.duplicates > 0 {
        println!("  Duplicates: {}", table.duplicates);
    }
}

fn describe_alias(alias: &AliasOutcome) -> String {
    match alias {
        AliasOutcome::NotConfigured => "not configured".to_string(),
        AliasOutcome::Resolved { slug, context_id } => format!("{slug} ({context_id})"),
        AliasOutcome::Missed { slug } => format!("{slug} not found"),
    }
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
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    /// Stop the spinner after a failed build, keeping the last message.
    fn abandon(&self) {
        self.spinner.abandon();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_created(&self, path: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Creating pages [{current}/{total}] {path}"));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "notegarden",
            "routes",
            "--dry-run",
            "--json",
            "--project-dir",
            "site",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.project_dir, Path::new("site"));
        assert_eq!(cli.verbose, 2);
        assert!(matches!(
            cli.command,
            Command::Routes {
                dry_run: true,
                json: true,
                graph_export: None
            }
        ));
    }

    #[test]
    fn graph_export_for_routes_requires_dry_run() {
        let parsed = Cli::try_parse_from(["notegarden", "routes", "--graph-export", "x.json"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn alias_descriptions() {
        assert_eq!(describe_alias(&AliasOutcome::NotConfigured), "not configured");
        assert_eq!(
            describe_alias(&AliasOutcome::Missed {
                slug: "/home".into()
            }),
            "/home not found"
        );
    }
}
