use std::path::{Path, PathBuf};

use anyhow::Context;
use bump::config::{DOCKER_HUB_BASE_URL, NPM_REGISTRY_BASE_URL, ResolveOptions};
use bump::output::{OutputFormat, OutputOptions, render};
use bump::resolve::{Resolver, prepare_specs};
use bump::spec::document::{load_defaults_document, load_spec_document, merge_spec_documents};
use bump::version::dispatch::Dispatcher;
use bump::version::upstreams::create_default_upstreams;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bump")]
#[command(version, about = "Resolve component versions from upstream registries")]
struct Cli {
    /// Spec documents, merged left to right
    #[arg(required = true, value_name = "SPEC")]
    specs: Vec<PathBuf>,

    /// Defaults documents, later ones win (repeatable)
    #[arg(short, long = "defaults", value_name = "FILE")]
    defaults: Vec<PathBuf>,

    /// Output format: dotenv, json or yaml
    #[arg(short, long, default_value = "dotenv")]
    format: OutputFormat,

    /// Print every candidate version, oldest first
    #[arg(short, long)]
    enumerate: bool,

    /// Print full versions including the repository
    #[arg(long)]
    full_version: bool,

    /// Log failed queries and unresolved components instead of failing
    #[arg(long)]
    allow_unresolved: bool,

    #[arg(long, default_value = DOCKER_HUB_BASE_URL, value_name = "URL")]
    docker_hub_url: String,

    /// Registry used for npm specs without `npm-registry`
    #[arg(long, default_value = NPM_REGISTRY_BASE_URL, value_name = "URL")]
    npm_registry: String,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Write JSON logs to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,
}

fn init_logging(level: &str, log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let defaults = cli
        .defaults
        .iter()
        .map(|path| load_defaults_document(path))
        .collect::<Result<Vec<_>, _>>()?;
    let documents = cli
        .specs
        .iter()
        .map(|path| load_spec_document(path))
        .collect::<Result<Vec<_>, _>>()?;
    let specs = prepare_specs(&defaults, &merge_spec_documents(documents))?;

    let options = ResolveOptions {
        strict: !cli.allow_unresolved,
        docker_hub_url: cli.docker_hub_url,
        npm_registry_url: cli.npm_registry,
    };
    let dispatcher = Dispatcher::new(create_default_upstreams(&options));
    let resolutions = Resolver::new(dispatcher, options).resolve(&specs).await?;

    let output = render(
        &resolutions,
        cli.format,
        OutputOptions {
            enumerate: cli.enumerate,
            full_version: cli.full_version,
        },
    )?;
    print!("{}", output);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(&cli.log_level, cli.log_file.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
