//! Trawler CLI - configurable multi-source web crawler.
//!
//! Crawls named sources, extracts articles and pages with per-source CSS
//! selectors, and indexes the results into a document store. Events are
//! streamed to stdout as JSON lines.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod error;
mod output;

use error::ExitCode;
use output::JsonLinesHandler;
use trawler_config::{load_sources, CrawlerDefaults, SourceRegistry};
use trawler_events::{EventBus, EventBusConfig, LoggingEventHandler};
use trawler_fetch::HttpFetchDriver;
use trawler_index::{HttpIndexer, MemoryIndexer};
use trawler_jobs::{
    ArticleProcessor, CrawlService, JobCoordinator, PageProcessor, ProcessorRegistry,
};
use trawler_types::{ContentType, DocumentIndexer, JobState};

#[derive(Parser)]
#[command(name = "trawler")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Configurable multi-source web crawler", long_about = None)]
struct Cli {
    /// Path to the source configuration file
    #[arg(long, env = "CRAWLER_CONFIG", default_value = "sources.yaml")]
    config: String,

    /// Document store base URL; omitted means an in-memory store
    #[arg(long, env = "CRAWLER_INDEX_URL")]
    index_url: Option<String>,

    /// Verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a crawl job for a source
    ///
    /// Streams job events to stdout as JSON lines until the job reaches a
    /// terminal state. Ctrl-C stops the job gracefully.
    Crawl {
        /// Source name from the configuration file
        source: String,

        /// Content type the job targets
        #[arg(long, value_enum, default_value = "article")]
        content_type: JobContentType,
    },

    /// Inspect or stop jobs
    #[command(subcommand)]
    Job(JobCommands),

    /// Work with configured sources
    #[command(subcommand)]
    Sources(SourceCommands),
}

#[derive(Subcommand)]
enum JobCommands {
    /// Print a job's status as JSON
    Status { job_id: String },
    /// Stop a running job
    Stop { job_id: String },
}

#[derive(Subcommand)]
enum SourceCommands {
    /// List configured sources as JSON lines
    List,
}

/// Content types a job can be started for.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum JobContentType {
    Article,
    Page,
}

impl From<JobContentType> for ContentType {
    fn from(value: JobContentType) -> Self {
        match value {
            JobContentType::Article => ContentType::Article,
            JobContentType::Page => ContentType::Page,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    std::process::exit(match run(cli).await {
        Ok(()) => ExitCode::Success.as_i32(),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from_error(&err).as_i32()
        }
    });
}

async fn run(cli: Cli) -> Result<()> {
    let defaults = CrawlerDefaults::from_env().context("reading CRAWLER_* environment")?;

    match cli.command {
        Commands::Sources(SourceCommands::List) => {
            let sources = load_sources(&cli.config)
                .with_context(|| format!("loading sources from {}", cli.config))?;
            for source in sources {
                println!("{}", serde_json::to_string(&source)?);
            }
            Ok(())
        }
        Commands::Crawl {
            ref source,
            content_type,
        } => {
            let service = tokio::time::timeout(
                defaults.startup_timeout,
                build_service(&cli, defaults.clone()),
            )
            .await
            .context("startup timed out")??;
            crawl(&service, &defaults, &source, content_type.into()).await
        }
        Commands::Job(ref command) => {
            // job control addresses the coordinator of a running crawl;
            // a fresh process has no jobs to find
            let service = build_service(&cli, defaults.clone()).await?;
            match command {
                JobCommands::Status { job_id } => {
                    let status = service.coordinator().status(&job_id).await?;
                    println!("{}", serde_json::to_string(&status)?);
                    Ok(())
                }
                JobCommands::Stop { job_id } => {
                    let job = service.coordinator().stop(&job_id).await?;
                    println!("{}", serde_json::to_string(&job)?);
                    Ok(())
                }
            }
        }
    }
}

async fn build_service(cli: &Cli, defaults: CrawlerDefaults) -> Result<CrawlService> {
    let sources = Arc::new(SourceRegistry::new(
        load_sources(&cli.config)
            .with_context(|| format!("loading sources from {}", cli.config))?,
    ));

    let bus = Arc::new(EventBus::with_config(EventBusConfig {
        handler_timeout: defaults.operation_timeout,
    }));
    bus.subscribe(Arc::new(LoggingEventHandler::new())).await?;
    bus.subscribe(Arc::new(JsonLinesHandler::new())).await?;

    let indexer: Arc<dyn DocumentIndexer> = match &cli.index_url {
        Some(base_url) => Arc::new(HttpIndexer::new(base_url, defaults.operation_timeout)?),
        None => {
            debug!("No index URL configured, using in-memory store");
            Arc::new(MemoryIndexer::new())
        }
    };

    let registry = Arc::new(ProcessorRegistry::new());
    registry.register(Arc::new(ArticleProcessor::new(
        indexer.clone(),
        sources.clone(),
        defaults.clone(),
        "articles",
    )));
    registry.register(Arc::new(PageProcessor::new(
        indexer.clone(),
        sources.clone(),
        defaults.clone(),
        "pages",
    )));
    registry.start_all().await?;

    let coordinator = Arc::new(JobCoordinator::new(sources.clone(), bus));
    let driver = Arc::new(HttpFetchDriver::new(defaults.clone()));
    Ok(CrawlService::new(
        coordinator,
        sources,
        registry,
        driver,
        defaults,
    ))
}

async fn crawl(
    service: &CrawlService,
    defaults: &CrawlerDefaults,
    source: &str,
    content_type: ContentType,
) -> Result<()> {
    let (job, mut handle) = service.start_crawl(source, content_type).await?;

    tokio::select! {
        joined = &mut handle => {
            joined.context("crawl task panicked")?;
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("stopping job {}", job.id);
            service.coordinator().stop(&job.id).await?;
            if tokio::time::timeout(defaults.shutdown_timeout, handle)
                .await
                .is_err()
            {
                eprintln!("shutdown timeout elapsed before workers drained");
            }
        }
    }

    let final_job = service.coordinator().job(&job.id).await?;
    match final_job.state() {
        JobState::Completed | JobState::Stopped => Ok(()),
        JobState::Failed => anyhow::bail!(
            "job {} failed: {}",
            final_job.id,
            final_job
                .status
                .error_message
                .unwrap_or_else(|| "unknown error".to_string())
        ),
        other => anyhow::bail!("job {} ended in unexpected state {}", final_job.id, other),
    }
}
