use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use version_recommender::config::{DEFAULT_CONFIG_FILE, RecommenderConfig};
use version_recommender::logging::{self, LogFormat};
use version_recommender::publish;
use version_recommender::recommend::error::RecommendError;
use version_recommender::recommend::registries::MavenMetadataRegistry;
use version_recommender::recommend::registry::VersionRegistry;
use version_recommender::recommend::repository::LocalRepository;
use version_recommender::recommend::resolver::Recommender;
use version_recommender::recommend::update::{UpdateEngine, UpdateOutcome};

#[derive(Parser)]
#[command(name = "version-recommender")]
#[command(version, about = "Recommended dependency versions from Ivy, Maven BOM and properties sources")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Log record format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the recommended version of a coordinate
    Lookup { group: String, name: String },
    /// Set a working version (from the argument or the configured version parameter)
    Set {
        /// Apply to every provider; the first argument is then the version
        #[arg(long)]
        all: bool,
        #[arg(required_unless_present = "all")]
        provider: Option<String>,
        version: Option<String>,
    },
    /// Set a local (not release-ready) working version
    SetLocal {
        /// Apply to every provider; the first argument is then the version
        #[arg(long)]
        all: bool,
        #[arg(required_unless_present = "all")]
        provider: Option<String>,
        version: Option<String>,
    },
    /// Drop working versions
    Reset { provider: Option<String> },
    /// Persist working versions
    Store { provider: Option<String> },
    /// Advance versions to the newest published candidates
    Update { provider: Option<String> },
    /// Show providers and their override state
    Show,
    /// Fill in recommended versions of an Ivy or Maven descriptor
    Patch {
        descriptor: PathBuf,
        /// Output file, defaults to rewriting the descriptor in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log_format, cli.log_file.as_deref())?;

    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let config = RecommenderConfig::load(&config_path)
        .with_context(|| format!("Failed to load {:?}", config_path))?;
    let project_dir = config_path.parent().unwrap_or_else(|| Path::new("."));

    let repository = Arc::new(LocalRepository::new(
        config.repository.root.clone(),
        config.repository.layout,
    ));
    let mut recommender = Recommender::from_config(&config, project_dir, repository)?;
    for failure in recommender.initialize() {
        warn!("{}", failure);
    }

    match cli.command {
        Command::Lookup { group, name } => {
            let version = recommender.lookup(&group, &name)?;
            println!("{}", version);
            Ok(())
        }
        Command::Set {
            all,
            provider,
            version,
        } => {
            if all {
                let version = version.or(provider);
                report(recommender.set_all(version.as_deref()))
            } else {
                let provider = provider.unwrap_or_default();
                let version = recommender.set(&provider, version.as_deref())?;
                println!("{}: {}", provider, version);
                Ok(())
            }
        }
        Command::SetLocal {
            all,
            provider,
            version,
        } => {
            if all {
                let version = version.or(provider);
                report(recommender.set_local_all(version.as_deref()))
            } else {
                let provider = provider.unwrap_or_default();
                let version = recommender.set_local(&provider, version.as_deref())?;
                println!("{}: {}", provider, version);
                Ok(())
            }
        }
        Command::Reset { provider } => {
            recommender.reset(provider.as_deref())?;
            Ok(())
        }
        Command::Store { provider } => {
            let written = match provider {
                Some(name) => vec![recommender.store(&name)?],
                None => recommender.store_all()?,
            };
            for file in written {
                println!("{}", file.display());
            }
            Ok(())
        }
        Command::Update { provider } => {
            let registry: Box<dyn VersionRegistry> = match &config.metadata_url {
                Some(url) => Box::new(MavenMetadataRegistry::new(url)),
                None => Box::new(LocalRepository::new(
                    config.repository.root.clone(),
                    config.repository.layout,
                )),
            };
            let engine = UpdateEngine::new(registry.as_ref());
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            let results = runtime.block_on(async {
                match provider {
                    Some(name) => {
                        let result = engine.update(&mut recommender, &name).await;
                        vec![(name, result)]
                    }
                    None => engine.update_all(&mut recommender).await,
                }
            });
            report(results.into_iter().map(|(name, result)| {
                let result = result.map(|outcome| match outcome {
                    UpdateOutcome::Updated { from, to } => format!("{} -> {}", from, to),
                    UpdateOutcome::Unchanged { version } => format!("{} (unchanged)", version),
                    UpdateOutcome::Excluded => "excluded".to_string(),
                    UpdateOutcome::NotEligible => "not eligible".to_string(),
                });
                (name, result)
            }))
        }
        Command::Show => {
            for provider in recommender.providers() {
                let entries = provider
                    .version_map(recommender.repository())
                    .map(|map| format!("{} entries", map.len()))
                    .unwrap_or_else(|e| format!("error: {}", e));
                println!(
                    "{} ({}): {} [{:?}] {}",
                    provider.name(),
                    provider.short_kind(),
                    provider.current_version().unwrap_or("-"),
                    provider.override_state(),
                    entries
                );
            }
            Ok(())
        }
        Command::Patch { descriptor, output } => {
            let content = std::fs::read_to_string(&descriptor)
                .with_context(|| format!("Failed to read {:?}", descriptor))?;
            let patched = publish::patch_descriptor(&content, |group, name| {
                recommender.lookup(group, name).ok()
            })?;
            let output = output.unwrap_or(descriptor);
            std::fs::write(&output, patched.content)
                .with_context(|| format!("Failed to write {:?}", output))?;
            println!(
                "Patched {} dependencies in {} ({} warnings)",
                patched.patched,
                output.display(),
                patched.warnings.len()
            );
            Ok(())
        }
    }
}

/// Prints per-provider results and fails when any provider failed
fn report<I, T>(results: I) -> anyhow::Result<()>
where
    I: IntoIterator<Item = (String, Result<T, RecommendError>)>,
    T: std::fmt::Display,
{
    let mut failed = 0;
    for (name, result) in results {
        match result {
            Ok(value) => println!("{}: {}", name, value),
            Err(e) => {
                error!("{}: {}", name, e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{} providers failed", failed);
    }
    Ok(())
}
