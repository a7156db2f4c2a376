use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use scraper::{ElementRef, Html};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tweetctx::{dom, PageContext, QuoteTweetDetector, ResolverConfig, TweetResolver};

#[derive(Parser)]
#[command(name = "tweetctx")]
#[command(about = "Resolve which post a clicked element in a saved feed page belongs to", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log each strategy's outcome
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the strategy chain against an element
    Resolve {
        /// Saved HTML snapshot of the page
        html: PathBuf,

        /// CSS selector for the clicked element (first match is used)
        #[arg(short, long)]
        target: String,

        /// Navigation URL the snapshot was taken at
        #[arg(short, long, default_value = "")]
        url: String,

        /// Run only this strategy
        #[arg(short, long, conflicts_with = "all")]
        strategy: Option<String>,

        /// Run every strategy and print all validated results
        #[arg(short, long)]
        all: bool,
    },
    /// Show the quote-tweet structure around an element
    Analyze {
        html: PathBuf,

        #[arg(short, long)]
        target: String,
    },
}

fn load_config(path: Option<&Path>) -> Result<ResolverConfig> {
    if let Some(path) = path {
        return ResolverConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()));
    }
    match ResolverConfig::default_path() {
        Some(path) if path.exists() => ResolverConfig::load(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        _ => Ok(ResolverConfig::default()),
    }
}

fn find_target<'a>(document: &'a Html, css: &str) -> Result<ElementRef<'a>> {
    let selector = dom::selector(css).context("invalid --target selector")?;
    match document.select(&selector).next() {
        Some(element) => Ok(element),
        None => bail!("no element matches {}", css),
    }
}

fn describe(element: Option<ElementRef<'_>>) -> serde_json::Value {
    match element {
        Some(e) => json!({
            "tag": dom::tag_name(e),
            "id": dom::attr(e, "id"),
            "testid": dom::attr(e, "data-testid"),
        }),
        None => serde_json::Value::Null,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("tweetctx=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tweetctx=info"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            html,
            target,
            url,
            strategy,
            all,
        } => {
            let text = tokio::fs::read_to_string(&html)
                .await
                .with_context(|| format!("reading {}", html.display()))?;
            let document = Html::parse_document(&text);
            let node = find_target(&document, &target)?;
            let page = PageContext::new(url);
            let resolver = TweetResolver::new(&config);

            let results = if all {
                resolver.resolve_with_all_strategies(node, &page).await
            } else if let Some(name) = strategy {
                resolver
                    .resolve_with_strategy(node, &page, &name)
                    .await
                    .into_iter()
                    .collect()
            } else {
                resolver.resolve(node, &page).await.into_iter().collect()
            };

            if results.is_empty() {
                bail!("could not identify the post for {}", target);
            }
            let output = if all {
                serde_json::to_string_pretty(&results)?
            } else {
                serde_json::to_string_pretty(&results[0])?
            };
            println!("{}", output);
        }
        Commands::Analyze { html, target } => {
            let text = tokio::fs::read_to_string(&html)
                .await
                .with_context(|| format!("reading {}", html.display()))?;
            let document = Html::parse_document(&text);
            let node = find_target(&document, &target)?;
            let detector = QuoteTweetDetector::new(&config);

            let analysis = detector.analyze(node);
            let output = json!({
                "isNested": analysis.is_nested,
                "clickedBoundary": analysis.clicked_boundary,
                "outerContainer": describe(analysis.outer_container),
                "innerContainer": describe(analysis.inner_container),
                "targetContainer": describe(analysis.target_container),
                "metadata": detector.extract_metadata(node),
                "mediaContainer": describe(detector.find_media_container(node)),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
