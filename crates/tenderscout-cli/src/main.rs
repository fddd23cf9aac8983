use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tenderscout_api::RetryConfig;
use tenderscout_core::{Catalog, Config, FilterPatch, HttpTenderService, Recommendations};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod render;

#[derive(Parser)]
#[command(name = "tenderscout")]
#[command(version, about = "Browse public-sector tenders from the terminal", long_about = None)]
struct Cli {
    /// Tender API root, e.g. https://api.example.org/api
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List tenders, optionally filtered
    List {
        /// Free-text search over title, description and organization
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Open, Closed or Pending
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long)]
        page: Option<u32>,
        /// Tenders per page
        #[arg(short, long)]
        limit: Option<NonZeroU32>,
    },
    /// Show one tender in full
    Show {
        /// Tender identifier
        id: String,
    },
    /// List known tender categories
    Categories,
    /// List countries with tenders
    Countries,
    /// Personalized recommendations (needs a token)
    Recommend {
        /// Bearer token; falls back to config and TENDERSCOUT_TOKEN
        #[arg(long)]
        token: Option<String>,
    },
    /// Check that the API is reachable
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tenderscout=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    config.apply_env();
    config.apply_overrides(cli.api_url.clone(), None);

    let service = Arc::new(
        HttpTenderService::from_config(&config.api, RetryConfig::from(&config.retry))
            .context("Failed to set up HTTP client")?,
    );
    let catalog = Catalog::with_query(service.clone(), config.initial_query());

    match cli.command {
        Some(Commands::List {
            search,
            country,
            category,
            status,
            page,
            limit,
        }) => {
            let patch = FilterPatch {
                search,
                country,
                category,
                status,
            };
            if let Some(limit) = limit {
                catalog.set_limit(limit).await;
            }
            let mut query = catalog.set_filters(patch).await;
            if let Some(page) = page {
                query = catalog.set_page(page).await;
            }
            tracing::info!("Listing tenders: {}", query.to_params().to_query_string());

            let fetched = catalog.refresh_listing().await;
            let state = catalog.snapshot().await;
            if let Err(e) = fetched {
                anyhow::bail!(
                    "{} ({})",
                    state.error().unwrap_or("Failed to fetch tenders"),
                    e
                );
            }

            if cli.json {
                let body = serde_json::json!({
                    "tenders": state.listing(),
                    "pagination": state.pagination(),
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                print!("{}", render::listing(&state));
            }
        }
        Some(Commands::Show { id }) => {
            tracing::info!("Showing tender: {}", id);
            if let Err(e) = catalog.fetch_detail(&id).await {
                let state = catalog.snapshot().await;
                anyhow::bail!(
                    "{} ({})",
                    state.error().unwrap_or("Failed to fetch tender"),
                    e
                );
            }

            let state = catalog.snapshot().await;
            if let Some(tender) = state.selected() {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(tender)?);
                } else {
                    print!("{}", render::detail(tender));
                }
            }
        }
        Some(Commands::Categories) => {
            catalog.fetch_categories().await?;
            print_vocabulary(catalog.snapshot().await.categories(), cli.json)?;
        }
        Some(Commands::Countries) => {
            catalog.fetch_countries().await?;
            print_vocabulary(catalog.snapshot().await.countries(), cli.json)?;
        }
        Some(Commands::Recommend { token }) => {
            let token = token.or(config.api.token.clone());
            match catalog.fetch_recommendations(token.as_deref()).await.current() {
                Some(Recommendations::Ready(tenders)) if cli.json => {
                    println!("{}", serde_json::to_string_pretty(&tenders)?);
                }
                Some(Recommendations::Ready(tenders)) if !tenders.is_empty() => {
                    for tender in &tenders {
                        println!("{}", render::tender_line(tender));
                    }
                }
                Some(Recommendations::Degraded(reason)) => {
                    tracing::debug!("Recommendations degraded: {:?}", reason);
                    if cli.json {
                        println!("[]");
                    } else {
                        println!("No recommendations available.");
                    }
                }
                _ => println!("No recommendations available."),
            }
        }
        Some(Commands::Health) => {
            let health = service
                .client()
                .health()
                .await
                .context("Tender API is not reachable")?;
            println!(
                "{}: {}",
                health.status,
                health.message.as_deref().unwrap_or("ok")
            );
        }
        None => {
            println!("No command specified. Try --help");
        }
    }

    Ok(())
}

fn print_vocabulary(values: &[String], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(values)?);
    } else {
        for value in values {
            println!("{}", value);
        }
    }
    Ok(())
}
