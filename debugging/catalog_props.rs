//! Query the catalog and print what the server would render.
//! Usage:
//!   cargo run --bin catalog_props -- movie <movie_id>
//!   cargo run --bin catalog_props -- popular
//!   cargo run --bin catalog_props -- search <query...>
//! Requires TMDB_API_KEY in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use marquee::catalog::{CatalogApi, CatalogClient};
use marquee::config::Config;
use marquee::favorites::{FavoritesStore, MemoryStorage};
use marquee::present::{self, DetailPage, TrailerLink};
use marquee::view::MovieListView;
use serde_json::json;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Command {
    Movie,
    Popular,
    Search,
}

impl FromStr for Command {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(Command::Movie),
            "popular" => Ok(Command::Popular),
            "search" => Ok(Command::Search),
            _ => Err(anyhow::anyhow!(
                "command must be 'movie', 'popular' or 'search'"
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin catalog_props -- movie <movie_id>");
        eprintln!("       cargo run --bin catalog_props -- popular");
        eprintln!("       cargo run --bin catalog_props -- search <query...>");
        std::process::exit(1);
    }

    let command = Command::from_str(&args[1])?;
    let config = Config::from_env()?;
    let client = CatalogClient::from_config(&config);
    // Read-only run: nothing is favorited and nothing is written.
    let favorites = FavoritesStore::open(Arc::new(MemoryStorage::new()));

    match command {
        Command::Movie => {
            let id = args
                .get(2)
                .ok_or_else(|| anyhow::anyhow!("missing movie id"))?
                .parse()
                .context("movie id must be an integer")?;
            print_movie(&client, id, &favorites).await?
        }
        Command::Popular => {
            let mut view = MovieListView::new();
            view.load_popular(&client).await;
            let state = view.into_state().map(|m| present::cards(m, &favorites));
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        Command::Search => {
            let query = args[2..].join(" ");
            let mut view = MovieListView::new();
            if !view.search(&client, &query).await {
                anyhow::bail!("search query must not be empty");
            }
            let state = view.into_state().map(|m| present::cards(m, &favorites));
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }

    Ok(())
}

async fn print_movie(client: &CatalogClient, id: i64, favorites: &FavoritesStore) -> Result<()> {
    // Use the fallible call so the actual failure is printed.
    let detail = client.try_fetch_details(id).await?;
    let trailer = client.fetch_trailer(id).await.map(TrailerLink::from);
    let images = client.fetch_images(id).await;

    let output = json!({
        "page": DetailPage::new(detail, favorites),
        "trailer": trailer,
        "images": images.map(|i| json!({
            "backdrops": i.backdrops.len(),
            "posters": i.posters.len(),
            "logos": i.logos.len(),
        })),
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
