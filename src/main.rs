use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yandex_games_bridge::models::{ClientFeature, CurrencyIconSize, EntriesQuery};
use yandex_games_bridge::{Bridge, BridgeConfig, MockConfig};

#[derive(Parser)]
#[command(name = "yg-bridge")]
#[command(about = "Run Yandex Games bridge operations against the offline host")]
struct Cli {
    /// Skip the offline host's simulated latency
    #[arg(long, global = true)]
    instant: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the player profile
    Player,
    /// Save a value, then read it back
    Save { key: String, data: String },
    /// Show an ad
    Ad {
        #[arg(long)]
        rewarded: bool,
    },
    /// Submit a score and print the resulting leaderboard
    Score {
        leaderboard: String,
        score: i64,
        #[arg(long)]
        extra: Option<String>,
        #[arg(long, default_value_t = 5)]
        top: u32,
        #[arg(long, default_value_t = 2)]
        around: u32,
    },
    /// Fetch remote flags; defaults given as NAME=VALUE
    Flags {
        #[arg(long = "default", value_parser = parse_pair)]
        defaults: Vec<(String, String)>,
        #[arg(long = "feature", value_parser = parse_pair)]
        features: Vec<(String, String)>,
    },
    /// List the product catalog
    Catalog,
    /// Buy a product, then consume it
    Buy {
        product: String,
        #[arg(long)]
        payload: Option<String>,
    },
    /// Ask for a review
    Review,
    /// Run every operation once
    Tour,
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let cli = Cli::parse();

    let mock = if cli.instant {
        MockConfig::instant()
    } else {
        MockConfig::default()
    };
    let config = BridgeConfig::from_env().map_err(|e| anyhow!(e))?;
    let bridge = Bridge::offline(config, mock).await?;
    bridge.initialize().await.context("SDK initialization failed")?;

    match cli.command {
        Command::Player => player(&bridge).await,
        Command::Save { key, data } => save(&bridge, &key, &data).await,
        Command::Ad { rewarded } => ad(&bridge, rewarded).await,
        Command::Score {
            leaderboard,
            score,
            extra,
            top,
            around,
        } => {
            let query = EntriesQuery::new()
                .include_user(true)
                .quantity_top(top)
                .quantity_around(around);
            submit_score(&bridge, &leaderboard, score, extra.as_deref(), query).await
        }
        Command::Flags { defaults, features } => flags(&bridge, defaults, features).await,
        Command::Catalog => catalog(&bridge).await,
        Command::Buy { product, payload } => buy(&bridge, &product, payload.as_deref()).await,
        Command::Review => review(&bridge).await,
        Command::Tour => tour(&bridge).await,
    }
}

/// Set up tracing subscriber; `RUST_LOG` overrides the default level.
fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

async fn player(bridge: &Bridge) -> Result<()> {
    let player = bridge.get_player_data().await?;
    println!("{} ({}, {})", player.name, player.lang, player.device);
    Ok(())
}

async fn save(bridge: &Bridge, key: &str, data: &str) -> Result<()> {
    bridge.save_data(key, data).await?;
    let loaded = bridge.load_data(key).await?;
    println!("{key} = {}", loaded.as_deref().unwrap_or("<none>"));
    Ok(())
}

async fn ad(bridge: &Bridge, rewarded: bool) -> Result<()> {
    if rewarded {
        let granted = bridge.show_rewarded_ad().await?;
        println!("rewarded: {granted}");
    } else {
        bridge.show_interstitial_ad().await?;
        println!("interstitial closed");
    }
    Ok(())
}

async fn submit_score(
    bridge: &Bridge,
    leaderboard: &str,
    score: i64,
    extra: Option<&str>,
    query: EntriesQuery,
) -> Result<()> {
    bridge.set_leaderboard_score(leaderboard, score, extra).await?;

    let own = bridge.get_leaderboard_player_entry(leaderboard).await?;
    println!("your rank on '{leaderboard}': #{} ({})", own.rank, own.formatted_score);

    let board = bridge.get_leaderboard_entries(leaderboard, query).await?;
    for entry in &board.entries {
        println!("  #{:<3} {:<16} {}", entry.rank, entry.player.public_name, entry.formatted_score);
    }
    Ok(())
}

async fn flags(
    bridge: &Bridge,
    defaults: Vec<(String, String)>,
    features: Vec<(String, String)>,
) -> Result<()> {
    let defaults: BTreeMap<String, String> = defaults.into_iter().collect();
    let features: Vec<ClientFeature> = features
        .into_iter()
        .map(|(name, value)| ClientFeature::new(name, value))
        .collect();

    for (name, value) in bridge.get_flags(&defaults, &features).await? {
        println!("{name} = {value}");
    }
    Ok(())
}

async fn catalog(bridge: &Bridge) -> Result<()> {
    for product in bridge.get_catalog().await? {
        println!(
            "{:<12} {:<16} {:>8}  {}",
            product.id,
            product.title,
            product.price,
            product.price_currency_image(CurrencyIconSize::Small)
        );
    }
    Ok(())
}

async fn buy(bridge: &Bridge, product: &str, payload: Option<&str>) -> Result<()> {
    let purchase = bridge.purchase(product, payload).await?;
    println!("bought {} (token {})", purchase.product_id, purchase.purchase_token);
    println!("owned: {}", bridge.has_purchase(product).await);

    bridge.consume_purchase(&purchase.purchase_token).await?;
    println!("consumed; still owned: {}", bridge.has_purchase(product).await);
    Ok(())
}

async fn review(bridge: &Bridge) -> Result<()> {
    let availability = bridge.can_review().await?;
    if !availability.value {
        println!(
            "review unavailable: {}",
            availability.reason.as_deref().unwrap_or("unknown")
        );
        return Ok(());
    }
    let sent = bridge.request_review().await?;
    println!("feedback sent: {sent}");
    Ok(())
}

async fn tour(bridge: &Bridge) -> Result<()> {
    player(bridge).await?;
    save(bridge, "progress", r#"{"level":3}"#).await?;
    ad(bridge, false).await?;
    ad(bridge, true).await?;
    submit_score(bridge, "weekly", 900, None, EntriesQuery::new().include_user(true)).await?;
    flags(
        bridge,
        vec![("difficulty".to_string(), "normal".to_string())],
        vec![("level".to_string(), "3".to_string())],
    )
    .await?;
    catalog(bridge).await?;
    buy(bridge, "gold100", Some("tour")).await?;
    review(bridge).await
}
