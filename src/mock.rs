// ============================================================================
// Offline Host
// ============================================================================
//
// In-process stand-in for the platform SDK. Every call is answered on the
// same named channels the real host uses, with keyed envelopes, after an
// artificial latency. Responses are computed when the call is made and
// delivered through an mpsc channel, never re-entrantly from `invoke`.
//
// ============================================================================

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use lazy_static::lazy_static;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::core::{ChannelRole, OperationKind};
use crate::gate::{INITIALIZE_ERROR_CHANNEL, INITIALIZED_CHANNEL};
use crate::host::{HostCall, HostError, HostPlatform};
use crate::models::{
    EntryRange, LeaderboardDescription, LeaderboardEntriesResponse, LeaderboardEntry,
    LeaderboardPlayer, LocalizedTitles, PlayerData, Product, Purchase, ReviewAvailability,
    ReviewOutcome, ScopePermissions,
};

const MOCK_PLAYER_ID: &str = "mock_player";

lazy_static! {
    static ref MOCK_CATALOG: Vec<Product> = vec![
        mock_product("gold100", "100 Gold Coins", "A small pile of gold coins", "gold100.png", 50),
        mock_product("gold500", "500 Gold Coins", "A large pile of gold coins", "gold500.png", 200),
        mock_product(
            "disable_ads",
            "Remove Ads",
            "Permanently remove all advertisements",
            "noads.png",
            500
        ),
    ];

    /// Other players on every mock leaderboard
    static ref MOCK_RIVALS: Vec<(&'static str, &'static str, i64)> = vec![
        ("rival_1", "Alice", 1200),
        ("rival_2", "Bob", 800),
        ("rival_3", "Carol", 450),
    ];
}

fn mock_product(id: &str, title: &str, description: &str, image: &str, price: u32) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        image_uri: format!("https://example.com/{image}"),
        price: format!("{price} YAN"),
        price_value: price.to_string(),
        price_currency_code: "YAN".to_string(),
    }
}

/// Products the offline host sells
pub fn mock_catalog() -> &'static [Product] {
    &MOCK_CATALOG
}

/// Behaviour of the offline host
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub init_latency: Duration,
    pub player_latency: Duration,
    pub storage_latency: Duration,
    pub ad_latency: Duration,
    pub purchase_latency: Duration,
    pub catalog_latency: Duration,
    /// Everything else: leaderboards, flags, reviews, purchase list
    pub default_latency: Duration,
    pub player: PlayerData,
    /// Whether rewarded ads are watched to the end
    pub grant_rewards: bool,
    /// Answer initialization on the error channel with this message
    pub init_error: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            init_latency: Duration::from_millis(50),
            player_latency: Duration::from_millis(100),
            storage_latency: Duration::from_millis(50),
            ad_latency: Duration::from_millis(1000),
            purchase_latency: Duration::from_millis(500),
            catalog_latency: Duration::from_millis(100),
            default_latency: Duration::from_millis(50),
            player: PlayerData {
                name: "Test Player".to_string(),
                avatar: String::new(),
                lang: "en".to_string(),
                device: "desktop".to_string(),
            },
            grant_rewards: true,
            init_error: None,
        }
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// No artificial latency; callbacks still arrive asynchronously
    pub fn instant() -> Self {
        Self {
            init_latency: Duration::ZERO,
            player_latency: Duration::ZERO,
            storage_latency: Duration::ZERO,
            ad_latency: Duration::ZERO,
            purchase_latency: Duration::ZERO,
            catalog_latency: Duration::ZERO,
            default_latency: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn player(mut self, player: PlayerData) -> Self {
        self.player = player;
        self
    }

    pub fn grant_rewards(mut self, grant: bool) -> Self {
        self.grant_rewards = grant;
        self
    }

    pub fn init_error(mut self, message: impl Into<String>) -> Self {
        self.init_error = Some(message.into());
        self
    }

    fn latency_for(&self, call: &HostCall) -> Duration {
        match call {
            HostCall::Initialize => self.init_latency,
            HostCall::GetPlayerData => self.player_latency,
            HostCall::SaveData { .. } | HostCall::LoadData { .. } => self.storage_latency,
            HostCall::ShowInterstitialAd | HostCall::ShowRewardedAd => self.ad_latency,
            HostCall::Purchase { .. } => self.purchase_latency,
            HostCall::GetCatalog => self.catalog_latency,
            _ => self.default_latency,
        }
    }
}

/// A callback the offline host wants delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: &'static str,
    pub payload: String,
}

impl Delivery {
    fn complete(kind: OperationKind, key: &str, data: Option<String>) -> Self {
        Self::envelope(kind, ChannelRole::Completion, key, data)
    }

    /// Completion carrying `value` as JSON; answered on the error channel if
    /// it cannot be serialized
    fn json<T: Serialize + ?Sized>(kind: OperationKind, key: &str, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self::complete(kind, key, Some(body)),
            Err(err) => {
                warn!("Mock {kind} payload failed to serialize: {err}");
                Self::fail(kind, key, format!("mock payload not serializable: {err}"))
            }
        }
    }

    fn fail(kind: OperationKind, key: &str, message: impl Into<String>) -> Self {
        Self::envelope(kind, ChannelRole::Failure, key, Some(message.into()))
    }

    fn envelope(kind: OperationKind, role: ChannelRole, key: &str, body: Option<String>) -> Self {
        let payload = match kind.key_field().field_name() {
            Some(field) => {
                let body_field = match role {
                    ChannelRole::Completion => "data",
                    ChannelRole::Failure => "error",
                };
                let mut object = serde_json::Map::new();
                object.insert(field.to_string(), Value::String(key.to_string()));
                object.insert(body_field.to_string(), body.map_or(Value::Null, Value::String));
                Value::Object(object).to_string()
            }
            None => body.unwrap_or_default(),
        };
        Self {
            channel: kind.channel(role),
            payload,
        }
    }
}

#[derive(Debug, Clone)]
struct MockScore {
    score: i64,
    extra_data: String,
}

#[derive(Debug, Default)]
struct MockState {
    storage: HashMap<String, String>,
    scores: HashMap<String, MockScore>,
    purchases: Vec<Purchase>,
    review_requested: bool,
}

/// Offline [`HostPlatform`]
pub struct MockHost {
    config: MockConfig,
    state: Mutex<MockState>,
    deliveries: mpsc::UnboundedSender<Delivery>,
}

impl MockHost {
    /// Host plus the stream of callbacks it produces; feed them to
    /// [`crate::Bridge::dispatch`]
    pub fn new(config: MockConfig) -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (deliveries, rx) = mpsc::unbounded_channel();
        let host = Self {
            config,
            state: Mutex::new(MockState::default()),
            deliveries,
        };
        (host, rx)
    }

    fn respond(&self, call: &HostCall) -> Result<Delivery, HostError> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| HostError::new(format!("mock state poisoned: {e}")))?;

        let delivery = match call {
            HostCall::Initialize => match &self.config.init_error {
                Some(message) => Delivery {
                    channel: INITIALIZE_ERROR_CHANNEL,
                    payload: message.clone(),
                },
                None => {
                    info!("Mock SDK initialized");
                    Delivery {
                        channel: INITIALIZED_CHANNEL,
                        payload: String::new(),
                    }
                }
            },
            HostCall::GetPlayerData => {
                Delivery::json(OperationKind::PlayerData, "", &self.config.player)
            }
            HostCall::SaveData { key, data } => {
                state.storage.insert(key.clone(), data.clone());
                debug!("Mock save: {key} ({} bytes)", data.len());
                Delivery::complete(OperationKind::SaveData, key, None)
            }
            HostCall::LoadData { key } => {
                let value = state.storage.get(key).cloned();
                debug!("Mock load: {key} (found: {})", value.is_some());
                Delivery::complete(OperationKind::LoadData, key, value)
            }
            HostCall::ShowInterstitialAd => {
                info!("Mock interstitial ad shown");
                Delivery::complete(OperationKind::InterstitialAd, "", None)
            }
            HostCall::ShowRewardedAd => {
                let rewarded = self.config.grant_rewards;
                info!("Mock rewarded ad shown (rewarded: {rewarded})");
                Delivery::complete(OperationKind::RewardedAd, "", Some(rewarded.to_string()))
            }
            HostCall::SetLeaderboardScore {
                leaderboard,
                score,
                extra_data,
            } => {
                state.scores.insert(
                    leaderboard.clone(),
                    MockScore {
                        score: *score,
                        extra_data: extra_data.clone(),
                    },
                );
                debug!("Mock score submitted: {leaderboard} = {score}");
                Delivery::complete(OperationKind::SetLeaderboardScore, leaderboard, None)
            }
            HostCall::GetLeaderboardDescription { leaderboard } => Delivery::json(
                OperationKind::LeaderboardDescription,
                leaderboard,
                &mock_description(leaderboard),
            ),
            HostCall::GetLeaderboardPlayerEntry { leaderboard } => {
                let kind = OperationKind::LeaderboardPlayerEntry;
                let standings = standings(&self.config.player, state.scores.get(leaderboard));
                match standings.iter().find(|e| e.player.unique_id == MOCK_PLAYER_ID) {
                    Some(entry) => Delivery::json(kind, leaderboard, entry),
                    None => Delivery::fail(kind, leaderboard, "LEADERBOARD_PLAYER_NOT_PRESENT"),
                }
            }
            HostCall::GetLeaderboardEntries {
                request_key,
                leaderboard,
                include_user,
                quantity_around,
                quantity_top,
            } => {
                let standings = standings(&self.config.player, state.scores.get(leaderboard));
                let response = entries_response(
                    leaderboard,
                    standings,
                    *include_user,
                    *quantity_around,
                    *quantity_top,
                );
                Delivery::json(OperationKind::LeaderboardEntries, request_key, &response)
            }
            HostCall::GetFlags {
                request_key,
                default_flags,
                ..
            } => Delivery::complete(OperationKind::Flags, request_key, Some(default_flags.clone())),
            HostCall::CanReview => {
                let availability = if state.review_requested {
                    ReviewAvailability {
                        value: false,
                        reason: Some("REVIEW_ALREADY_REQUESTED".to_string()),
                    }
                } else {
                    ReviewAvailability {
                        value: true,
                        reason: None,
                    }
                };
                Delivery::json(OperationKind::CanReview, "", &availability)
            }
            HostCall::RequestReview => {
                let kind = OperationKind::RequestReview;
                if state.review_requested {
                    Delivery::fail(kind, "", "REVIEW_ALREADY_REQUESTED")
                } else {
                    state.review_requested = true;
                    let outcome = ReviewOutcome {
                        feedback_sent: true,
                    };
                    Delivery::json(kind, "", &outcome)
                }
            }
            HostCall::GetCatalog => {
                Delivery::json(OperationKind::Catalog, "", &*MOCK_CATALOG)
            }
            HostCall::Purchase {
                product_id,
                developer_payload,
            } => {
                let kind = OperationKind::Purchase;
                if MOCK_CATALOG.iter().any(|p| &p.id == product_id) {
                    let purchase = Purchase {
                        product_id: product_id.clone(),
                        purchase_token: format!("mock_token_{}", Uuid::new_v4().simple()),
                        developer_payload: developer_payload.clone(),
                        signature: String::new(),
                    };
                    state.purchases.push(purchase.clone());
                    info!("Mock purchase created: {product_id}");
                    Delivery::json(kind, product_id, &purchase)
                } else {
                    warn!("Mock purchase of unknown product: {product_id}");
                    Delivery::fail(kind, product_id, format!("Product not found: {product_id}"))
                }
            }
            HostCall::GetPurchases => {
                Delivery::json(OperationKind::Purchases, "", &state.purchases)
            }
            HostCall::ConsumePurchase { purchase_token } => {
                let kind = OperationKind::ConsumePurchase;
                match state
                    .purchases
                    .iter()
                    .position(|p| &p.purchase_token == purchase_token)
                {
                    Some(index) => {
                        let consumed = state.purchases.remove(index);
                        info!("Mock purchase consumed: {}", consumed.product_id);
                        Delivery::complete(kind, purchase_token, None)
                    }
                    None => Delivery::fail(
                        kind,
                        purchase_token,
                        format!("Purchase token not found: {purchase_token}"),
                    ),
                }
            }
        };
        Ok(delivery)
    }
}

impl HostPlatform for MockHost {
    fn invoke(&self, call: &HostCall) -> Result<(), HostError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| HostError::new("mock host needs a Tokio runtime"))?;

        let delivery = self.respond(call)?;
        let latency = self.config.latency_for(call);
        let deliveries = self.deliveries.clone();
        runtime.spawn(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            // Receiver gone means the bridge was dropped
            let _ = deliveries.send(delivery);
        });
        Ok(())
    }
}

fn mock_description(leaderboard: &str) -> LeaderboardDescription {
    LeaderboardDescription {
        app_id: "mock_app".to_string(),
        name: leaderboard.to_string(),
        is_default: false,
        title: LocalizedTitles {
            en: leaderboard.to_string(),
            ..Default::default()
        },
        description: Default::default(),
    }
}

/// Rivals plus the player (when scored), ranked best first
fn standings(player: &PlayerData, score: Option<&MockScore>) -> Vec<LeaderboardEntry> {
    let mut rows: Vec<(LeaderboardPlayer, i64, String)> = MOCK_RIVALS
        .iter()
        .map(|(id, name, score)| (mock_player(id, name, "en"), *score, String::new()))
        .collect();
    if let Some(own) = score {
        rows.push((
            mock_player(MOCK_PLAYER_ID, &player.name, &player.lang),
            own.score,
            own.extra_data.clone(),
        ));
    }
    rows.sort_by(|a, b| b.1.cmp(&a.1));

    rows.into_iter()
        .enumerate()
        .map(|(index, (player, score, extra_data))| LeaderboardEntry {
            score,
            extra_data,
            rank: index as u32 + 1,
            player,
            formatted_score: score.to_string(),
        })
        .collect()
}

fn mock_player(id: &str, name: &str, lang: &str) -> LeaderboardPlayer {
    LeaderboardPlayer {
        unique_id: id.to_string(),
        public_name: name.to_string(),
        lang: lang.to_string(),
        scope_permissions: ScopePermissions {
            avatar: "allow".to_string(),
            public_name: "allow".to_string(),
        },
    }
}

fn entries_response(
    leaderboard: &str,
    standings: Vec<LeaderboardEntry>,
    include_user: bool,
    quantity_around: u32,
    quantity_top: u32,
) -> LeaderboardEntriesResponse {
    let top = (quantity_top as usize).min(standings.len());
    let mut picked: BTreeSet<usize> = (0..top).collect();
    let mut ranges = vec![EntryRange {
        start: 0,
        size: top as u32,
    }];

    let user_index = standings
        .iter()
        .position(|e| e.player.unique_id == MOCK_PLAYER_ID);
    let mut user_rank = 0;
    if let Some(index) = user_index.filter(|_| include_user) {
        user_rank = index as u32 + 1;
        let start = index.saturating_sub(quantity_around as usize);
        let end = (index + quantity_around as usize + 1).min(standings.len());
        if start >= top || end > top {
            ranges.push(EntryRange {
                start: start as u32,
                size: (end - start) as u32,
            });
        }
        picked.extend(start..end);
    }

    let entries = standings
        .into_iter()
        .enumerate()
        .filter(|(index, _)| picked.contains(index))
        .map(|(_, entry)| entry)
        .collect();

    LeaderboardEntriesResponse {
        leaderboard: mock_description(leaderboard),
        user_rank,
        ranges,
        entries,
    }
}
