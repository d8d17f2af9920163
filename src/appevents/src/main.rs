//! appevents — report app events to the Graph API activities endpoint from
//! the command line.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use appevents_core::factory::{self, EventOverrides};
use appevents_core::identity::StaticIdentityProvider;
use appevents_core::{AppEvent, AppEventsConfig, ContentItem, Decimal};
use appevents_mobile_sdk::{CaptureTransport, EventSender};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "appevents")]
#[command(about = "Report app events to the Graph API activities endpoint")]
#[command(version)]
struct Cli {
    /// TOML config file; `APP_EVENTS__*` variables override it
    #[arg(long)]
    config: Option<String>,

    /// App id (overrides config)
    #[arg(long, env = "APP_EVENTS__APP_ID")]
    app_id: Option<String>,

    /// Client token (overrides config)
    #[arg(long, env = "APP_EVENTS__CLIENT_TOKEN", hide_env_values = true)]
    client_token: Option<String>,

    /// Advertising identifier (IDFA/GAID) to report (overrides config)
    #[arg(long)]
    advertiser_id: Option<String>,

    /// Tracking consent to report, `true` or `false` (overrides config)
    #[arg(long, action = ArgAction::Set)]
    tracking_enabled: Option<bool>,

    /// Print the form that would be posted instead of sending it
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Completed purchase
    Purchase {
        /// Purchased item as `id` or `id:quantity`
        #[arg(long = "item", required = true)]
        items: Vec<ItemArg>,
        #[arg(long)]
        value: Decimal,
        #[arg(long, default_value = "USD")]
        currency: String,
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Items added to the cart
    AddToCart {
        #[arg(long = "item", required = true)]
        items: Vec<ItemArg>,
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Items removed from the cart
    RemoveFromCart {
        #[arg(long = "item", required = true)]
        items: Vec<ItemArg>,
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Screen view
    ScreenView {
        screen_name: String,
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Login or registration completion
    Login {
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Search
    Search {
        search_term: String,
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Event with a caller-chosen name
    Custom {
        name: String,
        #[arg(long)]
        event_id: Option<String>,
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long = "item")]
        items: Vec<ItemArg>,
        #[arg(long)]
        value: Option<Decimal>,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Screen view, search and login in a single submission
    Batch,
}

/// `id` or `id:quantity`. A suffix that is not a number stays part of the
/// id, so `urn:sku` is one item of quantity 1.
#[derive(Debug, Clone)]
struct ItemArg(ContentItem);

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let item = match s.rsplit_once(':') {
            Some((id, qty)) => match Decimal::from_str(qty) {
                Ok(quantity) => ContentItem::new(id, quantity),
                Err(_) => ContentItem::single(s),
            },
            None => ContentItem::single(s),
        };
        if item.id.trim().is_empty() {
            return Err("item id must not be empty".into());
        }
        Ok(Self(item))
    }
}

fn contents(items: Vec<ItemArg>) -> Vec<ContentItem> {
    items.into_iter().map(|ItemArg(item)| item).collect()
}

impl Command {
    fn into_events(self) -> anyhow::Result<Vec<AppEvent>> {
        let ids = |event_id: Option<String>| EventOverrides {
            id: event_id,
            ..EventOverrides::default()
        };

        let events = match self {
            Command::Purchase {
                items,
                value,
                currency,
                event_id,
            } => vec![factory::purchase(contents(items), value, currency, ids(event_id))],
            Command::AddToCart { items, event_id } => {
                vec![factory::add_to_cart(contents(items), ids(event_id))]
            }
            Command::RemoveFromCart { items, event_id } => {
                vec![factory::remove_from_cart(contents(items), ids(event_id))]
            }
            Command::ScreenView {
                screen_name,
                event_id,
            } => vec![factory::screen_view(screen_name, ids(event_id))],
            Command::Login { event_id } => vec![factory::login(ids(event_id))],
            Command::Search {
                search_term,
                event_id,
            } => vec![factory::search(search_term, ids(event_id))],
            Command::Custom {
                name,
                event_id,
                content_type,
                items,
                value,
                currency,
            } => {
                let items = contents(items);
                vec![factory::custom(
                    name,
                    event_id,
                    content_type,
                    (!items.is_empty()).then_some(items),
                    value,
                    currency,
                )?]
            }
            Command::Batch => vec![
                factory::screen_view("MultipleEventsDemo", EventOverrides::default()),
                factory::search("multiple events test", EventOverrides::default()),
                factory::login(EventOverrides::default()),
            ],
        };
        Ok(events)
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "appevents=info,appevents_mobile_sdk=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = AppEventsConfig::load_with_file(cli.config.as_deref())
        .context("failed to load configuration")?;

    // Apply CLI overrides
    if let Some(app_id) = cli.app_id {
        config.app_id = app_id;
    }
    if let Some(client_token) = cli.client_token {
        config.client_token = client_token;
    }
    if let Some(advertiser_id) = cli.advertiser_id {
        config.identity.advertiser_id = Some(advertiser_id);
    }
    if let Some(tracking_enabled) = cli.tracking_enabled {
        config.identity.tracking_enabled = tracking_enabled;
    }

    info!(
        app_id = %config.app_id,
        api_version = %config.graph.api_version,
        tracking_enabled = config.identity.tracking_enabled,
        dry_run = cli.dry_run,
        "Configuration loaded"
    );

    let events = cli.command.into_events()?;

    if cli.dry_run {
        config.validate()?;
        let capture = Arc::new(CaptureTransport::new());
        let sender = EventSender::builder()
            .transport(capture.clone())
            .app_id(config.app_id.clone())
            .client_token(config.client_token.clone())
            .graph_config(config.graph.clone())
            .identity_provider(Arc::new(StaticIdentityProvider::from_config(
                &config.identity,
            )))
            .build()?;
        sender.submit_auto(&events).await?;

        for request in capture.requests() {
            let form: serde_json::Map<String, serde_json::Value> = request
                .form
                .into_iter()
                .map(|(key, value)| (key, serde_json::Value::String(value)))
                .collect();
            println!("POST {}", request.url);
            println!("{}", serde_json::to_string_pretty(&form)?);
        }
        return Ok(());
    }

    let sender = EventSender::from_config(&config)?;
    let accepted = sender.submit_auto(&events).await?;
    if !accepted {
        warn!(event_count = events.len(), "app events were rejected");
        anyhow::bail!("Graph API rejected {} app event(s)", events.len());
    }

    info!(event_count = events.len(), "app events accepted");
    println!("sent {} app event(s)", events.len());
    Ok(())
}
