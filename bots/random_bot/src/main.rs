use clap::Parser;
use paintbot::{visualize_map, Action, GameSettingsOverrides, SpatialMap};
use paintbot_client::{Client, ClientConfig, Player, WebSocketTransport};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{info, trace};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
struct Args {
    /// Name to register with
    #[arg(short, long, default_value = "random_bot")]
    name: String,
    /// Server to connect to
    #[arg(long, default_value = paintbot_client::DEFAULT_HOST)]
    host: String,
    /// Venue to join, e.g. "training" or a tournament venue
    #[arg(long, default_value = paintbot_client::DEFAULT_VENUE)]
    venue: String,
    /// RNG seed
    #[arg(long)]
    seed: Option<u64>,
    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,
    /// Milliseconds per tick, training games only
    #[arg(long)]
    time_per_tick: Option<u32>,
    /// Game duration in seconds, training games only
    #[arg(long)]
    game_duration: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    initialize_logging(args.log_level);

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, "Seeding RNG");
    let bot = RandomBot {
        name: args.name.clone(),
        rng: StdRng::seed_from_u64(seed),
    };

    let mut config = ClientConfig::default()
        .with_host(args.host)
        .with_venue(args.venue);
    if args.time_per_tick.is_some() || args.game_duration.is_some() {
        config = config.with_game_settings(GameSettingsOverrides {
            time_in_ms_per_tick: args.time_per_tick,
            game_duration_in_seconds: args.game_duration,
            ..GameSettingsOverrides::default()
        });
    }

    let url = config.url();
    info!(%url, "Connecting");
    let transport = WebSocketTransport::connect(&url).await?;
    Client::new(transport, config).run(bot).await?;
    Ok(())
}

fn initialize_logging(level: LevelFilter) {
    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

struct RandomBot {
    name: String,
    rng: StdRng,
}

/// The directions that don't run into something, plus exploding if we carry a power-up.
fn possible_actions(map: &SpatialMap) -> Vec<Action> {
    let mut actions: Vec<Action> = Action::DIRECTIONS
        .into_iter()
        .filter(|&action| map.can_i_move(action))
        .collect();
    if map
        .my_character()
        .is_ok_and(|character| character.carrying_power_up)
    {
        actions.push(Action::Explode);
    }
    actions
}

impl Player for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_next_action(&mut self, map: &SpatialMap) -> Action {
        trace!("\n{}", visualize_map(map));
        possible_actions(map)
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Action::Stay)
    }
}
