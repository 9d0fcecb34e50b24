//! A minimal trading bot: joins a region, publishes a scripted city
//! snapshot, auto-accepts every eligible offer, and logs market updates.
//!
//! Run against a broker:
//!
//! ```text
//! cargo run --example trade_bot -- 127.0.0.1 4230 BotCity
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use gridlink::{
    ClientConfig, LocalState, Proposal, RegionClient, RegionEvents, Resource,
    StateProvider, UtilityStats,
};

/// A scripted city that slowly earns money and always has surplus power.
struct ScriptedCity {
    name: String,
    ticks: AtomicU64,
}

impl StateProvider for ScriptedCity {
    fn local_state(&self) -> LocalState {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed);
        LocalState {
            player_name: self.name.clone(),
            money: 100_000 + (tick as i64) * 250,
            population: 20_000,
            electricity: UtilityStats::new(2_000, 1_200, 0),
            water: UtilityStats::new(600, 580, 0),
            sewage: UtilityStats::new(600, 560, 0),
            sim_speed: 1,
            sim_date: format!("tick {tick}"),
            electricity_border: true,
            ..Default::default()
        }
    }
}

/// Logs everything the broker tells us.
struct LogEvents;

impl RegionEvents for LogEvents {
    fn on_state_received(&self, state: LocalState) {
        tracing::info!(
            peer = %state.player_name,
            money = state.money,
            population = state.population,
            "peer state"
        );
    }

    fn on_proposals_updated(&self, proposals: &[Proposal]) {
        tracing::info!(count = proposals.len(), "proposal board updated");
        for proposal in proposals {
            tracing::info!("  {proposal}");
        }
    }

    fn on_contracts_updated(&self, contracts: &[String]) {
        tracing::info!(count = contracts.len(), "active contracts updated");
    }

    fn on_disconnected(&self) {
        tracing::warn!("disconnected from region");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".into());
    let port = args.next().map(|p| p.parse()).transpose()?.unwrap_or(4230);
    let name = args.next().unwrap_or_else(|| "BotCity".into());

    let config = ClientConfig {
        host,
        port,
        player_name: name.clone(),
        auto_accept: true,
        ..Default::default()
    };

    let client = RegionClient::new(
        config,
        ScriptedCity {
            name,
            ticks: AtomicU64::new(0),
        },
        LogEvents,
    );

    client.connect().await?;
    tracing::info!("connected — offering surplus electricity");
    client
        .create_public_offer(Resource::Electricity, 500, 2)
        .await?;

    tokio::signal::ctrl_c().await?;
    client.disconnect().await;
    Ok(())
}
