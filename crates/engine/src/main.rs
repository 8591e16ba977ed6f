//! Booker Engine - Main entry point.
//!
//! Runs storyline ticks on a fixed interval against an in-memory store backed
//! by a fact book: conditions are answered from facts, effects write facts.

use std::sync::Arc;

use booker_domain::ConditionType;
use booker_engine::infrastructure::{
    clock::SystemClock,
    config::EngineConfig,
    facts::{FactBook, FactEffectHandler, FactEvaluator},
    memory::InMemoryBranchRepo,
    ports::ClockPort,
    registry::{EvaluatorRegistry, HandlerRegistry},
    seed::Seed,
};
use booker_engine::App;
use tokio::time::MissedTickBehavior;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Condition types answered by numeric "at least" comparison.
const THRESHOLD_CONDITIONS: [&str; 6] = [
    "HEAT_THRESHOLD",
    "FAN_THRESHOLD",
    "FAN_CHANGE",
    "MEMBER_COUNT",
    "SHOW_COUNT",
    "DAYS_PASSED",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "booker_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Booker Engine");

    let config = EngineConfig::from_env();
    tracing::info!(
        tick_interval_secs = config.tick_interval.as_secs(),
        expiry_days = ?config.expiry_days,
        max_ticks = ?config.max_ticks,
        seed_file = ?config.seed_file,
        "Configuration loaded"
    );

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let repo = Arc::new(InMemoryBranchRepo::new());
    let facts = Arc::new(FactBook::new());

    if let Some(path) = &config.seed_file {
        let (branches, seeded_facts) = Seed::load(path).await?.apply(&*repo, &facts).await?;
        tracing::info!(branches, facts = seeded_facts, path = %path.display(), "Seed loaded");
    }

    let evaluators =
        EvaluatorRegistry::new().with_fallback(Arc::new(FactEvaluator::exact(facts.clone())));
    for name in THRESHOLD_CONDITIONS {
        evaluators.register(
            ConditionType::new(name)?,
            Arc::new(FactEvaluator::at_least(facts.clone())),
        );
    }
    let handlers =
        HandlerRegistry::new().with_fallback(Arc::new(FactEffectHandler::new(facts.clone())));

    let app = App::new(repo, Arc::new(evaluators), Arc::new(handlers), clock);

    // Expiry is an explicit operator action, run once here and never per tick
    if let Some(days) = config.expiry_days {
        match app
            .use_cases
            .storyline
            .manage
            .expire_stale_branches(days)
            .await
        {
            Ok(expired) => tracing::info!(count = expired.len(), days, "Startup expiry sweep done"),
            Err(e) => tracing::warn!(error = %e, "Startup expiry sweep failed"),
        }
    }

    let mut interval = tokio::time::interval(config.tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
        }

        // Ticks run inline, so they never overlap
        match app.use_cases.storyline.tick.execute().await {
            Ok(report) => {
                for line in report.outcome_log() {
                    tracing::info!("{}", line);
                }
            }
            Err(e) => tracing::warn!(error = %e, "Tick failed"),
        }

        ticks += 1;
        if config.max_ticks.is_some_and(|max| ticks >= max) {
            tracing::info!(ticks, "Reached BOOKER_MAX_TICKS, stopping");
            break;
        }
    }

    Ok(())
}

fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
