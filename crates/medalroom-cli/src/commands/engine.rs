use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use chrono::Utc;
use medalroom_core::{Config, Database, Event, PointsEngine, ProgressStore, StopReason};
use tokio::sync::broadcast::{self, error::RecvError};

#[derive(Subcommand)]
pub enum EngineAction {
    /// Start the engine and stream its events until Ctrl-C
    Start {
        /// Stop streaming after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Start the engine only if it was left enabled, then stream events
    Resume {
        /// Stop streaming after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
    /// Stop the engine and clear its enabled flag
    Stop,
    /// Print the persisted engine state as JSON
    Status,
}

pub fn run(action: EngineAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let config = Config::load_or_default();
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute(action, db, config))
}

async fn execute(
    action: EngineAction,
    db: Arc<Database>,
    config: Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let engine = PointsEngine::new(Arc::clone(&db), config.engine);
    // Subscribe before starting so the first cycle is not missed.
    let events = engine.events();

    match action {
        EngineAction::Start { seconds } => {
            engine.start().await?;
            stream_events(&engine, events, seconds).await?;
        }
        EngineAction::Resume { seconds } => {
            engine.resume().await?;
            stream_events(&engine, events, seconds).await?;
        }
        EngineAction::Stop => {
            engine.stop().await?;
            let event = Event::EngineStopped {
                reason: StopReason::Stopped,
                at: Utc::now(),
            };
            println!("{}", serde_json::to_string(&event)?);
        }
        EngineAction::Status => {
            let medals = engine.medals()?;
            let eligible = medals.iter().filter(|m| !m.is_max_level()).count();
            let status = serde_json::json!({
                "enabled": db.engine_enabled()?,
                "eligible_medals": eligible,
                "maxed_medals": medals.len() - eligible,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

/// Prints each engine event as a JSON line until the engine stops on its
/// own, the duration elapses or Ctrl-C. Leaving pauses the engine, so the
/// next `resume` picks up again.
async fn stream_events(
    engine: &PointsEngine<Database>,
    mut events: broadcast::Receiver<Event>,
    seconds: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !engine.is_running() {
        println!("{}", serde_json::to_string(&engine.state())?);
        return Ok(());
    }

    let deadline = async {
        match seconds {
            Some(s) => tokio::time::sleep(Duration::from_secs(s)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(event) => {
                    println!("{}", serde_json::to_string(&event)?);
                    if matches!(event, Event::EngineStopped { .. }) {
                        return Ok(());
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    engine.pause().await;
    Ok(())
}
