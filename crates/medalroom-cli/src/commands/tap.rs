use std::sync::Arc;

use medalroom_core::{reset_all_progress, Config, Database, ProgressStore, TapGuard};

pub fn run_tap() -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);
    let config = Config::load_or_default();
    let guard = TapGuard::new(Arc::clone(&db), config.tap);

    let reset = guard.handle_tap()?;
    if reset {
        // A confirmed reset also ends the engine run.
        db.set_engine_enabled(false)?;
    }
    println!(
        "{}",
        serde_json::json!({ "reset": reset, "tap_count": db.tap_count()? })
    );
    Ok(())
}

pub fn run_reset() -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    reset_all_progress(&db)?;
    db.set_engine_enabled(false)?;
    println!("{}", serde_json::json!({ "type": "progress_reset" }));
    Ok(())
}
