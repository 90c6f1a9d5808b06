use std::sync::Arc;

use clap::Subcommand;
use medalroom_core::{Database, ProgressStore, ProgressUpdater};

#[derive(Subcommand)]
pub enum MedalsAction {
    /// List all medals
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Grant points to one medal by hand
    Grant {
        /// Medal ID
        id: u32,
        /// Points to add
        points: u32,
    },
}

pub fn run(action: MedalsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Arc::new(Database::open()?);

    match action {
        MedalsAction::List { json } => {
            let medals = db.load_medals()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&medals)?);
            } else {
                for m in &medals {
                    let status = if m.is_max_level() {
                        "MAX".to_string()
                    } else {
                        format!("{:>3}%", (m.progress_fraction() * 100.0).round() as u32)
                    };
                    println!(
                        "{:>2} {} {:<12} lvl {:>2}/{:<2} {}",
                        m.id, m.icon, m.name, m.current_level, m.max_level, status
                    );
                }
            }
        }
        MedalsAction::Grant { id, points } => {
            let updater = ProgressUpdater::new(db);
            match updater.apply_points(id, points)? {
                Some(update) => println!("{}", serde_json::to_string_pretty(&update)?),
                None => return Err(format!("no medal with id {id}").into()),
            }
        }
    }
    Ok(())
}
