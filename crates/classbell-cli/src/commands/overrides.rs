use clap::Subcommand;
use classbell_core::{OverrideManager, ScheduleDocument, ScheduleStore};

use super::CliResult;

#[derive(Subcommand)]
pub enum OverrideAction {
    /// Show override state
    Status,
    /// Show another weekday's lessons today (0 = Monday)
    Week { weekday: u8 },
    /// Drop the weekday substitution
    ClearWeek,
    /// Replace the active schedule until the next start
    Apply {
        /// JSON document to use instead
        file: std::path::PathBuf,
    },
    /// Put the original schedule back now
    Restore,
}

pub fn run(action: OverrideAction) -> CliResult {
    let (mut config, mut store) = super::open()?;
    match action {
        OverrideAction::Status => {
            let state = OverrideManager::state(&config);
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        OverrideAction::Week { weekday } => {
            OverrideManager::set_weekday_substitution(&mut config, Some(weekday))?;
            println!("showing weekday {weekday} until next start");
        }
        OverrideAction::ClearWeek => {
            OverrideManager::set_weekday_substitution(&mut config, None)?;
            println!("weekday substitution cleared");
        }
        OverrideAction::Apply { file } => {
            let content = std::fs::read_to_string(&file)?;
            let doc: ScheduleDocument = serde_json::from_str(&content)?;
            let name = config.general.schedule.clone();
            if !store.exists(&name) {
                return Err(format!("schedule '{name}' not found").into());
            }
            OverrideManager::write_override(&mut store, &mut config, &name, &doc)?;
            println!("override active for '{name}' until next start");
        }
        OverrideAction::Restore => {
            if OverrideManager::revert(&mut store, &mut config)? {
                println!("schedule restored");
            } else {
                println!("no override active");
            }
        }
    }
    Ok(())
}
