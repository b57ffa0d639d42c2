use chrono::{Datelike, Local};
use clap::Subcommand;
use classbell_core::schedule::lesson_at;
use classbell_core::{OverrideManager, ScheduleDocument, ScheduleStore, TimelineResolver};

use super::CliResult;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// List schedule documents
    List,
    /// Show a document's day plan
    Show {
        /// Document name (default: the active one)
        name: Option<String>,
        /// Weekday to show, 0 = Monday (default: today)
        #[arg(long)]
        weekday: Option<u8>,
        /// Print the raw document as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a document from the built-in sample
    Init {
        #[arg(default_value = "default")]
        name: String,
        /// Overwrite an existing document
        #[arg(long)]
        force: bool,
    },
    /// Import a document from a JSON file
    Import {
        name: String,
        file: std::path::PathBuf,
    },
    /// Make a document the active one
    Use { name: String },
}

pub fn run(action: ScheduleAction) -> CliResult {
    let (mut config, mut store) = super::open()?;
    match action {
        ScheduleAction::List => {
            for name in store.list_available()? {
                let marker = if name == config.general.schedule { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        ScheduleAction::Show { name, weekday, json } => {
            let name = name.unwrap_or_else(|| config.general.schedule.clone());
            let doc = store.load(&name)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }
            let today = Local::now().date_naive();
            let weekday = match weekday {
                Some(day) if day > 6 => return Err(format!("weekday {day} out of range (0-6)").into()),
                Some(day) => day,
                None => today.weekday().num_days_from_monday() as u8,
            };
            print_day(&doc, weekday, today, &config);
        }
        ScheduleAction::Init { name, force } => {
            if store.exists(&name) && !force {
                return Err(format!("schedule '{name}' already exists (use --force)").into());
            }
            store.save(&name, &ScheduleDocument::sample())?;
            println!("created schedule '{name}'");
        }
        ScheduleAction::Import { name, file } => {
            let content = std::fs::read_to_string(&file)?;
            let doc: ScheduleDocument = serde_json::from_str(&content)?;
            store.save(&name, &doc)?;
            println!("imported schedule '{name}'");
        }
        ScheduleAction::Use { name } => {
            if !store.exists(&name) {
                return Err(format!("schedule '{name}' not found").into());
            }
            config.write("general", "schedule", &name)?;
            println!("using schedule '{name}'");
        }
    }
    Ok(())
}

fn print_day(
    doc: &ScheduleDocument,
    weekday: u8,
    today: chrono::NaiveDate,
    config: &classbell_core::Config,
) {
    let day = TimelineResolver::new(config.general.time_offset).resolve(doc, today, weekday);
    let lessons = OverrideManager::lessons_for(doc, weekday, today, config);
    if day.is_empty() {
        println!("No schedule");
        return;
    }
    for (index, part) in day.parts.iter().enumerate() {
        let label = doc.part_label(&part.id).unwrap_or(part.id.as_str());
        println!("{} {label}", part.start.format("%H:%M"));
        for window in day.windows(index) {
            let name = match window.segment.lesson_ordinal {
                Some(ordinal) => lesson_at(lessons, ordinal),
                None => "-".to_string(),
            };
            println!(
                "  {}-{}  {:<5} {name}",
                window.start.format("%H:%M"),
                window.end.format("%H:%M"),
                window.segment.id
            );
        }
    }
}
