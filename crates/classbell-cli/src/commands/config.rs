use clap::Subcommand;
use classbell_core::Config;

use super::CliResult;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "general.schedule", "toast.prepare_minutes")
        key: String,
    },
    /// Set a config value; an empty value clears optional keys
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    let mut config = Config::load()?;
    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            for key in Config::keys() {
                let value = config.get(&key).unwrap_or_default();
                println!("{key} = {value}");
            }
        }
        ConfigAction::Reset => {
            config.reset()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
