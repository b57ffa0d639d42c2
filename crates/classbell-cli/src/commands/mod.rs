pub mod config;
pub mod overrides;
pub mod schedule;
pub mod status;
pub mod watch;

use classbell_core::{ClassBell, Config, FsScheduleStore, SystemClock};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Config and store from the data directory.
pub fn open() -> Result<(Config, FsScheduleStore), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let store = FsScheduleStore::open()?;
    Ok((config, store))
}

pub fn bell() -> Result<ClassBell<FsScheduleStore, SystemClock>, Box<dyn std::error::Error>> {
    let (config, store) = open()?;
    Ok(ClassBell::new(config, store, SystemClock))
}
