//! Command: show the latest exclusion list.
use anyhow::Result;

use super::CommandSetup;
use crate::cli::GlobalOpts;
use crate::logging::Logger;

/// Run the history command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded or the latest exclusion
/// list cannot be read.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, |_| {}, log)?;
    let (path, excluded) = setup.history_store().load_latest()?;

    let Some(path) = path else {
        log.info(&format!(
            "No exclusion list in {}",
            setup.settings.work_dir.display()
        ));
        return Ok(());
    };
    log.info(&format!("Latest exclusion list: {}", path.display()));
    log.info(&format!("{} excluded casks", excluded.len()));
    for token in excluded.iter() {
        println!("{token}");
    }
    Ok(())
}
