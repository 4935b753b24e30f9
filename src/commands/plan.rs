//! Command: show the manifest an install would attempt.
use anyhow::Result;

use super::{CommandSetup, select};
use crate::cli::GlobalOpts;
use crate::index;
use crate::logging::Logger;

/// Run the plan command.
///
/// Prints the tokens an install would attempt, one per line on stdout.
/// Nothing is installed and no file is written.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, the index cannot be
/// fetched, or the history cannot be read.
pub fn run(global: &GlobalOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, |_| {}, log)?;
    let source = index::source_for(&setup.settings.index);
    let selection = select(
        &setup.settings,
        &setup.history_store(),
        source.as_ref(),
        log,
    )?;

    log.stage("Plan");
    log.info(&format!("Casks in index:         {}", selection.indexed));
    log.info(&format!("Matching category:      {}", selection.in_category));
    log.info(&format!("Excluded (failed):      {}", selection.excluded()));
    log.info(&format!("To install:             {}", selection.manifest.len()));
    if !selection.retired.is_empty() {
        log.info(&format!("Retired upstream:       {}", selection.retired.len()));
        for token in &selection.retired {
            log.debug(&format!("retired: {token}"));
        }
    }
    for token in selection.manifest.tokens() {
        println!("{token}");
    }
    Ok(())
}
