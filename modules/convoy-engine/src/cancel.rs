use crate::error::EngineError;
use std::sync::atomic::{AtomicBool, Ordering};

/// Single choke point for observing cancellation. Called at every phase
/// boundary and before every per-item network call in the importer, so no
/// call site can drift from the convention.
pub fn check_cancelled(cancel: &AtomicBool, log: &dyn Fn(&str)) -> Result<(), EngineError> {
    if cancel.load(Ordering::SeqCst) {
        log("Migration cancelled by user");
        Err(EngineError::Cancelled)
    } else {
        Ok(())
    }
}
