//! Cooperative handling of `SIGINT`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use exn::{Exn, ResultExt as _};
use signal_hook::consts::SIGINT;
use signal_hook::flag;
use tracing::debug;

use crate::error::{ErrorMessage, Interrupted};

/// Shared flag that is raised once the user asks to stop.
///
/// The walkers check it before every file, so an interrupt aborts the run between two files and
/// is propagated instead of being counted.
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    /// Listen for `SIGINT` for the rest of the process lifetime.
    ///
    /// A second `SIGINT` arriving while the first one is still pending terminates the process
    /// right away.
    pub fn install() -> Result<Self, Exn<ErrorMessage>> {
        let err = || ErrorMessage::new("Could not listen to process signals");

        let interrupt = Self::default();
        // registered first, so it sees the flag before the second handler sets it
        flag::register_conditional_shutdown(SIGINT, 130, Arc::clone(&interrupt.0)).or_raise(err)?;
        flag::register(SIGINT, Arc::clone(&interrupt.0)).or_raise(err)?;
        Ok(interrupt)
    }

    /// Raise the flag by hand.
    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether an interrupt is pending.
    pub fn is_pending(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Fail with [`Interrupted`] if an interrupt is pending.
    pub fn check(&self) -> Result<(), Exn<Interrupted>> {
        match self.is_pending() {
            true => {
                debug!("interrupt is pending, stop processing");
                Err(Exn::new(Interrupted))
            }
            false => Ok(()),
        }
    }
}
