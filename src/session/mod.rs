mod controller;
mod state;

pub use controller::{BlockingController, StartupReport, UNLOCK_PHRASE, confirm_unlock};
pub use state::BlockerStatus;
