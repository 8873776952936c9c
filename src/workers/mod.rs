//! Long-running background tasks: key-pool replenishment and expired-paste
//! reaping. Both run on a ticker and stop when the shutdown signal flips.

pub mod keygen;
pub mod reaper;

pub use keygen::{KeygenConfig, KeygenWorker};
pub use reaper::{Reaper, ReaperConfig};
