//! # Station Engine
//!
//! Scan classification, resets, stats and the scan debounce gate.
//!
//! ```text
//! engine/
//! ├── mod.rs        ◄─── You are here (exports)
//! ├── processor.rs  ◄─── Received → {Invalid, Duplicate, Valid}
//! ├── cooldown.rs   ◄─── Debounce window after an accepted scan
//! ├── reset.rs      ◄─── Full / limited reset behind the admin password
//! └── stats.rs      ◄─── Summary figures recomputed from the stores
//! ```

pub mod cooldown;
pub mod processor;
pub mod reset;
pub mod stats;

pub use cooldown::CooldownGate;
pub use processor::{ScanProcessor, ScanReport};
pub use reset::{ResetController, ResetKind};
pub use stats::{StatsAggregator, StatsSnapshot};
