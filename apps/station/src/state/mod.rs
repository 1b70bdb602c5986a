//! # State Module
//!
//! The coordinator that owns every store handle for one station.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  CLI command                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      GateContext                                │   │
//! │  │                                                                 │   │
//! │  │  ScanProcessor   ResetController   StatsAggregator              │   │
//! │  │  CooldownGate    latest StatsSnapshot                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                          │                                      │
//! │       ▼                          ▼                                      │
//! │  TokenStore / ScanLogStore    Database (pool)                          │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Store operations are serialized through one async lock              │
//! │  • The cooldown gate and snapshot sit behind their own locks           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod context;

pub use context::{GateContext, GateSettings};
