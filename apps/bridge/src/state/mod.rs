//! # State Module
//!
//! Manages application state for the bridge.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────┐        ┌──────────────────────────┐      │
//! │  │      BudgetState         │        │       AppConfig          │      │
//! │  │                          │        │                          │      │
//! │  │  Arc<Mutex<BudgetEngine>>│        │  [rates]                 │      │
//! │  │  Arc<Mutex<Markup>>      │        │  [budget]                │      │
//! │  │                          │        │  [display]               │      │
//! │  └──────────────────────────┘        └──────────────────────────┘      │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • BudgetState: shared by the IPC loop and the rate fetch task         │
//! │  • AppConfig: Read-only after initialization                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod budget;
mod config;
mod rate;

pub use budget::BudgetState;
pub use config::{
    AppConfig, BudgetSettings, ConfigError, ConfigResult, DisplaySettings, CONFIG_PATH_ENV,
};
pub use rate::initialize_exchange_rate;
