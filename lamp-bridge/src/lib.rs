//! # lampsync-bridge
//!
//! Keeps a set of switched loads in step with their state on a oneM2M
//! platform.
//!
//! The bridge:
//! - Pulls each actuator's latest content instance once at startup
//! - Accepts pushed notifications afterwards and applies them as they arrive
//! - Drives one output line per actuator, low until told otherwise
//!
//! ## Architecture
//!
//! ```text
//!   oneM2M CSE
//!     │   ▲
//!     │   │ GET .../la   (boot sweep, one at a time)
//!     │   │
//!     │ POST notify      ┌──────────────────────────────┐
//!     └─────────────────►│        lampsync-bridge       │
//!                        │  ┌────────────────────────┐  │
//!                        │  │ Reconciler (lamp-core) │  │
//!                        │  └───────────┬────────────┘  │
//!                        └──────────────┼───────────────┘
//!                                       ▼
//!                                 output lines
//! ```
//!
//! ## Endpoints
//!
//! - `POST {notify_path}`: notification receiver
//! - `GET /health`: liveness and boot state
//! - `GET /actuators`: current level of every actuator
//! - `GET /metrics`: Prometheus counters (optional)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod driver;
pub mod error;
pub mod fetch;
pub mod http;
pub mod pull;
pub mod server;
