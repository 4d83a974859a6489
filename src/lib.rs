//! InHome Gateway - Device and policy management API
//!
//! This library provides the backend the InHome web front end talks to:
//! - Device registry (register, rename, remove, list)
//! - Policy registry (pairwise policies between named devices)
//! - Revision log polled by the routing engine
//! - HTTP API over both registries
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              Web front end / routing engine          │
//! └────────────────────┬────────────────────────────────┘
//!                      │ HTTP
//! ┌────────────────────▼────────────────────────────────┐
//! │                    API Gateway                       │
//! │  /v1/device-management │ /v1/policy-management │ ... │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   DeviceRegistry  │  PolicyRegistry  │  RevisionLog  │
//! │                SQLite (r2d2 pool)                    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod address;
pub mod api;
pub mod config;
pub mod db;
pub mod error;

pub use address::MacAddress;
pub use api::{ApiServer, ApiState};
pub use config::Config;
pub use db::{
    DbConn, DbPool, Device, DeviceRegistry, PeerDevice, Policy, PolicyRegistry, Revision,
    RevisionLog,
};
pub use error::{Error, Result};
