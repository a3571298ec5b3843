//! Core traits of the reconciliation core
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`ProviderAccess`]: narrow CRUD capability of a provider binding
//! - [`DnsHandler`]: per-account reconciliation entry point
//! - [`ZoneStateCache`]: cached zones and zone states
//! - [`DoneHandler`]: per-request completion callbacks

pub mod access;
pub mod done;
pub mod handler;
pub mod zone_cache;

pub use access::{dns_sets_from_records, ProviderAccess, ProviderRecord, RecordFilter};
pub use done::DoneHandler;
pub use handler::{DnsHandler, DnsHandlerFactory};
pub use zone_cache::{ZoneSource, ZoneStateCache};
