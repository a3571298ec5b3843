// # dnsrecon-core
//
// Reconciliation core for keeping provider-hosted DNS zones in sync with a
// desired state.
//
// ## Architecture Overview
//
// - **Model**: DNS sets, record sets and ownership attributes (`model`)
// - **Mapping**: encoding of the virtual `META` type as TXT comment records
// - **Selection**: which hosted zones and domains a provider account serves
// - **Execution**: turning change requests into provider calls
// - **DnsHandler**: per-account entry point, assembled by `StandardHandler`
// - **ProviderRegistry**: plugin-based registry of handler factories
//
// ## Design Principles
//
// 1. **Pure core**: model, mapping and selection never fail and do no I/O
// 2. **Narrow provider seam**: bindings only implement `ProviderAccess`
// 3. **Per-request outcomes**: a failing request never aborts its batch
// 4. **Library-First**: the daemon is a thin consumer of this crate

pub mod cache;
pub mod change;
pub mod config;
pub mod error;
pub mod execution;
pub mod handler;
pub mod inmemory;
pub mod mapping;
pub mod metrics;
pub mod model;
pub mod ratelimit;
pub mod raw;
pub mod registry;
pub mod selection;
pub mod traits;
pub mod zone;

// Re-export core types for convenience
pub use change::{ChangeAction, ChangeRequest};
pub use config::{HandlerConfig, ProviderConfig, ProviderSpec, SelectionFilter};
pub use error::{Error, Result};
pub use handler::StandardHandler;
pub use model::{DnsSet, DnsSetName, DnsSets, Record, RecordSet, RecordType};
pub use registry::ProviderRegistry;
pub use selection::{calc_zone_and_domain_selection, SelectionResult};
pub use traits::{DnsHandler, DnsHandlerFactory, DoneHandler, ProviderAccess, ZoneStateCache};
pub use zone::{HostedZone, ZoneId, ZoneState};
