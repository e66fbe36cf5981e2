//! Router discovery, selection and port mapping
//!
//! The flow for one invocation:
//! 1. Probe: enumerate WANIPConnection:2, WANIPConnection:1 and
//!    WANPPPConnection:1 devices concurrently
//! 2. Select: keep the sole device of the highest-priority variant that has
//!    exactly one
//! 3. Resolve the local address on the router's subnet (once)
//! 4. Forward or clear a port on TCP and UDP
//!
//! A selected [`RouterClient`] is used for the rest of the run; it is never
//! re-selected.

pub mod client;
pub mod local_ip;
pub mod probe;
pub mod select;
pub mod types;

pub use client::{RouterClient, LEASE_DURATION};
pub use local_ip::{find_local_ip, router_host_ip, InterfaceAddr, InterfaceSource, SystemInterfaces};
pub use probe::probe_variants;
pub use select::{discover_and_select_router, select_router};
pub use types::{CandidateCounts, CandidateSet, MappingOperation, RouterError};
