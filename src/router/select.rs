//! Router selection
//!
//! Picks exactly one handle out of the probe results. A variant qualifies
//! only when exactly one device implements it; variants are tried in
//! priority order WANIPConnection:2, WANIPConnection:1, WANPPPConnection:1.
//! Networks with several gateways advertising the same variant are refused
//! for that variant rather than guessed at.

use super::client::RouterClient;
use super::probe::probe_variants;
use super::types::{CandidateSet, RouterError};
use crate::igd::{DeviceFinder, ServiceVariant};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Pick the sole handle of the highest-priority variant with exactly one candidate
///
/// The result depends only on the three sequence lengths; the returned
/// handle is the only element of the chosen sequence.
pub fn select_router<T>(mut candidates: CandidateSet<T>) -> Result<(ServiceVariant, T), RouterError> {
    let counts = candidates.counts();

    ServiceVariant::PRIORITY
        .into_iter()
        .find_map(|variant| sole(candidates.take(variant)).map(|handle| (variant, handle)))
        .ok_or(RouterError::AmbiguousOrNoRouter { counts })
}

fn sole<T>(mut handles: Vec<T>) -> Option<T> {
    if handles.len() == 1 { handles.pop() } else { None }
}

/// Probe the network and return a client for the selected router
pub async fn discover_and_select_router<F: DeviceFinder>(
    finder: Arc<F>,
    cancel: &CancellationToken,
) -> Result<RouterClient, RouterError> {
    let candidates = probe_variants(finder, cancel).await?;
    info!("Discovery finished ({})", candidates.counts());

    let (variant, connection) = select_router(candidates)?;
    info!("Selected {} router at {}", variant, connection.url_base());

    Ok(RouterClient::new(connection))
}
