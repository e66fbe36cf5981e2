//! Concurrent enumeration of the three WAN connection service variants

use super::types::{CandidateSet, RouterError};
use crate::igd::{BoxedConnection, DeviceFinder, ServiceVariant, UpnpError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Enumerate all three service variants concurrently
///
/// The three enumerations are spawned before any of them is awaited. The
/// first failure ends the wait and fails the whole probe; the other tasks are
/// detached rather than aborted and finish (or time out) on their own.
/// Cancelling `cancel` ends the wait the same way.
pub async fn probe_variants<F: DeviceFinder>(
    finder: Arc<F>,
    cancel: &CancellationToken,
) -> Result<CandidateSet<BoxedConnection>, RouterError> {
    let ip2 = spawn_find(&finder, ServiceVariant::WanIpConnection2);
    let ip1 = spawn_find(&finder, ServiceVariant::WanIpConnection1);
    let ppp1 = spawn_find(&finder, ServiceVariant::WanPppConnection1);

    let joined = async {
        tokio::try_join!(
            join_slot(ServiceVariant::WanIpConnection2, ip2),
            join_slot(ServiceVariant::WanIpConnection1, ip1),
            join_slot(ServiceVariant::WanPppConnection1, ppp1)
        )
    };

    tokio::select! {
        _ = cancel.cancelled() => {
            debug!("Router probe cancelled");
            Err(RouterError::Cancelled)
        }
        result = joined => {
            let (ip2, ip1, ppp1) = result?;
            Ok(CandidateSet { ip2, ip1, ppp1 })
        }
    }
}

fn spawn_find<F: DeviceFinder>(
    finder: &Arc<F>,
    variant: ServiceVariant,
) -> JoinHandle<Result<Vec<BoxedConnection>, UpnpError>> {
    let finder = Arc::clone(finder);
    tokio::spawn(async move { finder.find(variant).await })
}

async fn join_slot(
    variant: ServiceVariant,
    handle: JoinHandle<Result<Vec<BoxedConnection>, UpnpError>>,
) -> Result<Vec<BoxedConnection>, RouterError> {
    match handle.await {
        Ok(Ok(found)) => {
            debug!("Found {} {} device(s)", found.len(), variant);
            Ok(found)
        }
        Ok(Err(source)) => {
            debug!("{} enumeration failed: {}", variant, source);
            Err(RouterError::Discovery { variant, source })
        }
        Err(e) => Err(RouterError::Internal(format!("Task join error: {}", e))),
    }
}
