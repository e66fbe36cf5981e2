//! Per-variant device enumeration seam used by the router prober

use super::clients::{DiscoveryReport, WanIpConnection1Client, WanIpConnection2Client, WanPppConnection1Client};
use super::connection::{BoxedConnection, WanConnection};
use super::ssdp::SearchOptions;
use super::types::{ServiceVariant, UpnpError};
use async_trait::async_trait;
use tracing::warn;

/// Enumerates the devices implementing one WAN connection service variant
#[async_trait]
pub trait DeviceFinder: Send + Sync + 'static {
    /// Find every device implementing `variant`, possibly none
    async fn find(&self, variant: ServiceVariant) -> Result<Vec<BoxedConnection>, UpnpError>;
}

/// [`DeviceFinder`] backed by SSDP search and device description fetches
#[derive(Debug, Clone, Default)]
pub struct SsdpDeviceFinder {
    options: SearchOptions,
    lenient: bool,
}

impl SsdpDeviceFinder {
    /// Create a strict finder: any per-device failure fails the enumeration
    pub fn new(options: SearchOptions) -> Self {
        Self {
            options,
            lenient: false,
        }
    }

    /// Log and skip devices whose description cannot be read instead of failing
    pub fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    /// Apply the strictness policy to one variant's discovery report
    ///
    /// Strict: the first per-device error is returned and the clients are
    /// dropped. Lenient: every error is logged and the clients are kept.
    pub(crate) fn finish<T: WanConnection + 'static>(
        &self,
        variant: ServiceVariant,
        report: DiscoveryReport<T>,
    ) -> Result<Vec<BoxedConnection>, UpnpError> {
        let DiscoveryReport { clients, mut errors } = report;

        if !errors.is_empty() {
            if !self.lenient {
                return Err(errors.swap_remove(0));
            }
            for error in &errors {
                warn!("Skipping {} device: {}", variant, error);
            }
        }

        Ok(clients
            .into_iter()
            .map(|client| Box::new(client) as BoxedConnection)
            .collect())
    }
}

#[async_trait]
impl DeviceFinder for SsdpDeviceFinder {
    async fn find(&self, variant: ServiceVariant) -> Result<Vec<BoxedConnection>, UpnpError> {
        match variant {
            ServiceVariant::WanIpConnection1 => {
                let report = WanIpConnection1Client::discover(&self.options).await?;
                self.finish(variant, report)
            }
            ServiceVariant::WanIpConnection2 => {
                let report = WanIpConnection2Client::discover(&self.options).await?;
                self.finish(variant, report)
            }
            ServiceVariant::WanPppConnection1 => {
                let report = WanPppConnection1Client::discover(&self.options).await?;
                self.finish(variant, report)
            }
        }
    }
}
