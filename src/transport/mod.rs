use async_trait::async_trait;
use futures::stream::LocalBoxStream;

use crate::error::TransportError;

pub mod ble;
pub mod mock;

pub use ble::BleTransport;
pub use mock::MockTransport;

/// Identity of a candidate reported during a scan, enough to match against a
/// `Target` and to resolve the live handle later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub uuid: String,
    pub name: String,
    pub address: String,
}

pub type DiscoveryStream = LocalBoxStream<'static, Discovery>;

/// The external SDK seam the coordinator drives. Live peripheral handles stay
/// behind this trait, keyed by the same stable uuid the registry uses.
#[async_trait(?Send)]
pub trait Transport {
    /// Subscribe to discovery events. Must be called before `start_scan` so
    /// an early candidate cannot fall into the gap.
    async fn discovery_events(&mut self) -> Result<DiscoveryStream, TransportError>;

    async fn start_scan(&mut self) -> Result<(), TransportError>;

    /// Idempotent; a second call is a no-op.
    async fn stop_scan(&mut self) -> Result<(), TransportError>;

    async fn connect_device(&mut self, uuid: &str) -> Result<(), TransportError>;

    /// Only valid after `connect_device` succeeded for the same uuid.
    async fn lookup_services(&mut self, uuid: &str) -> Result<(), TransportError>;
}
