use futures::StreamExt;
use log::{debug, info};
use tokio::time::{sleep, Duration};

use crate::device::types::{Device, Target};
use crate::error::{ConnectError, TransportError};
use crate::transport::Transport;

/// Scan for a device matching `target`, connect to it, and resolve its
/// services. The first matching candidate wins; if `timeout` elapses first
/// the attempt fails with `NotFound`.
///
/// Every exit path stops the scan. There are no internal retries; a caller
/// that wants another attempt starts a fresh `connect`.
pub async fn connect<T: Transport>(
    transport: &mut T,
    target: &Target,
    timeout: Duration,
) -> Result<Device, ConnectError> {
    if target.is_empty() {
        return Err(ConnectError::InvalidTarget);
    }

    // Subscribe before the scan starts, so a candidate discovered immediately
    // cannot fall into the gap.
    let mut events = transport.discovery_events().await?;
    transport.start_scan().await?;

    let deadline = sleep(timeout);
    tokio::pin!(deadline);

    let discovery = loop {
        tokio::select! {
            biased;

            _ = &mut deadline => {
                transport.stop_scan().await?;
                return Err(not_found(target));
            },
            event = events.next() => match event {
                Some(discovery) if target.matches(&discovery) => break discovery,
                Some(discovery) => {
                    debug!("Ignoring non-matching device {}/{}", discovery.name, discovery.address);
                },
                None => {
                    transport.stop_scan().await?;
                    return Err(TransportError::Closed.into());
                },
            },
        }
    };

    info!("Found device with name/address: {}/{}", discovery.name, discovery.address);

    // The race is over; release the radio and suppress further discovery
    // callbacks before touching the peripheral.
    transport.stop_scan().await?;
    drop(events);

    transport
        .connect_device(&discovery.uuid)
        .await
        .map_err(|source| ConnectError::ConnectionFailed { source })?;

    transport
        .lookup_services(&discovery.uuid)
        .await
        .map_err(|source| ConnectError::ServiceLookupFailed { source })?;

    Ok(Device::from_discovery(&discovery))
}

fn not_found(target: &Target) -> ConnectError {
    ConnectError::NotFound {
        name: target.name().unwrap_or_default().to_string(),
        address: target.address().unwrap_or_default().to_string(),
    }
}
