use futures::StreamExt;
use serde_json;
use tokio::time::{sleep, Duration};

use crate::config::ConfigIO;
use crate::device::connection;
use crate::device::types::{Device, Target};
use crate::dispatch::Dispatcher;
use crate::error::{CliError, StoreError};
use crate::store::{Action, DeviceStore};
use crate::transport::Transport;

/// Run a bounded discovery pass, feeding every candidate into the store, then
/// print the resulting registry.
pub async fn scan<T: Transport>(
    transport: &mut T,
    dispatcher: &Dispatcher<Action, StoreError>,
    store: &DeviceStore,
    timeout: Duration,
) -> Result<(), CliError> {
    let mut events = transport.discovery_events().await?;
    transport.start_scan().await?;

    let deadline = sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            biased;

            _ = &mut deadline => break,
            event = events.next() => match event {
                Some(discovery) => {
                    println!(
                        "Found device with name/address: {}/{}",
                        discovery.name, discovery.address,
                    );
                    let device = Device::from_discovery(&discovery);
                    dispatcher.publish(Action::DeviceFound { device })?;
                },
                None => break,
            },
        }
    }

    transport.stop_scan().await?;
    drop(events);

    let devices = store.devices();
    if devices.is_empty() {
        println!("No devices found");
    } else {
        println!("Discovered {} device(s):", devices.len());
        for device in devices {
            println!("  {}  {}  {}", device.uuid, device.name, device.address);
        }
    }

    Ok(())
}

/// Resolve `target` through the coordinator, then drive the store through
/// found, selected, and ready.
pub async fn connect<T: Transport>(
    transport: &mut T,
    dispatcher: &Dispatcher<Action, StoreError>,
    store: &DeviceStore,
    target: &Target,
    timeout: Duration,
) -> Result<(), CliError> {
    let device = connection::connect(transport, target, timeout).await?;
    println!(
        "Found device with name/address: {}/{}",
        device.name, device.address,
    );

    let uuid = device.uuid.clone();
    dispatcher.publish(Action::DeviceFound { device })?;
    dispatcher.publish(Action::SelectDevice { uuid })?;
    dispatcher.publish(Action::DeviceReady)?;

    println!("Connected!");
    let selected = store.selected_device()?;
    println!(
        "Selected device {} ({}), state: {}",
        selected.name,
        selected.address,
        store.device_state(),
    );

    Ok(())
}

pub async fn config_init(config_io: &ConfigIO) -> Result<(), CliError> {
    let config = crate::config::Config::default();
    config_io.save(&config).await?;
    println!("Wrote default config to {}", config_io.path().to_string_lossy());
    Ok(())
}

pub async fn config_show(config_io: &ConfigIO) -> Result<(), CliError> {
    let config = config_io.read().await?;
    let content = serde_json::to_string_pretty(&config)
        .map_err(crate::error::ConfigError::from)?;
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::types::DeviceState;
    use crate::transport::mock::{discovery, MockTransport};

    fn wiring() -> (Dispatcher<Action, StoreError>, DeviceStore) {
        let dispatcher = Dispatcher::new();
        let store = DeviceStore::new();
        store.attach(&dispatcher);
        (dispatcher, store)
    }

    #[tokio::test(start_paused = true)]
    async fn scan_fills_the_store_and_stops_the_scan() {
        let (dispatcher, store) = wiring();
        let mut transport = MockTransport::new()
            .discover_after(Duration::from_secs(1), discovery("A", "bean1", "aa:bb"))
            .discover_after(Duration::from_secs(1), discovery("B", "bean2", "cc:dd"));

        scan(&mut transport, &dispatcher, &store, Duration::from_secs(5))
            .await
            .unwrap();

        let devices = store.devices();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].uuid, "A");
        assert_eq!(devices[1].uuid, "B");
        assert_eq!(transport.start_scan_calls, 1);
        assert_eq!(transport.stop_scan_calls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scan_deduplicates_repeated_candidates() {
        let (dispatcher, store) = wiring();
        let mut transport = MockTransport::new()
            .discover_after(Duration::from_secs(1), discovery("A", "bean1", "aa:bb"))
            .discover_after(Duration::from_secs(1), discovery("A", "bean1", "aa:bb"));

        scan(&mut transport, &dispatcher, &store, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(store.devices().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn connect_drives_the_store_to_ready() {
        let (dispatcher, store) = wiring();
        let mut transport = MockTransport::new()
            .discover_after(Duration::from_secs(1), discovery("A", "bean1", "aa:bb"));
        let target = Target::new(Some("bean1".to_string()), None);

        connect(&mut transport, &dispatcher, &store, &target, Duration::from_secs(5))
            .await
            .unwrap();

        let selected = store.selected_device().unwrap();
        assert_eq!(selected.uuid, "A");
        assert!(selected.selected);
        assert_eq!(store.device_state(), DeviceState::DeviceReady);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_leaves_the_store_untouched() {
        let (dispatcher, store) = wiring();
        let mut transport = MockTransport::new();
        let target = Target::new(Some("bean1".to_string()), None);

        let result = connect(&mut transport, &dispatcher, &store, &target, Duration::from_secs(5)).await;

        assert!(result.is_err());
        assert!(store.devices().is_empty());
        assert_eq!(store.device_state(), DeviceState::NoDevice);
    }
}
