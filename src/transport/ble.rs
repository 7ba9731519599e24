use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use btleplug::api::{Central, CentralEvent, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use log::{info, warn};

use crate::device::constants::make_bean_service_uuid;
use crate::error::TransportError;
use crate::transport::{Discovery, DiscoveryStream, Transport};

/// btleplug-backed transport. Uses the first available adapter and caches
/// discovered peripherals by uuid so `connect_device` / `lookup_services`
/// can resolve the live handle.
pub struct BleTransport {
    adapter: Adapter,
    peripherals: Rc<RefCell<HashMap<String, Peripheral>>>,
    scanning: bool,
}

impl BleTransport {
    pub async fn new() -> Result<Self, TransportError> {
        let manager = Manager::new().await?;
        let adapter = manager
            .adapters()
            .await?
            .into_iter()
            .next()
            .ok_or(TransportError::NoAdapter)?;

        Ok(BleTransport {
            adapter,
            peripherals: Rc::new(RefCell::new(HashMap::new())),
            scanning: false,
        })
    }

    fn peripheral(&self, uuid: &str) -> Result<Peripheral, TransportError> {
        self.peripherals
            .borrow()
            .get(uuid)
            .cloned()
            .ok_or_else(|| TransportError::UnknownPeripheral { uuid: uuid.to_string() })
    }
}

#[async_trait(?Send)]
impl Transport for BleTransport {
    async fn discovery_events(&mut self) -> Result<DiscoveryStream, TransportError> {
        let events = self.adapter.events().await?;
        let adapter = self.adapter.clone();
        let peripherals = Rc::clone(&self.peripherals);
        let service_uuid = make_bean_service_uuid();

        let stream = events
            .filter_map(move |event| {
                let adapter = adapter.clone();
                let peripherals = Rc::clone(&peripherals);
                async move {
                    let CentralEvent::DeviceDiscovered(id) = event else {
                        return None;
                    };

                    let peripheral = match adapter.peripheral(&id).await {
                        Ok(peripheral) => peripheral,
                        Err(err) => {
                            warn!("Failed to resolve discovered peripheral: {:?}", err);
                            return None;
                        },
                    };

                    let properties = match peripheral.properties().await {
                        Ok(Some(properties)) => properties,
                        Ok(None) => {
                            warn!("Peripheral has no properties");
                            return None;
                        },
                        Err(err) => {
                            warn!("Could not query peripheral for properties: {:?}", err);
                            return None;
                        },
                    };

                    // Some environments ignore the filter, so make sure to check the service uuid again
                    if !properties.services.contains(&service_uuid) {
                        return None;
                    }

                    let uuid = id.to_string();
                    peripherals.borrow_mut().insert(uuid.clone(), peripheral);

                    Some(Discovery {
                        uuid,
                        name: properties.local_name.unwrap_or_default(),
                        address: properties.address.to_string(),
                    })
                }
            })
            .boxed_local();

        Ok(stream)
    }

    async fn start_scan(&mut self) -> Result<(), TransportError> {
        let filter = ScanFilter {
            services: vec![make_bean_service_uuid()],
        };

        info!(
            "Scanning using adapter {}...",
            self.adapter.adapter_info().await.unwrap_or("UNKNOWN".to_string()),
        );
        self.adapter.start_scan(filter).await?;
        self.scanning = true;
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<(), TransportError> {
        if !self.scanning {
            return Ok(());
        }

        self.adapter.stop_scan().await?;
        self.scanning = false;
        Ok(())
    }

    async fn connect_device(&mut self, uuid: &str) -> Result<(), TransportError> {
        let peripheral = self.peripheral(uuid)?;
        info!("Connecting to peripheral...");
        peripheral.connect().await?;
        Ok(())
    }

    async fn lookup_services(&mut self, uuid: &str) -> Result<(), TransportError> {
        let peripheral = self.peripheral(uuid)?;
        info!("Connected; Discovering services...");
        peripheral.discover_services().await?;
        Ok(())
    }
}
