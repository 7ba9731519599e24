//! Scripted transport for tests and transport-free development. Records every
//! call in order so tests can assert on what the coordinator actually did.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::time::{sleep, Duration};

use crate::error::TransportError;
use crate::transport::{Discovery, DiscoveryStream, Transport};

pub fn discovery(uuid: &str, name: &str, address: &str) -> Discovery {
    Discovery {
        uuid: uuid.to_string(),
        name: name.to_string(),
        address: address.to_string(),
    }
}

#[derive(Default)]
pub struct MockTransport {
    script: Vec<(Duration, Discovery)>,
    close_after_script: bool,
    start_scan_error: Option<TransportError>,
    connect_error: Option<TransportError>,
    lookup_error: Option<TransportError>,

    /// Method names in invocation order.
    pub calls: Vec<&'static str>,
    pub start_scan_calls: usize,
    pub stop_scan_calls: usize,
    pub connected: Vec<String>,
    pub looked_up: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport::default()
    }

    /// Schedule a discovery event `delay` after the stream is polled.
    /// Delays accumulate in script order.
    pub fn discover_after(mut self, delay: Duration, discovery: Discovery) -> Self {
        self.script.push((delay, discovery));
        self
    }

    /// End the discovery stream once the script runs out, instead of staying
    /// pending like a live backend.
    pub fn close_after_script(mut self) -> Self {
        self.close_after_script = true;
        self
    }

    pub fn fail_start_scan(mut self, error: TransportError) -> Self {
        self.start_scan_error = Some(error);
        self
    }

    pub fn fail_connect(mut self, error: TransportError) -> Self {
        self.connect_error = Some(error);
        self
    }

    pub fn fail_lookup(mut self, error: TransportError) -> Self {
        self.lookup_error = Some(error);
        self
    }
}

#[async_trait(?Send)]
impl Transport for MockTransport {
    async fn discovery_events(&mut self) -> Result<DiscoveryStream, TransportError> {
        self.calls.push("discovery_events");

        let script = self.script.clone();
        let scripted = stream::iter(script).then(|(delay, discovery)| async move {
            sleep(delay).await;
            discovery
        });

        if self.close_after_script {
            Ok(scripted.boxed_local())
        } else {
            Ok(scripted.chain(stream::pending()).boxed_local())
        }
    }

    async fn start_scan(&mut self) -> Result<(), TransportError> {
        self.calls.push("start_scan");
        self.start_scan_calls += 1;
        match self.start_scan_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn stop_scan(&mut self) -> Result<(), TransportError> {
        self.calls.push("stop_scan");
        self.stop_scan_calls += 1;
        Ok(())
    }

    async fn connect_device(&mut self, uuid: &str) -> Result<(), TransportError> {
        self.calls.push("connect_device");
        self.connected.push(uuid.to_string());
        match self.connect_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn lookup_services(&mut self, uuid: &str) -> Result<(), TransportError> {
        self.calls.push("lookup_services");
        self.looked_up.push(uuid.to_string());
        match self.lookup_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
