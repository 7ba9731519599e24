use crate::transport::Discovery;

/// A known wireless accessory. `uuid` is the stable identity the registry and
/// the transport backend key on; `selected` is maintained by the store, never
/// by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub uuid: String,
    pub name: String,
    pub address: String,
    pub selected: bool,
}

impl Device {
    pub fn from_discovery(discovery: &Discovery) -> Self {
        Device {
            uuid: discovery.uuid.clone(),
            name: discovery.name.clone(),
            address: discovery.address.clone(),
            selected: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    NoDevice,
    DeviceSelected,
    DeviceReady,
}

impl std::fmt::Display for DeviceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let result = match self {
            DeviceState::NoDevice => "NO_DEVICE",
            DeviceState::DeviceSelected => "DEVICE_SELECTED",
            DeviceState::DeviceReady => "DEVICE_READY",
        };

        write!(f, "{}", result)
    }
}

/// What the user asked to connect to. Empty strings are treated as absent, so
/// a `Target` with neither side set never matches anything and is rejected
/// before a scan starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    name: Option<String>,
    address: Option<String>,
}

impl Target {
    pub fn new(name: Option<String>, address: Option<String>) -> Self {
        Target {
            name: name.filter(|v| !v.is_empty()),
            address: address.filter(|v| !v.is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none()
    }

    /// A candidate matches when its name equals the target name or its
    /// address equals the target address; an absent side does not participate.
    pub fn matches(&self, discovery: &Discovery) -> bool {
        self.name.as_deref().is_some_and(|name| name == discovery.name)
            || self.address.as_deref().is_some_and(|address| address == discovery.address)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}
