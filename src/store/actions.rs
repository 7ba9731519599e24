use crate::device::types::Device;

/// Immutable messages describing state-changing events, delivered to the
/// store through the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    DeviceFound { device: Device },
    ClearDevices,
    SelectDevice { uuid: String },
    /// The selected device is connected and service-resolved.
    DeviceReady,
}
