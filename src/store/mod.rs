pub mod actions;
pub mod device_store;

pub use actions::Action;
pub use device_store::{Channel, DeviceStore, ListenerToken};
