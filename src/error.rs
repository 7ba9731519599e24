use std::io;
use std::str::Utf8Error;
use thiserror::Error;

use btleplug;
use serde_json;

/// Faults from the BLE backend, beneath the `Transport` seam.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Error communicating with device (btleplug): {source}")]
    Btle { #[from] source: btleplug::Error },

    #[error("No bluetooth adapter is available")]
    NoAdapter,

    #[error("No discovered peripheral with uuid {uuid}")]
    UnknownPeripheral { uuid: String },

    #[error("Discovery event stream ended unexpectedly")]
    Closed,
}

/// Terminal failures of a single `connect()` attempt. The coordinator never
/// retries; callers decide whether to start a fresh attempt.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("Please provide a device name or address")]
    InvalidTarget,

    #[error("No device found with name/address: {name}/{address}")]
    NotFound { name: String, address: String },

    #[error("Device connection failed: {source}")]
    ConnectionFailed { source: TransportError },

    #[error("Service lookup failed: {source}")]
    ServiceLookupFailed { source: TransportError },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Reportable conditions from the device store. A rejected action mutates
/// nothing.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No known device with uuid {uuid}")]
    UnknownDevice { uuid: String },

    #[error("No device is currently selected")]
    NotSelected,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to determine path to config file")]
    NoConfigPath,

    #[error("Failed to encode/decode config as utf-8: {source}")]
    Utf8Error { #[from] source: Utf8Error },

    #[error("Failed to read/write config file: {source}")]
    IOError { #[from] source: io::Error },

    #[error("Failed to parse/build config file: {source}")]
    JsonError { #[from] source: serde_json::Error },
}

/// Everything a command handler can fail with. The CLI maps any of these to
/// stderr text and exit code 1.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
