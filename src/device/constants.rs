use uuid::Uuid;

/**
 * How long (seconds) a scan may run before giving up, unless overridden by
 * flag or config.
 */
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 15;

/**
 * The UUID of the Bluetooth BLE scratch service advertised by the accessory;
 * used as the scan filter.
 */
pub const BEAN_SCRATCH_SERVICE: &str = "a495ff10-c5b1-4b44-b512-1370f02d74de";

pub fn make_bean_service_uuid() -> Uuid {
    Uuid::parse_str(BEAN_SCRATCH_SERVICE).unwrap()
}
