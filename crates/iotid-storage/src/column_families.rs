//! RocksDB column family definitions.

/// Organizations: organization_id → Organization
pub const CF_ORGANIZATIONS: &str = "organizations";

/// Organizations by name: name → organization_id
pub const CF_ORGANIZATIONS_BY_NAME: &str = "organizations_by_name";

/// Devices: device_id → Enrollment
pub const CF_DEVICES: &str = "devices";

/// Devices by natural key: (brand, model, serial_number) → device_id
pub const CF_DEVICES_BY_NATURAL_KEY: &str = "devices_by_natural_key";

/// Devices by organization index: (organization_id, device_id) → ()
pub const CF_DEVICES_BY_ORGANIZATION: &str = "devices_by_organization";

/// Devices by serial number index: (serial_number, device_id) → ()
pub const CF_DEVICES_BY_SERIAL: &str = "devices_by_serial";

/// Get all column family names
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        CF_ORGANIZATIONS,
        CF_ORGANIZATIONS_BY_NAME,
        CF_DEVICES,
        CF_DEVICES_BY_NATURAL_KEY,
        CF_DEVICES_BY_ORGANIZATION,
        CF_DEVICES_BY_SERIAL,
    ]
}
