pub mod ble;
pub mod ble_mock;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod permissions;

uniffi::include_scaffolding!("bleekware");

pub use ble::{BleAdapter, BleDeviceInfo, BleServiceInfo, CharacteristicHandle};
pub use client::{BleClient, Gated};
pub use config::ClientConfig;
pub use error::BleError;
pub use models::{Device, GattService};
pub use permissions::{
    GateState, Permission, PermissionChecker, PermissionGate, PermissionReport,
    PermissionRequester, PERMISSION_REQUEST_CODE,
};

/// Permissions the host must hold at `api_level` before scanning or connecting.
pub fn required_permission_set(api_level: i32) -> Result<Vec<Permission>, BleError> {
    permissions::required_permissions(api_level).map(<[Permission]>::to_vec)
}

/// Check the host's grants and ask for whatever is missing.
pub fn request_missing_permissions(
    api_level: i32,
    checker: Box<dyn PermissionChecker>,
    requester: Box<dyn PermissionRequester>,
) -> Result<PermissionReport, BleError> {
    permissions::ensure_permissions(api_level, &*checker, &*requester)
}

/// Platform identifier string for `permission`, e.g. `android.permission.BLUETOOTH_SCAN`.
pub fn permission_manifest_name(permission: Permission) -> String {
    permission.manifest_name().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble_mock::MockPermissionHost;
    use std::sync::Arc;

    #[test]
    fn test_required_permission_set() {
        assert_eq!(
            required_permission_set(30).unwrap(),
            vec![Permission::AccessFineLocation]
        );
        assert_eq!(required_permission_set(-2), Ok(Vec::new()));
    }

    #[test]
    fn test_request_missing_permissions_with_boxed_host() {
        let host = Arc::new(MockPermissionHost::with_granted(&[Permission::BluetoothConnect]));
        let report =
            request_missing_permissions(32, Box::new(host.clone()), Box::new(host.clone()))
                .unwrap();
        assert_eq!(report.denied, vec![Permission::BluetoothScan]);
        assert!(report.requested);
        assert_eq!(
            host.requests(),
            vec![(
                vec![Permission::BluetoothScan, Permission::BluetoothConnect],
                PERMISSION_REQUEST_CODE
            )]
        );
    }

    #[test]
    fn test_permission_manifest_name() {
        assert_eq!(
            permission_manifest_name(Permission::BluetoothScan),
            "android.permission.BLUETOOTH_SCAN"
        );
    }
}
