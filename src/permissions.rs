//! Runtime permission policy for BLE scanning and connecting.
//!
//! Which permissions the platform wants before a scan depends on its API
//! level. Levels 23 through 30 gate scanning behind location access, newer
//! levels have dedicated Bluetooth permissions, and older levels grant
//! everything at install time.
//!
//! # Example
//!
//! ```
//! use bleekware_core::permissions::{required_permissions, Permission};
//!
//! assert!(required_permissions(22).unwrap().is_empty());
//! assert_eq!(
//!     required_permissions(29).unwrap(),
//!     &[Permission::AccessFineLocation]
//! );
//! assert_eq!(
//!     required_permissions(33).unwrap(),
//!     &[Permission::BluetoothScan, Permission::BluetoothConnect]
//! );
//! assert!(required_permissions(-1).unwrap().is_empty());
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::error::BleError;

/// Request code handed to the platform with every permission request.
pub const PERMISSION_REQUEST_CODE: i32 = 101;

/// A runtime permission the platform may require for BLE access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Also covers coarse location.
    AccessFineLocation,
    BluetoothScan,
    BluetoothConnect,
}

impl Permission {
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Permission::AccessFineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Permission::BluetoothScan => "android.permission.BLUETOOTH_SCAN",
            Permission::BluetoothConnect => "android.permission.BLUETOOTH_CONNECT",
        }
    }
}

struct PolicyRange {
    min: i32,
    max: i32,
    permissions: &'static [Permission],
}

// Ranges must stay disjoint and cover every level.
const POLICY: &[PolicyRange] = &[
    PolicyRange {
        min: i32::MIN,
        max: 22,
        permissions: &[],
    },
    PolicyRange {
        min: 23,
        max: 30,
        permissions: &[Permission::AccessFineLocation],
    },
    PolicyRange {
        min: 31,
        max: i32::MAX,
        permissions: &[Permission::BluetoothScan, Permission::BluetoothConnect],
    },
];

/// Permissions to hold before any scan or connect at this API level.
pub fn required_permissions(api_level: i32) -> Result<&'static [Permission], BleError> {
    lookup(POLICY, api_level)
}

fn lookup(table: &[PolicyRange], api_level: i32) -> Result<&'static [Permission], BleError> {
    table
        .iter()
        .find(|range| (range.min..=range.max).contains(&api_level))
        .map(|range| range.permissions)
        .ok_or_else(|| {
            error!(api_level, "no permission policy covers this API level");
            BleError::UnmappedApiLevel(api_level)
        })
}

/// Synchronous grant query against the platform.
pub trait PermissionChecker: Send + Sync {
    fn check(&self, permission: Permission) -> bool;
}

/// Fire-and-forget permission request. The outcome arrives through a platform
/// callback this crate does not observe.
pub trait PermissionRequester: Send + Sync {
    fn request(&self, permissions: Vec<Permission>, request_code: i32);
}

// Lets a caller keep its own handle to a host it has handed to a client.
impl<T: PermissionChecker + ?Sized> PermissionChecker for Arc<T> {
    fn check(&self, permission: Permission) -> bool {
        (**self).check(permission)
    }
}

impl<T: PermissionRequester + ?Sized> PermissionRequester for Arc<T> {
    fn request(&self, permissions: Vec<Permission>, request_code: i32) {
        (**self).request(permissions, request_code)
    }
}

/// Outcome of one permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionReport {
    pub api_level: i32,
    pub required: Vec<Permission>,
    pub denied: Vec<Permission>,
    /// Whether a request was sent to the platform during this check.
    pub requested: bool,
}

impl PermissionReport {
    pub fn granted(&self) -> bool {
        self.denied.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GateState {
    #[default]
    Unchecked,
    Checked,
}

/// Tracks whether permissions have been evaluated and sends requests for
/// anything missing.
#[derive(Debug, Clone)]
pub struct PermissionGate {
    state: GateState,
    request_code: i32,
    last_report: Option<PermissionReport>,
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PermissionGate {
    pub fn new() -> Self {
        Self::with_request_code(PERMISSION_REQUEST_CODE)
    }

    pub fn with_request_code(request_code: i32) -> Self {
        Self {
            state: GateState::Unchecked,
            request_code,
            last_report: None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn request_code(&self) -> i32 {
        self.request_code
    }

    pub fn last_report(&self) -> Option<&PermissionReport> {
        self.last_report.as_ref()
    }

    /// Check every required permission and request the full set if any is
    /// missing. Never waits for the user's answer.
    pub fn ensure_permissions<C, R>(
        &mut self,
        api_level: i32,
        checker: &C,
        requester: &R,
    ) -> Result<PermissionReport, BleError>
    where
        C: PermissionChecker + ?Sized,
        R: PermissionRequester + ?Sized,
    {
        let required = required_permissions(api_level)?;

        // Query all of them so the report lists every missing permission.
        let denied: Vec<Permission> = required
            .iter()
            .copied()
            .filter(|permission| !checker.check(*permission))
            .collect();

        let requested = !denied.is_empty();
        if requested {
            info!(
                api_level,
                ?denied,
                request_code = self.request_code,
                "requesting BLE permissions"
            );
            requester.request(required.to_vec(), self.request_code);
        } else {
            debug!(api_level, ?required, "BLE permissions granted");
        }

        let report = PermissionReport {
            api_level,
            required: required.to_vec(),
            denied,
            requested,
        };
        self.state = GateState::Checked;
        self.last_report = Some(report.clone());
        Ok(report)
    }
}

/// One-shot check with the default request code.
pub fn ensure_permissions<C, R>(
    api_level: i32,
    checker: &C,
    requester: &R,
) -> Result<PermissionReport, BleError>
where
    C: PermissionChecker + ?Sized,
    R: PermissionRequester + ?Sized,
{
    PermissionGate::new().ensure_permissions(api_level, checker, requester)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble_mock::MockPermissionHost;

    #[test]
    fn test_table_boundaries() {
        assert!(required_permissions(0).unwrap().is_empty());
        assert!(required_permissions(22).unwrap().is_empty());
        assert_eq!(
            required_permissions(23).unwrap(),
            &[Permission::AccessFineLocation]
        );
        assert_eq!(
            required_permissions(30).unwrap(),
            &[Permission::AccessFineLocation]
        );
        assert_eq!(
            required_permissions(31).unwrap(),
            &[Permission::BluetoothScan, Permission::BluetoothConnect]
        );
        assert_eq!(
            required_permissions(i32::MAX).unwrap(),
            &[Permission::BluetoothScan, Permission::BluetoothConnect]
        );
    }

    #[test]
    fn test_table_ranges_are_disjoint() {
        for level in (-5..=40).chain([i32::MIN, i32::MAX]) {
            let matches = POLICY
                .iter()
                .filter(|range| (range.min..=range.max).contains(&level))
                .count();
            assert_eq!(matches, 1, "level {level} matched {matches} ranges");
        }
    }

    #[test]
    fn test_negative_levels_need_nothing() {
        for level in [i32::MIN, -1] {
            let host = MockPermissionHost::new();
            let report = ensure_permissions(level, &host, &host).unwrap();
            assert!(report.granted());
            assert!(!report.requested);
            assert!(report.required.is_empty());
            assert!(host.requests().is_empty());
        }
    }

    #[test]
    fn test_gap_in_table_fails_fast() {
        let table = [
            PolicyRange {
                min: 0,
                max: 22,
                permissions: &[],
            },
            PolicyRange {
                min: 31,
                max: i32::MAX,
                permissions: &[Permission::BluetoothScan, Permission::BluetoothConnect],
            },
        ];
        assert_eq!(lookup(&table, 27), Err(BleError::UnmappedApiLevel(27)));
        assert!(lookup(&table, 22).unwrap().is_empty());
        assert_eq!(lookup(&table, 31).unwrap().len(), 2);
    }

    #[test]
    fn test_location_levels_request_only_fine_location() {
        for level in 23..=30 {
            let host = MockPermissionHost::new();
            let report = ensure_permissions(level, &host, &host).unwrap();
            assert!(!report.granted());
            assert!(report.requested);
            assert_eq!(
                host.requests(),
                vec![(vec![Permission::AccessFineLocation], PERMISSION_REQUEST_CODE)]
            );
        }
    }

    #[test]
    fn test_new_levels_request_scan_and_connect() {
        for level in [31, 32, 33, 34, 35, 100] {
            let host = MockPermissionHost::new();
            ensure_permissions(level, &host, &host).unwrap();
            let requests = host.requests();
            assert_eq!(requests.len(), 1);
            assert_eq!(
                requests[0].0,
                vec![Permission::BluetoothScan, Permission::BluetoothConnect]
            );
            assert!(!requests[0].0.contains(&Permission::AccessFineLocation));
        }
    }

    #[test]
    fn test_old_levels_need_nothing() {
        for level in 0..23 {
            let host = MockPermissionHost::new();
            let report = ensure_permissions(level, &host, &host).unwrap();
            assert!(report.granted());
            assert!(!report.requested);
            assert!(report.required.is_empty());
            assert!(host.requests().is_empty());
        }
    }

    #[test]
    fn test_granted_permissions_are_not_requested() {
        let host = MockPermissionHost::with_granted(&[
            Permission::BluetoothScan,
            Permission::BluetoothConnect,
        ]);
        let report = ensure_permissions(33, &host, &host).unwrap();
        assert!(report.granted());
        assert!(!report.requested);
        assert!(host.requests().is_empty());
    }

    #[test]
    fn test_partial_grant_requests_full_set() {
        let host = MockPermissionHost::with_granted(&[Permission::BluetoothScan]);
        let report = ensure_permissions(31, &host, &host).unwrap();
        assert_eq!(report.denied, vec![Permission::BluetoothConnect]);
        assert_eq!(
            host.requests(),
            vec![(
                vec![Permission::BluetoothScan, Permission::BluetoothConnect],
                PERMISSION_REQUEST_CODE
            )]
        );
    }

    #[test]
    fn test_every_permission_is_checked() {
        let host = MockPermissionHost::new();
        ensure_permissions(31, &host, &host).unwrap();
        assert_eq!(
            host.checks(),
            vec![Permission::BluetoothScan, Permission::BluetoothConnect]
        );
    }

    #[test]
    fn test_gate_transitions_and_is_idempotent() {
        let host = MockPermissionHost::new();
        let mut gate = PermissionGate::with_request_code(7);
        assert_eq!(gate.state(), GateState::Unchecked);

        gate.ensure_permissions(29, &host, &host).unwrap();
        assert_eq!(gate.state(), GateState::Checked);
        assert_eq!(host.requests(), vec![(vec![Permission::AccessFineLocation], 7)]);

        // The platform callback grants it later.
        host.grant(Permission::AccessFineLocation);
        let report = gate.ensure_permissions(29, &host, &host).unwrap();
        assert!(report.granted());
        let report = gate.ensure_permissions(29, &host, &host).unwrap();
        assert!(report.granted());
        assert_eq!(host.requests().len(), 1);
        assert_eq!(gate.last_report(), Some(&report));
    }

    #[test]
    fn test_manifest_names() {
        assert_eq!(
            Permission::AccessFineLocation.manifest_name(),
            "android.permission.ACCESS_FINE_LOCATION"
        );
        assert_eq!(
            Permission::BluetoothScan.manifest_name(),
            "android.permission.BLUETOOTH_SCAN"
        );
        assert_eq!(
            Permission::BluetoothConnect.manifest_name(),
            "android.permission.BLUETOOTH_CONNECT"
        );
    }
}
