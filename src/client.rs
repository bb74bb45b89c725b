//! Client session over a platform adapter.
//!
//! Every scan, connect, pair and unpair first runs the permission gate. While
//! permissions are missing those calls return [`Gated::AwaitingPermissions`]
//! and leave the adapter untouched; the caller checks again once the
//! platform reports the user's decision.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::ble::{BleAdapter, BleDeviceInfo};
use crate::config::ClientConfig;
use crate::error::BleError;
use crate::models::{Device, GattService};
use crate::permissions::{
    PermissionChecker, PermissionGate, PermissionReport, PermissionRequester,
};

/// Result of an operation that needs runtime permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Gated<T> {
    Ready(T),
    AwaitingPermissions(PermissionReport),
}

impl<T> Gated<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Gated::Ready(value) => Some(value),
            Gated::AwaitingPermissions(_) => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Gated::Ready(_))
    }
}

pub struct BleClient<A: BleAdapter> {
    adapter: A,
    checker: Arc<dyn PermissionChecker>,
    requester: Arc<dyn PermissionRequester>,
    gate: PermissionGate,
    config: ClientConfig,
}

impl<A: BleAdapter> BleClient<A> {
    pub fn new(
        adapter: A,
        config: ClientConfig,
        checker: Arc<dyn PermissionChecker>,
        requester: Arc<dyn PermissionRequester>,
    ) -> Self {
        Self {
            gate: PermissionGate::with_request_code(config.permission_request_code),
            adapter,
            checker,
            requester,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn permission_gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn ensure_permissions(&mut self) -> Result<PermissionReport, BleError> {
        self.gate.ensure_permissions(
            self.config.api_level,
            &*self.checker,
            &*self.requester,
        )
    }

    /// Scan for nearby peripherals for the configured timeout.
    pub fn discover(&mut self) -> Result<Gated<Vec<Device<A>>>, BleError> {
        let report = self.ensure_permissions()?;
        if !report.granted() {
            return Ok(Gated::AwaitingPermissions(report));
        }

        info!(timeout_ms = self.config.scan_timeout_ms, "starting BLE scan");
        let found = self.adapter.scan(self.config.scan_timeout_ms)?;
        debug!(count = found.len(), "BLE scan finished");
        Ok(Gated::Ready(found.into_iter().map(wrap_device::<A>).collect()))
    }

    /// Peripherals the platform already has a bond with.
    pub fn bonded_devices(&mut self) -> Result<Gated<Vec<Device<A>>>, BleError> {
        let report = self.ensure_permissions()?;
        if !report.granted() {
            return Ok(Gated::AwaitingPermissions(report));
        }

        let bonded = self.adapter.bonded_devices()?;
        debug!(count = bonded.len(), "loaded bonded devices");
        Ok(Gated::Ready(bonded.into_iter().map(wrap_device::<A>).collect()))
    }

    /// Connect and run service discovery, replacing the device's service tree.
    pub fn connect(&mut self, device: &mut Device<A>) -> Result<Gated<()>, BleError> {
        let report = self.ensure_permissions()?;
        if !report.granted() {
            return Ok(Gated::AwaitingPermissions(report));
        }

        info!(address = device.address(), "connecting");
        self.adapter.connect(device.address())?;

        let discovered = match self.adapter.discover_services(device.address()) {
            Ok(discovered) => discovered,
            Err(err) => {
                warn!(address = device.address(), %err, "service discovery failed");
                device.clear_services();
                match self.adapter.disconnect(device.address()) {
                    Ok(()) => debug!(
                        address = device.address(),
                        "disconnected after failed discovery"
                    ),
                    Err(disconnect_err) => warn!(
                        address = device.address(),
                        %disconnect_err,
                        "disconnect after failed discovery also failed"
                    ),
                }
                return Err(err);
            }
        };

        let mut services = Vec::with_capacity(discovered.len());
        for info in discovered {
            let mut service = GattService::new(info.service);
            service.populate(info.characteristics, info.descriptors)?;
            services.push(service);
        }
        debug!(
            address = device.address(),
            services = services.len(),
            "service discovery finished"
        );
        device.replace_services(services);
        Ok(Gated::Ready(()))
    }

    pub fn disconnect(&mut self, device: &mut Device<A>) -> Result<(), BleError> {
        info!(address = device.address(), "disconnecting");
        self.adapter.disconnect(device.address())?;
        device.clear_services();
        Ok(())
    }

    pub fn pair(&mut self, address: &str) -> Result<Gated<()>, BleError> {
        let report = self.ensure_permissions()?;
        if !report.granted() {
            return Ok(Gated::AwaitingPermissions(report));
        }

        info!(address, "pairing");
        self.adapter.pair(address)?;
        Ok(Gated::Ready(()))
    }

    pub fn unpair(&mut self, address: &str) -> Result<Gated<()>, BleError> {
        let report = self.ensure_permissions()?;
        if !report.granted() {
            return Ok(Gated::AwaitingPermissions(report));
        }

        info!(address, "unpairing");
        self.adapter.unpair(address)?;
        Ok(Gated::Ready(()))
    }

    pub fn read_gatt_char(&mut self, device: &Device<A>, uuid: &str) -> Result<Vec<u8>, BleError> {
        let characteristic = device.characteristic(uuid)?;
        self.adapter.read_characteristic(characteristic)
    }

    pub fn write_gatt_char(
        &mut self,
        device: &Device<A>,
        uuid: &str,
        data: &[u8],
        with_response: bool,
    ) -> Result<(), BleError> {
        let characteristic = device.characteristic(uuid)?;
        debug!(uuid, len = data.len(), with_response, "writing characteristic");
        self.adapter
            .write_characteristic(characteristic, data, with_response)
    }
}

fn wrap_device<A: BleAdapter>(info: BleDeviceInfo<A::DeviceHandle>) -> Device<A> {
    Device::new(info.address, info.name, info.details)
}
