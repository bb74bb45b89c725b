use std::fmt;
use std::sync::Arc;

use crate::ble::{BleAdapter, CharacteristicHandle};
use crate::error::BleError;

/// A discovered or bonded BLE peripheral.
///
/// `details` is the platform-native device object. It stays owned by the
/// adapter and is never mutated through this record; the `Arc` is a shared
/// handle, so holding a `Device` keeps the native object alive.
pub struct Device<A: BleAdapter + ?Sized> {
    address: String,
    name: String,
    details: Arc<A::DeviceHandle>,
    services: Vec<GattService<A>>,
}

impl<A: BleAdapter + ?Sized> Device<A> {
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        details: Arc<A::DeviceHandle>,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            details,
            services: Vec::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn details(&self) -> &Arc<A::DeviceHandle> {
        &self.details
    }

    pub fn services(&self) -> &[GattService<A>] {
        &self.services
    }

    /// Swap in the result of a fresh discovery pass, dropping the previous tree.
    pub fn replace_services(&mut self, services: Vec<GattService<A>>) {
        self.services = services;
    }

    pub fn clear_services(&mut self) {
        self.services.clear();
    }

    /// Find a characteristic by UUID across every attached service.
    pub fn characteristic(&self, uuid: &str) -> Result<&A::CharacteristicHandle, BleError> {
        self.services
            .iter()
            .flat_map(|service| service.characteristics())
            .find(|c| c.uuid().eq_ignore_ascii_case(uuid))
            .ok_or_else(|| BleError::characteristic_not_found(uuid))
    }

    pub fn debug_form(&self) -> String {
        format!("{self:?}")
    }
}

impl<A: BleAdapter + ?Sized> Clone for Device<A> {
    fn clone(&self) -> Self {
        Self {
            address: self.address.clone(),
            name: self.name.clone(),
            details: Arc::clone(&self.details),
            services: self.services.clone(),
        }
    }
}

impl<A: BleAdapter + ?Sized> fmt::Display for Device<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.address, self.name)
    }
}

impl<A: BleAdapter + ?Sized> fmt::Debug for Device<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Device({}, {})", self.address, self.name)
    }
}

/// A GATT service and the attributes found under it.
///
/// The characteristic and descriptor lists are filled once per discovery pass.
pub struct GattService<A: BleAdapter + ?Sized> {
    service: Arc<A::ServiceHandle>,
    characteristics: Vec<A::CharacteristicHandle>,
    descriptors: Vec<A::DescriptorHandle>,
    populated: bool,
}

impl<A: BleAdapter + ?Sized> GattService<A> {
    pub fn new(service: Arc<A::ServiceHandle>) -> Self {
        Self {
            service,
            characteristics: Vec::new(),
            descriptors: Vec::new(),
            populated: false,
        }
    }

    pub fn populate(
        &mut self,
        characteristics: Vec<A::CharacteristicHandle>,
        descriptors: Vec<A::DescriptorHandle>,
    ) -> Result<(), BleError> {
        if self.populated {
            return Err(BleError::generic(
                "service attributes were already populated for this discovery pass",
            ));
        }
        self.characteristics = characteristics;
        self.descriptors = descriptors;
        self.populated = true;
        Ok(())
    }

    pub fn service(&self) -> &Arc<A::ServiceHandle> {
        &self.service
    }

    pub fn characteristics(&self) -> &[A::CharacteristicHandle] {
        &self.characteristics
    }

    pub fn descriptors(&self) -> &[A::DescriptorHandle] {
        &self.descriptors
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }
}

impl<A: BleAdapter + ?Sized> Clone for GattService<A> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            characteristics: self.characteristics.clone(),
            descriptors: self.descriptors.clone(),
            populated: self.populated,
        }
    }
}

impl<A: BleAdapter + ?Sized> fmt::Debug for GattService<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GattService")
            .field("service", &self.service)
            .field("characteristics", &self.characteristics)
            .field("descriptors", &self.descriptors)
            .finish()
    }
}
