use std::fmt;
use std::sync::Arc;

use crate::error::BleError;

/// A characteristic handle that can report the UUID it was discovered under.
pub trait CharacteristicHandle {
    fn uuid(&self) -> &str;
}

/// A peripheral as reported by the platform stack, before it is wrapped in a
/// [`Device`](crate::models::Device).
pub struct BleDeviceInfo<H> {
    pub address: String,
    pub name: String,
    pub details: Arc<H>,
}

/// One service from a discovery pass with its attributes in discovery order.
pub struct BleServiceInfo<A: BleAdapter + ?Sized> {
    pub service: Arc<A::ServiceHandle>,
    pub characteristics: Vec<A::CharacteristicHandle>,
    pub descriptors: Vec<A::DescriptorHandle>,
}

/// The platform Bluetooth stack.
///
/// Implementations own the native handles and do the actual radio work; this
/// crate only wraps what they return. Unknown addresses must fail with
/// [`BleError::DeviceNotFound`].
pub trait BleAdapter {
    type DeviceHandle: fmt::Debug;
    type ServiceHandle: fmt::Debug;
    type CharacteristicHandle: CharacteristicHandle + Clone + fmt::Debug;
    type DescriptorHandle: Clone + fmt::Debug;

    fn scan(
        &mut self,
        timeout_ms: u32,
    ) -> Result<Vec<BleDeviceInfo<Self::DeviceHandle>>, BleError>;
    fn bonded_devices(&mut self) -> Result<Vec<BleDeviceInfo<Self::DeviceHandle>>, BleError>;

    fn connect(&mut self, address: &str) -> Result<(), BleError>;
    fn disconnect(&mut self, address: &str) -> Result<(), BleError>;
    fn pair(&mut self, address: &str) -> Result<(), BleError>;
    fn unpair(&mut self, address: &str) -> Result<(), BleError>;

    fn discover_services(&mut self, address: &str) -> Result<Vec<BleServiceInfo<Self>>, BleError>;

    fn read_characteristic(
        &mut self,
        characteristic: &Self::CharacteristicHandle,
    ) -> Result<Vec<u8>, BleError>;
    fn write_characteristic(
        &mut self,
        characteristic: &Self::CharacteristicHandle,
        data: &[u8],
        with_response: bool,
    ) -> Result<(), BleError>;
}
