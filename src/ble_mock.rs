use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::ble::{BleAdapter, BleDeviceInfo, BleServiceInfo, CharacteristicHandle};
use crate::error::BleError;
use crate::permissions::{Permission, PermissionChecker, PermissionRequester};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockCharacteristic {
    pub uuid: String,
    pub value: Vec<u8>,
}

impl MockCharacteristic {
    pub fn new(uuid: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            uuid: uuid.into(),
            value,
        }
    }
}

impl CharacteristicHandle for MockCharacteristic {
    fn uuid(&self) -> &str {
        &self.uuid
    }
}

#[derive(Clone, Debug, Default)]
pub struct MockService {
    pub uuid: String,
    pub characteristics: Vec<MockCharacteristic>,
    pub descriptors: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MockPeripheral {
    pub address: String,
    pub name: String,
    pub bonded: bool,
    pub services: Vec<MockService>,
}

impl MockPeripheral {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// In-memory stand-in for the platform stack.
#[derive(Debug, Default)]
pub struct MockBleAdapter {
    pub peripherals: Vec<Arc<MockPeripheral>>,
    pub connected: HashSet<String>,
    pub bonded: HashSet<String>,
    pub written: HashMap<String, Vec<u8>>,
    pub scan_count: usize,
    /// Returned by `discover_services` while set.
    pub fail_discovery: Option<BleError>,
}

impl MockBleAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_data() -> Self {
        let heart_rate = MockService {
            uuid: "0000180d-0000-1000-8000-00805f9b34fb".to_string(),
            characteristics: vec![
                MockCharacteristic::new("00002a37-0000-1000-8000-00805f9b34fb", vec![0x00, 0x48]),
                MockCharacteristic::new("00002a38-0000-1000-8000-00805f9b34fb", vec![0x01]),
            ],
            descriptors: vec!["00002902-0000-1000-8000-00805f9b34fb".to_string()],
        };
        let battery = MockService {
            uuid: "0000180f-0000-1000-8000-00805f9b34fb".to_string(),
            characteristics: vec![MockCharacteristic::new(
                "00002a19-0000-1000-8000-00805f9b34fb",
                vec![87],
            )],
            descriptors: Vec::new(),
        };

        let mut adapter = Self::new();
        adapter.add_peripheral(MockPeripheral {
            services: vec![heart_rate, battery],
            ..MockPeripheral::new("AA:BB:CC:DD:EE:FF", "Widget")
        });
        adapter.add_peripheral(MockPeripheral {
            bonded: true,
            ..MockPeripheral::new("11:22:33:44:55:66", "Thermometer")
        });
        adapter
    }

    pub fn add_peripheral(&mut self, peripheral: MockPeripheral) {
        if peripheral.bonded {
            self.bonded.insert(peripheral.address.clone());
        }
        self.peripherals.push(Arc::new(peripheral));
    }

    fn find(&self, address: &str) -> Result<&Arc<MockPeripheral>, BleError> {
        self.peripherals
            .iter()
            .find(|p| p.address == address)
            .ok_or_else(|| BleError::device_not_found(address))
    }

    fn info(peripheral: &Arc<MockPeripheral>) -> BleDeviceInfo<MockPeripheral> {
        BleDeviceInfo {
            address: peripheral.address.clone(),
            name: peripheral.name.clone(),
            details: Arc::clone(peripheral),
        }
    }
}

impl BleAdapter for MockBleAdapter {
    type DeviceHandle = MockPeripheral;
    type ServiceHandle = String;
    type CharacteristicHandle = MockCharacteristic;
    type DescriptorHandle = String;

    fn scan(&mut self, _timeout_ms: u32) -> Result<Vec<BleDeviceInfo<MockPeripheral>>, BleError> {
        self.scan_count += 1;
        Ok(self.peripherals.iter().map(Self::info).collect())
    }

    fn bonded_devices(&mut self) -> Result<Vec<BleDeviceInfo<MockPeripheral>>, BleError> {
        Ok(self
            .peripherals
            .iter()
            .filter(|p| self.bonded.contains(&p.address))
            .map(Self::info)
            .collect())
    }

    fn connect(&mut self, address: &str) -> Result<(), BleError> {
        self.find(address)?;
        self.connected.insert(address.to_string());
        Ok(())
    }

    fn disconnect(&mut self, address: &str) -> Result<(), BleError> {
        self.find(address)?;
        self.connected.remove(address);
        Ok(())
    }

    fn pair(&mut self, address: &str) -> Result<(), BleError> {
        self.find(address)?;
        self.bonded.insert(address.to_string());
        Ok(())
    }

    fn unpair(&mut self, address: &str) -> Result<(), BleError> {
        self.find(address)?;
        self.bonded.remove(address);
        Ok(())
    }

    fn discover_services(&mut self, address: &str) -> Result<Vec<BleServiceInfo<Self>>, BleError> {
        if let Some(err) = &self.fail_discovery {
            return Err(err.clone());
        }
        if !self.connected.contains(address) {
            return Err(BleError::generic(format!("{address} is not connected")));
        }
        let peripheral = self.find(address)?;
        Ok(peripheral
            .services
            .iter()
            .map(|s| BleServiceInfo {
                service: Arc::new(s.uuid.clone()),
                characteristics: s.characteristics.clone(),
                descriptors: s.descriptors.clone(),
            })
            .collect())
    }

    fn read_characteristic(
        &mut self,
        characteristic: &MockCharacteristic,
    ) -> Result<Vec<u8>, BleError> {
        Ok(self
            .written
            .get(&characteristic.uuid)
            .cloned()
            .unwrap_or_else(|| characteristic.value.clone()))
    }

    fn write_characteristic(
        &mut self,
        characteristic: &MockCharacteristic,
        data: &[u8],
        _with_response: bool,
    ) -> Result<(), BleError> {
        self.written
            .insert(characteristic.uuid.clone(), data.to_vec());
        Ok(())
    }
}

/// Permission checker and requester backed by an in-memory grant set.
#[derive(Debug, Default)]
pub struct MockPermissionHost {
    granted: Mutex<HashSet<Permission>>,
    checks: Mutex<Vec<Permission>>,
    requests: Mutex<Vec<(Vec<Permission>, i32)>>,
}

impl MockPermissionHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_granted(permissions: &[Permission]) -> Self {
        let host = Self::new();
        for permission in permissions {
            host.grant(*permission);
        }
        host
    }

    pub fn grant(&self, permission: Permission) {
        self.granted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(permission);
    }

    pub fn checks(&self) -> Vec<Permission> {
        self.checks.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn requests(&self) -> Vec<(Vec<Permission>, i32)> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl PermissionChecker for MockPermissionHost {
    fn check(&self, permission: Permission) -> bool {
        self.checks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(permission);
        self.granted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&permission)
    }
}

impl PermissionRequester for MockPermissionHost {
    fn request(&self, permissions: Vec<Permission>, request_code: i32) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((permissions, request_code));
    }
}
