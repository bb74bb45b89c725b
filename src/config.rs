use crate::permissions::PERMISSION_REQUEST_CODE;

pub const DEFAULT_SCAN_TIMEOUT_MS: u32 = 5_000;

/// Settings for a [`BleClient`](crate::client::BleClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Platform API level reported by the host, used to pick the permission set.
    pub api_level: i32,
    pub scan_timeout_ms: u32,
    pub permission_request_code: i32,
}

impl ClientConfig {
    pub fn new(api_level: i32) -> Self {
        Self {
            api_level,
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT_MS,
            permission_request_code: PERMISSION_REQUEST_CODE,
        }
    }

    pub fn with_scan_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.scan_timeout_ms = timeout_ms;
        self
    }

    pub fn with_permission_request_code(mut self, request_code: i32) -> Self {
        self.permission_request_code = request_code;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::new(33);
        assert_eq!(config.api_level, 33);
        assert_eq!(config.scan_timeout_ms, 5_000);
        assert_eq!(config.permission_request_code, 101);
    }

    #[test]
    fn test_overrides() {
        let config = ClientConfig::new(29)
            .with_scan_timeout_ms(12_000)
            .with_permission_request_code(7);
        assert_eq!(config.scan_timeout_ms, 12_000);
        assert_eq!(config.permission_request_code, 7);
    }
}
