//! Defines shared data structures for the Bluetooth module.

/// Represents a discovered Bluetooth device
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiscoveredDevice {
    /// Platform-specific unique identifier for the device (especially important on macOS)
    pub id: String,
    /// The advertised name of the device
    pub name: String,
    /// The signal strength (RSSI) of the device at first sighting, if reported
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    /// Creates a new DiscoveredDevice instance
    pub fn new(id: String, name: String, rssi: Option<i16>) -> Self {
        Self { id, name, rssi }
    }

    /// Returns true if the advertised name contains the given fragment
    pub fn matches_name(&self, fragment: &str) -> bool {
        self.name.contains(fragment)
    }
}

/// A (service, characteristic) pair flagged readable during enumeration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReadableCharacteristic {
    /// UUID of the service the characteristic belongs to
    pub service: String,
    /// UUID of the characteristic itself
    pub characteristic: String,
}

/// Connection session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum SessionState {
    /// No active connection
    Idle,
    /// A connect request has been issued
    Connecting,
    /// Connection established, discovery pending
    Connected,
    /// Walking the service/characteristic tree
    Enumerating,
    /// Enumeration complete; reads are valid
    Ready,
}

/// Result of a characteristic read.
///
/// The three variants are deliberately distinct: `ValueAbsent` means the read
/// itself succeeded but the peripheral returned no payload, while `Failed`
/// covers transport errors (including reading with no active session). Neither
/// is surfaced as an `Err` to the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum ReadOutcome {
    /// Decoded textual value
    Value(String),
    /// Read succeeded but the payload was empty
    ValueAbsent,
    /// Transport-level failure, already logged
    Failed,
}

impl ReadOutcome {
    /// Returns the decoded value, if any
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(v) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// A single advertisement sighting as reported by the transport
#[derive(Debug, Clone)]
pub struct Advertisement {
    /// Stable device identifier
    pub id: String,
    /// Advertised name, if the advertisement carried one
    pub name: Option<String>,
    /// Signal strength, if reported
    pub rssi: Option<i16>,
}

/// One event on the scan result channel
#[derive(Debug)]
pub enum ScanEvent {
    /// A peripheral was sighted
    Discovered(Advertisement),
    /// The transport reported a per-result error; scanning continues
    Error(crate::core::bluetooth::error::TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    // The observable state types are what a front-end consumes; they have to
    // stay JSON-friendly.
    #[test]
    fn observable_state_serializes_to_json() {
        let device = DiscoveredDevice::new("id-1".into(), "CASIO GM-B2100".into(), Some(-42));
        let json = serde_json::to_value(&device).unwrap();
        assert_eq!(json["id"], "id-1");
        assert_eq!(json["rssi"], -42);

        let entry = ReadableCharacteristic {
            service: "svc".into(),
            characteristic: "ch".into(),
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"service":"svc","characteristic":"ch"}"#
        );

        assert_eq!(
            serde_json::to_string(&SessionState::Ready).unwrap(),
            r#""Ready""#
        );
    }

    #[test]
    fn name_matching_is_substring_based() {
        let device = DiscoveredDevice::new("id-1".into(), "my CASIO GM-B2100 watch".into(), None);
        assert!(device.matches_name("CASIO GM-B2100"));
        assert!(!device.matches_name("GM-B2200"));
    }
}
