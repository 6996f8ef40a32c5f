//! Typed profile events emitted by the wireless protocol engine
//!
//! Each event family carries its own parameters, so handlers receive owned,
//! fully-formed values instead of a byte blob plus a fix-up pass.

use serde::{Deserialize, Serialize};

/// Bluetooth device address
pub type PeerAddress = [u8; 6];

/// Link state shared by the A2DP and AVRCP connection events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// A2DP stream state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioState {
    Suspended,
    Started,
}

/// Audio sink profile events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum A2dpEvent {
    ConnectionState {
        peer: PeerAddress,
        state: ConnectionState,
    },
    AudioState {
        peer: PeerAddress,
        state: AudioState,
    },
    AudioConfig {
        peer: PeerAddress,
        sample_rate: u32,
        channels: u8,
    },
    ProfileState {
        initialized: bool,
    },
    SinkServiceCapability {
        protection_required: bool,
    },
    SetDelayValue {
        delay_value: u16,
        accepted: bool,
    },
    GetDelayValue {
        delay_value: u16,
    },
    /// Event the bridge does not route
    Unsupported {
        code: u16,
    },
}

impl A2dpEvent {
    /// Numeric id passed to the handler as `event_id`
    pub fn code(&self) -> u16 {
        match self {
            Self::ConnectionState { .. } => 0,
            Self::AudioState { .. } => 1,
            Self::AudioConfig { .. } => 2,
            Self::ProfileState { .. } => 4,
            Self::SinkServiceCapability { .. } => 5,
            Self::SetDelayValue { .. } => 6,
            Self::GetDelayValue { .. } => 7,
            Self::Unsupported { code } => *code,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }
}

/// Remote control (controller role) events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AvrcControllerEvent {
    ConnectionState {
        peer: PeerAddress,
        connected: bool,
    },
    PassthroughResponse {
        key_code: u8,
        key_state: u8,
        response_code: u8,
    },
    /// Track metadata; `text` is owned, the engine's buffer is not referenced
    Metadata {
        attr_id: u8,
        text: String,
    },
    ChangeNotify {
        event_id: u8,
        value: u32,
    },
    RemoteFeatures {
        features: u32,
        target_features: u16,
    },
    GetCapabilitiesResponse {
        capability_count: u8,
        event_mask: u16,
    },
    Unsupported {
        code: u16,
    },
}

impl AvrcControllerEvent {
    pub fn code(&self) -> u16 {
        match self {
            Self::ConnectionState { .. } => 0,
            Self::PassthroughResponse { .. } => 1,
            Self::Metadata { .. } => 2,
            Self::ChangeNotify { .. } => 5,
            Self::RemoteFeatures { .. } => 6,
            Self::GetCapabilitiesResponse { .. } => 7,
            Self::Unsupported { code } => *code,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }
}

/// Remote control (target role) events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AvrcTargetEvent {
    ConnectionState {
        peer: PeerAddress,
        connected: bool,
    },
    RemoteFeatures {
        features: u32,
        controller_features: u16,
    },
    PassthroughCommand {
        key_code: u8,
        key_state: u8,
    },
    SetAbsoluteVolume {
        volume: u8,
    },
    RegisterNotification {
        event_id: u8,
        event_parameter: u32,
    },
    SetPlayerAppValue {
        attr_id: u8,
        attr_value: u8,
    },
    Unsupported {
        code: u16,
    },
}

impl AvrcTargetEvent {
    pub fn code(&self) -> u16 {
        match self {
            Self::ConnectionState { .. } => 0,
            Self::RemoteFeatures { .. } => 1,
            Self::PassthroughCommand { .. } => 2,
            Self::SetAbsoluteVolume { .. } => 4,
            Self::RegisterNotification { .. } => 5,
            Self::SetPlayerAppValue { .. } => 6,
            Self::Unsupported { code } => *code,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }
}

/// Any routed profile event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProfileEvent {
    A2dp(A2dpEvent),
    AvrcController(AvrcControllerEvent),
    AvrcTarget(AvrcTargetEvent),
}

impl ProfileEvent {
    pub fn code(&self) -> u16 {
        match self {
            Self::A2dp(e) => e.code(),
            Self::AvrcController(e) => e.code(),
            Self::AvrcTarget(e) => e.code(),
        }
    }

    /// Short profile label used in log fields
    pub fn profile(&self) -> &'static str {
        match self {
            Self::A2dp(_) => "a2dp",
            Self::AvrcController(_) => "avrc_ct",
            Self::AvrcTarget(_) => "avrc_tg",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_code_passthrough() {
        let event = A2dpEvent::Unsupported { code: 42 };
        assert_eq!(event.code(), 42);
        assert!(!event.is_supported());
    }

    #[test]
    fn test_profile_event_code_and_label() {
        let event = ProfileEvent::AvrcController(AvrcControllerEvent::Metadata {
            attr_id: 1,
            text: "Title".to_string(),
        });
        assert_eq!(event.code(), 2);
        assert_eq!(event.profile(), "avrc_ct");
    }

    #[test]
    fn test_event_json_shape() {
        let event = AvrcTargetEvent::SetAbsoluteVolume { volume: 64 };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"SetAbsoluteVolume":{"volume":64}}"#);
    }
}
