use serde::{Deserialize, Serialize};

use crate::domain::event::{
    InventoryEvent, InventoryItemUpdated, InventoryItemsGranted, InventoryItemsSubtracted,
};

/// 現在のイベントスキーマバージョン
pub const SCHEMA_VERSION: u32 = 1;

/// シリアライゼーションエラー
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),
    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchemaVersion(u32),
}

/// イベントエンベロープ
/// ワイヤ上のJSON表現。種別タグとスキーマバージョンを持つ
#[derive(Serialize, Deserialize)]
struct EventEnvelope {
    event_type: String,
    schema_version: u32,
    payload: serde_json::Value,
}

/// イベントシリアライザー
/// ドメインイベントとワイヤ表現（JSON）を相互変換する
pub struct EventSerializer;

impl EventSerializer {
    pub fn new() -> Self {
        Self
    }

    /// イベントをワイヤJSONにシリアライズ
    pub fn serialize_event(&self, event: &InventoryEvent) -> Result<String, SerializationError> {
        let payload = match event {
            InventoryEvent::InventoryItemsGranted(e) => serde_json::to_value(e),
            InventoryEvent::InventoryItemsSubtracted(e) => serde_json::to_value(e),
            InventoryEvent::InventoryItemUpdated(e) => serde_json::to_value(e),
        }
        .map_err(|e| SerializationError::SerializationFailed(e.to_string()))?;

        let envelope = EventEnvelope {
            event_type: event.event_type().to_string(),
            schema_version: SCHEMA_VERSION,
            payload,
        };

        serde_json::to_string(&envelope)
            .map_err(|e| SerializationError::SerializationFailed(e.to_string()))
    }

    /// ワイヤJSONからイベントをデシリアライズ
    pub fn deserialize_event(&self, json: &str) -> Result<InventoryEvent, SerializationError> {
        let envelope: EventEnvelope = serde_json::from_str(json)
            .map_err(|e| SerializationError::DeserializationFailed(e.to_string()))?;

        if envelope.schema_version > SCHEMA_VERSION {
            return Err(SerializationError::UnsupportedSchemaVersion(
                envelope.schema_version,
            ));
        }

        match envelope.event_type.as_str() {
            "InventoryItemsGranted" => {
                let event: InventoryItemsGranted = serde_json::from_value(envelope.payload)
                    .map_err(|e| SerializationError::DeserializationFailed(e.to_string()))?;
                Ok(InventoryEvent::InventoryItemsGranted(event))
            }
            "InventoryItemsSubtracted" => {
                let event: InventoryItemsSubtracted = serde_json::from_value(envelope.payload)
                    .map_err(|e| SerializationError::DeserializationFailed(e.to_string()))?;
                Ok(InventoryEvent::InventoryItemsSubtracted(event))
            }
            "InventoryItemUpdated" => {
                let event: InventoryItemUpdated = serde_json::from_value(envelope.payload)
                    .map_err(|e| SerializationError::DeserializationFailed(e.to_string()))?;
                Ok(InventoryEvent::InventoryItemUpdated(event))
            }
            other => Err(SerializationError::UnknownEventType(other.to_string())),
        }
    }
}

impl Default for EventSerializer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CatalogItemId, UserId};
    use uuid::Uuid;

    #[test]
    fn test_granted_event_round_trip() {
        let serializer = EventSerializer::new();
        let event =
            InventoryEvent::InventoryItemsGranted(InventoryItemsGranted::new(Uuid::new_v4()));

        let json = serializer.serialize_event(&event).unwrap();
        let deserialized = serializer.deserialize_event(&json).unwrap();

        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_subtracted_event_round_trip() {
        let serializer = EventSerializer::new();
        let event =
            InventoryEvent::InventoryItemsSubtracted(InventoryItemsSubtracted::new(Uuid::new_v4()));

        let json = serializer.serialize_event(&event).unwrap();
        let deserialized = serializer.deserialize_event(&json).unwrap();

        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_updated_event_round_trip() {
        let serializer = EventSerializer::new();
        let event = InventoryEvent::InventoryItemUpdated(InventoryItemUpdated::new(
            UserId::new(),
            CatalogItemId::new(),
            -3, // 負の合計もそのまま通知される
        ));

        let json = serializer.serialize_event(&event).unwrap();
        let deserialized = serializer.deserialize_event(&json).unwrap();

        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_envelope_carries_event_type_and_version() {
        let serializer = EventSerializer::new();
        let event =
            InventoryEvent::InventoryItemsGranted(InventoryItemsGranted::new(Uuid::new_v4()));

        let json = serializer.serialize_event(&event).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["event_type"], "InventoryItemsGranted");
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        let serializer = EventSerializer::new();
        let json = r#"{"event_type":"SomethingElse","schema_version":1,"payload":{}}"#;

        let result = serializer.deserialize_event(json);
        assert!(matches!(
            result,
            Err(SerializationError::UnknownEventType(_))
        ));
    }

    #[test]
    fn test_newer_schema_version_is_rejected() {
        let serializer = EventSerializer::new();
        let json = r#"{"event_type":"InventoryItemsGranted","schema_version":99,"payload":{}}"#;

        let result = serializer.deserialize_event(json);
        assert!(matches!(
            result,
            Err(SerializationError::UnsupportedSchemaVersion(99))
        ));
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let serializer = EventSerializer::new();
        let result = serializer.deserialize_event("{not json");
        assert!(matches!(
            result,
            Err(SerializationError::DeserializationFailed(_))
        ));
    }
}
