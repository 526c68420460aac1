//! Inbound message and outbound table row shapes.

use serde::{Deserialize, Serialize};

/// Partition every sample row is written under.
pub const SAMPLE_PARTITION: &str = "SampleMessage";

/// Message delivered on the sample topic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SampleMessage {
    /// Opaque identifier (UUIDs arrive in their string form)
    #[serde(alias = "id")]
    pub id: String,

    /// Free-text payload
    #[serde(alias = "message")]
    pub message: String,
}

impl SampleMessage {
    pub fn new(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
        }
    }
}

/// Row written to the sample table, one per [`SampleMessage`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SampleTableEntity {
    pub partition_key: String,
    pub row_key: String,
    pub id: String,
    pub message: String,
}

impl From<&SampleMessage> for SampleTableEntity {
    fn from(sample: &SampleMessage) -> Self {
        Self {
            partition_key: SAMPLE_PARTITION.to_string(),
            row_key: sample.id.clone(),
            id: sample.id.clone(),
            message: sample.message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_pascal_case() {
        let msg: SampleMessage =
            serde_json::from_str(r#"{"Id": "42", "Message": "hello"}"#).unwrap();
        assert_eq!(msg, SampleMessage::new("42", "hello"));
    }

    #[test]
    fn test_deserialize_lowercase_alias() {
        let msg: SampleMessage =
            serde_json::from_str(r#"{"id": "7", "message": "hi"}"#).unwrap();
        assert_eq!(msg.id, "7");
        assert_eq!(msg.message, "hi");
    }

    #[test]
    fn test_missing_field_rejected() {
        let result = serde_json::from_str::<SampleMessage>(r#"{"Id": "1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_entity_keys() {
        let row = SampleTableEntity::from(&SampleMessage::new("abc", "text"));
        assert_eq!(row.partition_key, SAMPLE_PARTITION);
        assert_eq!(row.row_key, "abc");

        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["PartitionKey"], "SampleMessage");
        assert_eq!(json["RowKey"], "abc");
        assert_eq!(json["Message"], "text");
    }
}
