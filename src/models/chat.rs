//! Widget chat request models
//!
//! This module defines the request structures accepted by the message
//! endpoint. Field names are camelCase on the wire to stay compatible with
//! the existing widget-builder client.

use serde::{Deserialize, Serialize};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// One message in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Widget chat request
///
/// `structure_description` is the table/column sample the system prompt is
/// rendered around; `current_artifact` is the widget code the session starts
/// from, absent for a brand-new widget.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactChatRequest {
    pub messages: Vec<ChatMessage>,
    pub structure_description: String,
    #[serde(default)]
    pub current_artifact: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_request() {
        let payload = r#"{
            "messages": [{"role": "user", "content": "make a card list"}],
            "structureDescription": "Table1: Name, Email",
            "currentArtifact": "export default () => null;"
        }"#;
        let request: ArtifactChatRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.structure_description, "Table1: Name, Email");
        assert_eq!(
            request.current_artifact.as_deref(),
            Some("export default () => null;")
        );
    }

    #[test]
    fn test_current_artifact_optional() {
        let payload = r#"{
            "messages": [],
            "structureDescription": ""
        }"#;
        let request: ArtifactChatRequest = serde_json::from_str(payload).unwrap();
        assert!(request.current_artifact.is_none());
    }
}
