//! Echo tool
//!
//! Returns its input back under a `result` key. Used for clarification steps
//! and format/repeat requests.

use async_trait::async_trait;
use sdk::tool::Tool;
use sdk::types::{ToolError, ToolId, ToolInput};
use serde_json::json;

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn id(&self) -> ToolId {
        ToolId::Echo
    }

    async fn invoke(&self, input: &ToolInput) -> Result<serde_json::Value, ToolError> {
        Ok(json!({ "result": serde_json::Value::Object(input.0.clone()) }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_returns_input() {
        let tool = EchoTool;
        let input = ToolInput::new().with_param("prompt", json!("hello"));

        let result = tool.invoke(&input).await.expect("echo succeeds");
        assert_eq!(
            result.get("result").and_then(|r| r.get("prompt")),
            Some(&json!("hello"))
        );
    }
}
