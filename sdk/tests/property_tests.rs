use proptest::prelude::*;
use sdk::errors::{CoreError, CoreErrorExt};
use sdk::types::{Citation, ToolId};

proptest! {
    // Property: every error carries a non-empty, static user hint that does
    // not leak the raw internal message.
    #[test]
    fn error_user_hints_are_safe(message in "[0-9a-f]{8,32}")  {
        let errs = vec![
            CoreError::Config(message.clone()),
            CoreError::Planning(message.clone()),
            CoreError::QuotaExceeded { step: 1, reason: message.clone() },
            CoreError::ToolExecution { step: 1, message: message.clone() },
            CoreError::ToolNotEnabled(message.clone()),
            CoreError::LlmProvider(message.clone()),
            CoreError::Serialization(message.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            // Hints are static strings; the raw message must not leak through
            prop_assert!(!hint.contains(&message));
        }
    }

    // Property: wire names round-trip for every tool identifier.
    #[test]
    fn tool_id_wire_roundtrip(idx in 0usize..ToolId::ALL.len()) {
        let id = ToolId::ALL[idx];
        let parsed: ToolId = id.wire_name().parse().expect("wire name parses");
        prop_assert_eq!(parsed, id);

        let json = serde_json::to_string(&id).expect("serializes");
        let back: ToolId = serde_json::from_str(&json).expect("deserializes");
        prop_assert_eq!(back, id);
    }

    // Property: citations never serialize a null title.
    #[test]
    fn citation_title_serialization(url in "https://[a-z]{1,16}\\.com", title in "\\PC{0,32}") {
        let citation = Citation::new(url, title.clone());
        let json = serde_json::to_string(&citation).expect("serializes");

        if title.is_empty() {
            prop_assert!(!json.contains("\"title\""));
        } else {
            prop_assert!(json.contains("\"title\""));
        }
    }
}
