//! Response assembly

use super::types::{FeedbackSessionData, FeedbackSessionsData};

/// Wrap shaped records into the response body, keeping their order
pub fn assemble(records: Vec<FeedbackSessionData>) -> FeedbackSessionsData {
    FeedbackSessionsData {
        feedback_sessions: records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collection_serializes_as_empty_list() {
        let json = serde_json::to_value(assemble(Vec::new())).unwrap();
        assert_eq!(json, serde_json::json!({ "feedbackSessions": [] }));
    }
}
