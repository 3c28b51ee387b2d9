// ABOUTME: Tests for CallError rate-limit classification.
// ABOUTME: Covers status-based and message-substring conventions.

use super::CallError;

#[test]
fn test_status_429_is_rate_limited() {
    let err = CallError::Api {
        status: 429,
        message: String::new(),
    };
    assert!(err.is_rate_limited());
}

#[test]
fn test_message_markers_are_rate_limited() {
    for message in [
        "Rate limit reached for requests",
        "Too Many Requests",
        "error code: rate_limit_exceeded",
        "monthly quota exceeded",
    ] {
        let err = CallError::Api {
            status: 400,
            message: message.to_string(),
        };
        assert!(err.is_rate_limited(), "expected retryable: {}", message);
    }
}

#[test]
fn test_other_api_errors_are_terminal() {
    let err = CallError::Api {
        status: 500,
        message: "internal server error".to_string(),
    };
    assert!(!err.is_rate_limited());

    let err = CallError::Api {
        status: 404,
        message: "lead not found".to_string(),
    };
    assert!(!err.is_rate_limited());
}

#[test]
fn test_anyhow_errors_are_terminal() {
    let err = CallError::Other(anyhow::anyhow!("serialization failed"));
    assert!(!err.is_rate_limited());
}

#[test]
fn test_error_display() {
    let err = CallError::Api {
        status: 429,
        message: "slow down".to_string(),
    };
    assert_eq!(err.to_string(), "API error (429): slow down");
}
