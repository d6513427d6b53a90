/// Failures surfaced by the staffing API client.
///
/// Cloneable so that a failed fetch can be kept on its cache entry and shown
/// by every view bound to that key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
  /// The request never reached the server or no response came back
  #[error("Network error: {0}")]
  Network(String),
  /// The server answered with a non-success status
  #[error("{message}")]
  HttpStatus { status: u16, message: String },
  /// A non-empty response body could not be decoded
  #[error("Failed to parse response: {0}")]
  Parse(String),
}

impl ApiError {
  /// Replace the generic status message with a fixed per-operation one.
  /// Other variants pass through untouched.
  pub fn for_operation(self, message: &str) -> Self {
    match self {
      ApiError::HttpStatus { status, .. } => ApiError::HttpStatus {
        status,
        message: message.to_string(),
      },
      other => other,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_for_operation_rewrites_status_message() {
    let err = ApiError::HttpStatus {
      status: 500,
      message: "Request failed".to_string(),
    }
    .for_operation("Failed to create job");

    assert_eq!(err.to_string(), "Failed to create job");
    assert!(matches!(err, ApiError::HttpStatus { status: 500, .. }));
  }

  #[test]
  fn test_for_operation_keeps_network_errors() {
    let err = ApiError::Network("connection refused".to_string()).for_operation("ignored");
    assert_eq!(err.to_string(), "Network error: connection refused");
  }
}
