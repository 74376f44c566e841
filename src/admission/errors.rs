// Copyright 2024 The Kubernetes Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Admission error types.

use thiserror::Error;

/// Result type for admission operations.
pub type AdmissionResult<T> = Result<T, AdmissionError>;

/// AdmissionError represents errors that can occur while deciding on a review.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The request was sent with a media type other than application/json.
    /// Such requests are never decoded.
    #[error("unsupported content type {0:?}, expected \"application/json\"")]
    UnsupportedContentType(String),

    /// The body does not parse as an admission review envelope.
    #[error("could not decode body: {0}")]
    Decode(#[source] serde_json::Error),

    /// The envelope parsed but carries no request.
    #[error("could not decode body: admission review has no request")]
    MissingRequest,

    /// The raw object does not parse as the expected resource schema.
    #[error("could not unmarshal raw object: {0}")]
    Unmarshal(#[source] serde_json::Error),

    /// The patch document could not be serialized.
    #[error("could not create patch: {0}")]
    Patch(#[source] serde_json::Error),

    /// The response envelope could not be serialized.
    #[error("could not encode response: {0}")]
    Encode(#[source] serde_json::Error),

    /// Process configuration was rejected at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AdmissionError {
    /// Create a new InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        AdmissionError::InvalidConfig(msg.into())
    }

    /// Returns true for failures that happen before a request could be decoded.
    pub fn is_decode_failure(&self) -> bool {
        matches!(
            self,
            AdmissionError::Decode(_) | AdmissionError::MissingRequest
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<serde_json::Value>("{not json").unwrap_err()
    }

    #[test]
    fn test_unsupported_content_type_display() {
        let err = AdmissionError::UnsupportedContentType("text/plain".to_string());
        let msg = err.to_string();
        assert!(msg.contains("\"text/plain\""));
        assert!(msg.contains("application/json"));
    }

    #[test]
    fn test_decode_error_display() {
        let err = AdmissionError::Decode(json_error());
        assert!(err.to_string().starts_with("could not decode body: "));
        assert!(err.is_decode_failure());
        assert!(AdmissionError::MissingRequest.is_decode_failure());
    }

    #[test]
    fn test_unmarshal_is_not_decode_failure() {
        let err = AdmissionError::Unmarshal(json_error());
        assert!(err.to_string().starts_with("could not unmarshal raw object: "));
        assert!(!err.is_decode_failure());
    }

    #[test]
    fn test_invalid_config() {
        let err = AdmissionError::invalid_config("bad effect");
        assert_eq!(err.to_string(), "invalid configuration: bad effect");
    }
}
