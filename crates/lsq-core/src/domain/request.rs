use std::fmt;

use serde::{Deserialize, Serialize};

/// Language tag used when a request is not bound to a particular language.
pub const DEFAULT_LANGUAGE: &str = "default";

/// What to do when no request context could be resolved for a request.
///
/// Whether a missing target is an error or an empty answer depends on the
/// method, so this is chosen per method (see `DispatchConfig`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingContextPolicy {
    /// Resolve with `Failed(ContextMissing)`.
    #[default]
    Fail,
    /// Resolve with `Completed(null)` for requests, `Completed(NoValue)` for notifications.
    NullResponse,
}

/// Read-only identity of a dispatch unit: method, language and declared kinds.
///
/// `params_kind` / `response_kind` are `None` for the parameterless and
/// notification cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestMetadata {
    method: String,
    language: String,
    params_kind: Option<&'static str>,
    response_kind: Option<&'static str>,
}

impl RequestMetadata {
    pub fn new(method: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            language: language.into(),
            params_kind: None,
            response_kind: None,
        }
    }

    pub fn with_params_kind(mut self, kind: &'static str) -> Self {
        self.params_kind = Some(kind);
        self
    }

    pub fn with_response_kind(mut self, kind: &'static str) -> Self {
        self.response_kind = Some(kind);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn params_kind(&self) -> Option<&'static str> {
        self.params_kind
    }

    pub fn response_kind(&self) -> Option<&'static str> {
        self.response_kind
    }

    /// Requests expect a response; notifications don't.
    pub fn expects_response(&self) -> bool {
        self.response_kind.is_some()
    }
}

impl fmt::Display for RequestMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.method, self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_metadata_expects_no_response() {
        let meta = RequestMetadata::new("textDocument/didOpen", DEFAULT_LANGUAGE)
            .with_params_kind("DidOpenParams");
        assert!(!meta.expects_response());
        assert_eq!(meta.params_kind(), Some("DidOpenParams"));
        assert_eq!(meta.to_string(), "textDocument/didOpen [default]");
    }

    #[test]
    fn policy_deserializes_from_snake_case() {
        let p: MissingContextPolicy = serde_json::from_str("\"null_response\"").unwrap();
        assert_eq!(p, MissingContextPolicy::NullResponse);
        assert_eq!(MissingContextPolicy::default(), MissingContextPolicy::Fail);
    }
}
