use reqwest::Method;
use serde::Serialize;

use super::ApiError;

/// A replayable description of one API call.
///
/// The pipeline may send the same request twice (once with the stale token,
/// once after a refresh), so requests are plain data rather than a
/// single-use `reqwest::Request`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    authenticated: bool,
    retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            authenticated: true,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::Validation(format!("Unserializable request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Send without a bearer token and skip the refresh protocol.
    /// Used for login, where a 401 means bad input rather than an expired session.
    pub fn without_auth(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether this request already went through one refresh-and-replay.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn mark_retried(&mut self) {
        self.retried = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let request = ApiRequest::get("/products")
            .query("limit", 10)
            .query("skip", 20);
        assert_eq!(request.method(), &Method::GET);
        assert_eq!(request.path(), "/products");
        assert_eq!(
            request.query_pairs(),
            &[("limit".to_string(), "10".to_string()), ("skip".to_string(), "20".to_string())]
        );
        assert!(request.body().is_none());
        assert!(request.is_authenticated());
        assert!(!request.is_retried());
    }

    #[test]
    fn test_json_body_and_without_auth() {
        let request = ApiRequest::post("/auth/login")
            .json(&serde_json::json!({"username": "emilys"}))
            .unwrap()
            .without_auth();
        assert_eq!(request.body().unwrap()["username"], "emilys");
        assert!(!request.is_authenticated());
    }

    #[test]
    fn test_mark_retried_survives_clone() {
        let mut request = ApiRequest::delete("/products/1");
        request.mark_retried();
        assert!(request.clone().is_retried());
    }
}
