use axum::body::Bytes;
use axum::http::{
    HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode,
    header::CONTENT_TYPE,
};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// View model attributes collected while handling a request.
///
/// Clones share the same attributes.
#[derive(Debug, Clone, Default)]
pub struct Model {
    attributes: Arc<DashMap<String, Value>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_attribute<T: Serialize>(&self, name: &str, value: T) -> serde_json::Result<()> {
        self.attributes.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.get(name).map(|v| v.clone())
    }

    pub fn contains_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Copy every attribute of `other` into this model, overwriting on conflict.
    pub fn merge(&self, other: &Model) {
        if Arc::ptr_eq(&self.attributes, &other.attributes) {
            return;
        }
        for entry in other.attributes.iter() {
            self.attributes.insert(entry.key().clone(), entry.value().clone());
        }
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attributes as a JSON object with sorted keys.
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .attributes
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        Value::Object(map)
    }
}

#[derive(Debug)]
struct ResponseParts {
    status: StatusCode,
    headers: HeaderMap,
}

impl Default for ResponseParts {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }
}

/// Mutable response status and headers a handler can set before the view renders.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    parts: Arc<Mutex<ResponseParts>>,
}

impl HttpResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode {
        self.parts.lock().unwrap_or_else(PoisonError::into_inner).status
    }

    pub fn set_status(&self, status: StatusCode) {
        self.parts.lock().unwrap_or_else(PoisonError::into_inner).status = status;
    }

    pub fn set_header(&self, name: HeaderName, value: HeaderValue) {
        self.parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .headers
            .insert(name, value);
    }

    pub fn headers(&self) -> HeaderMap {
        self.parts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .headers
            .clone()
    }
}

/// Everything argument resolvers can read from one request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request: Arc<Request<Bytes>>,
    parameters: HashMap<String, String>,
    path_variables: HashMap<String, String>,
    response: HttpResponse,
    model: Model,
}

impl RequestContext {
    /// Wrap a request, reading parameters from the query string and, for form posts,
    /// the body. A query parameter wins over a form field of the same name.
    pub fn new(request: Request<Bytes>) -> Self {
        let mut parameters = HashMap::new();

        if let Some(query) = request.uri().query() {
            for (name, value) in parse_pairs(query.as_bytes()) {
                parameters.entry(name).or_insert(value);
            }
        }

        let is_form = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with(FORM_CONTENT_TYPE));
        if is_form {
            for (name, value) in parse_pairs(request.body()) {
                parameters.entry(name).or_insert(value);
            }
        }

        Self {
            request: Arc::new(request),
            parameters,
            path_variables: HashMap::new(),
            response: HttpResponse::new(),
            model: Model::new(),
        }
    }

    pub fn with_path_variables(mut self, path_variables: HashMap<String, String>) -> Self {
        self.path_variables = path_variables;
        self
    }

    pub fn request(&self) -> Arc<Request<Bytes>> {
        Arc::clone(&self.request)
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters.get(name).map(String::as_str)
    }

    pub fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.path_variables.get(name).map(String::as_str)
    }

    pub fn response(&self) -> &HttpResponse {
        &self.response
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

fn parse_pairs(input: &[u8]) -> Vec<(String, String)> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(input).unwrap_or_else(|e| {
        tracing::debug!("Ignoring malformed url-encoded data: {}", e);
        Vec::new()
    })
}
