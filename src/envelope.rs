//! JSON response envelope.
//!
//! Every JSON answer has the same outer shape:
//!
//! ```json
//! {"success":true,"code":200,"message":"Fetch all data","meta":{...},"data":[...]}
//! ```
//!
//! `meta`, `data`, `include` and `errors` are omitted when unset.

use std::collections::BTreeMap;
use std::fmt;

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::response::{IntoResponse, Response};

/// Pagination metadata for list responses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub total_records: u64,
}

/// Field-keyed validation errors.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MultiError(BTreeMap<String, String>);

impl MultiError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `err` under `key`, replacing any earlier error for that key.
    pub fn append(&mut self, key: impl Into<String>, err: impl fmt::Display) {
        self.0.insert(key.into(), err.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// The response envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<MultiError>,
}

impl Envelope {
    /// `success` follows the status: anything below 400 succeeded.
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            success: status.as_u16() < 400,
            code: status.as_u16(),
            message: message.into(),
            meta: None,
            data: None,
            include: None,
            errors: None,
        }
    }

    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Attaches `data`. A value that fails to serialize is left out.
    pub fn data<T: Serialize>(mut self, data: T) -> Self {
        self.data = to_value(data);
        self
    }

    pub fn include<T: Serialize>(mut self, include: Vec<T>) -> Self {
        self.include = Some(include.into_iter().filter_map(to_value).collect());
        self
    }

    /// Attaches field errors; an empty set is left out.
    pub fn errors(mut self, errors: MultiError) -> Self {
        if !errors.is_empty() {
            self.errors = Some(errors);
        }
        self
    }
}

fn to_value<T: Serialize>(v: T) -> Option<Value> {
    match serde_json::to_value(v) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, "envelope payload does not serialize, leaving it out");
            None
        }
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        match serde_json::to_vec(&self) {
            Ok(body) => Response::builder().status(status).json(body),
            Err(e) => {
                warn!(error = %e, "envelope does not serialize");
                Response::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
