//! 请求体校验
//!
//! [`Schema`] 直接检查原始 JSON，要么得到类型化的输入，要么得到字段错误列表。
//! [`Validated`] 提取器在处理器之前执行校验，未通过的请求不会触达存储。

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::error::CoreError;

pub const INVALID_TYPE: &str = "invalid_type";
pub const TOO_SMALL: &str = "too_small";
pub const INVALID_JSON: &str = "invalid_json";

/// A single failing field, addressed by its path within the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub code: String,
    pub expected: String,
    pub received: String,
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(
        code: &str,
        expected: &str,
        received: &str,
        path: &[&str],
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            expected: expected.to_string(),
            received: received.to_string(),
            path: path.iter().map(|segment| segment.to_string()).collect(),
            message: message.into(),
        }
    }

    /// The field name directly under `body`, if any.
    pub fn field(&self) -> Option<&str> {
        match self.path.as_slice() {
            [_, field, ..] => Some(field.as_str()),
            _ => None,
        }
    }
}

/// Errors collected while validating one body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn single(error: FieldError) -> Self {
        Self(vec![error])
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[FieldError] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.0
    }

    /// Stable sort by the position of each error's field in `fields`.
    /// Errors for the body itself sort first.
    pub fn sort_by_schema(&mut self, fields: &[&str]) {
        self.0.sort_by_key(|error| {
            error
                .field()
                .map(|name| {
                    fields
                        .iter()
                        .position(|candidate| *candidate == name)
                        .map_or(fields.len() + 1, |index| index + 1)
                })
                .unwrap_or(0)
        });
    }

    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<Vec<FieldError>> for FieldErrors {
    fn from(errors: Vec<FieldError>) -> Self {
        Self(errors)
    }
}

/// A request body shape that can be checked against raw JSON.
pub trait Schema: Sized + Send {
    fn validate_body(body: &Value) -> Result<Self, FieldErrors>;
}

/// Extractor that parses the body as JSON and runs `T`'s schema on it.
#[derive(Debug)]
pub struct Validated<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Validated<T>
where
    S: Send + Sync,
    T: Schema,
{
    type Rejection = CoreError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(CoreError::Body)?;
        let body = parse_body(&bytes)?;
        T::validate_body(&body).map(Validated).map_err(CoreError::BadRequest)
    }
}

/// Parses raw bytes as a JSON body; an empty body reads as `{}`.
pub fn parse_body(bytes: &[u8]) -> Result<Value, CoreError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_slice(bytes).map_err(|_| CoreError::BadRequest(malformed_body()))
}

fn malformed_body() -> FieldErrors {
    FieldErrors::single(FieldError::new(
        INVALID_JSON,
        "object",
        "unknown",
        &["body"],
        "Malformed JSON body",
    ))
}

/// Name of a JSON value's type, `undefined` for an absent value.
pub fn json_type(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

/// Borrows the body as an object, or reports the body itself as mistyped.
pub fn body_object(body: &Value) -> Result<&Map<String, Value>, FieldErrors> {
    body.as_object().ok_or_else(|| {
        let received = json_type(Some(body));
        FieldErrors::single(FieldError::new(
            INVALID_TYPE,
            "object",
            received,
            &["body"],
            format!("Expected object, received {received}"),
        ))
    })
}

/// Reads `field` as a string. Absence is an error only when `required_message`
/// is given; a present non-string value is always an error.
pub fn string_field(
    object: &Map<String, Value>,
    field: &str,
    required_message: Option<&str>,
    errors: &mut FieldErrors,
) -> Option<String> {
    match object.get(field) {
        Some(Value::String(value)) => Some(value.clone()),
        None => {
            if let Some(message) = required_message {
                errors.push(FieldError::new(
                    INVALID_TYPE,
                    "string",
                    "undefined",
                    &["body", field],
                    message,
                ));
            }
            None
        }
        Some(other) => {
            let received = json_type(Some(other));
            errors.push(FieldError::new(
                INVALID_TYPE,
                "string",
                received,
                &["body", field],
                format!("Expected string, received {received}"),
            ));
            None
        }
    }
}

/// Folds `validator` failures into field errors under `body`.
pub fn collect_rule_errors(result: Result<(), validator::ValidationErrors>, errors: &mut FieldErrors) {
    let Err(failures) = result else {
        return;
    };

    for (field, field_failures) in failures.field_errors() {
        let field: &str = field.as_ref();
        for failure in field_failures.iter() {
            let message = failure
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| format!("{field} is invalid"));
            let code = if failure.code == "length" {
                TOO_SMALL
            } else {
                INVALID_TYPE
            };
            errors.push(FieldError::new(code, "string", "string", &["body", field], message));
        }
    }
}
