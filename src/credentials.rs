//! Decoding of caller supplied secret bundles into cloud credentials.
//!
//! Secrets travel either inside the create request body or as a base64
//! encoded JSON object in a request header. Both shapes carry an `account`
//! entry holding the AWS access key pair. Credentials are request scoped:
//! they are derived here, used for provider calls, echoed back as response
//! secrets, and never written to the metadata store.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use thiserror::Error;

use crate::messages::{JsonMap, json_type_name};

const ACCOUNT_KEY: &str = "account";
const ACCESS_KEY_FIELD: &str = "aws_access_key_id";
const SECRET_KEY_FIELD: &str = "aws_secret_access_key";

/// Errors raised while decoding secret bundles and credentials.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CodecError {
    /// The header value is not valid standard base64.
    #[error("value is not encoded in base64: {0}")]
    InvalidBase64(String),
    /// The decoded bytes are not a JSON object.
    #[error("cannot parse decoded value as a JSON object: {0}")]
    InvalidJson(String),
    /// The secret bundle has no `account` entry.
    #[error("\"account\" property in driver_secrets is missing")]
    MissingAccount,
    /// The `account` entry is present but not an object.
    #[error("\"account\" property in driver_secrets: expected object, got {found}")]
    AccountNotObject {
        /// JSON type found instead of an object.
        found: &'static str,
    },
    /// A credential field is missing or not a string.
    #[error("expected \"{field}\" to be string, got {found}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// JSON type found instead of a string.
        found: &'static str,
    },
}

/// Decodes a base64 header value into a JSON object.
///
/// # Errors
///
/// Returns [`CodecError::InvalidBase64`] when the value is not base64 and
/// [`CodecError::InvalidJson`] when the decoded bytes are not a JSON object.
pub fn decode_header(value: &str) -> Result<JsonMap, CodecError> {
    let bytes = STANDARD
        .decode(value)
        .map_err(|err| CodecError::InvalidBase64(err.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|err| CodecError::InvalidJson(err.to_string()))
}

/// Encodes a JSON object the way callers encode driver headers.
#[must_use]
pub fn encode_header(map: &JsonMap) -> String {
    STANDARD.encode(Value::Object(map.clone()).to_string())
}

/// AWS access key pair taken from a request's secret bundle.
#[derive(Clone, Eq, PartialEq)]
pub struct CloudCredentials {
    access_key_id: String,
    secret_access_key: String,
}

impl CloudCredentials {
    /// Creates credentials from an access key pair.
    #[must_use]
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Extracts credentials from the `account` entry of a secret bundle.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::MissingAccount`] when the entry is absent, or the
    /// error reported by [`CloudCredentials::from_account`].
    pub fn from_secrets(secrets: &JsonMap) -> Result<Self, CodecError> {
        let account = secrets.get(ACCOUNT_KEY).ok_or(CodecError::MissingAccount)?;
        Self::from_account(account)
    }

    /// Validates an `account` value and extracts both key fields.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::AccountNotObject`] when the value is not an
    /// object and [`CodecError::InvalidField`] naming the first field that is
    /// missing or not a string.
    pub fn from_account(account: &Value) -> Result<Self, CodecError> {
        let Value::Object(fields) = account else {
            return Err(CodecError::AccountNotObject {
                found: json_type_name(Some(account)),
            });
        };
        Ok(Self {
            access_key_id: string_field(fields, ACCESS_KEY_FIELD)?,
            secret_access_key: string_field(fields, SECRET_KEY_FIELD)?,
        })
    }

    /// Returns the access key identifier.
    #[must_use]
    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    /// Returns the secret access key.
    #[must_use]
    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    /// Builds the secrets section returned to the caller.
    #[must_use]
    pub fn response_secrets(&self) -> JsonMap {
        let mut secrets = JsonMap::new();
        secrets.insert(
            ACCESS_KEY_FIELD.to_owned(),
            Value::String(self.access_key_id.clone()),
        );
        secrets.insert(
            SECRET_KEY_FIELD.to_owned(),
            Value::String(self.secret_access_key.clone()),
        );
        secrets
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

fn string_field(fields: &JsonMap, field: &'static str) -> Result<String, CodecError> {
    match fields.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        other => Err(CodecError::InvalidField {
            field,
            found: json_type_name(other),
        }),
    }
}
