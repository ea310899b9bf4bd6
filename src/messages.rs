//! Wire types exchanged with the deployment orchestrator.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Structured JSON object used for params, secrets, and provider values.
pub type JsonMap = Map<String, Value>;

/// Value reported in the `driver_type` field of every response.
pub const DRIVER_TYPE: &str = "aws";

/// Header carrying the base64 encoded driver secrets on delete requests.
pub const SECRETS_HEADER: &str = "Humanitec-Driver-Secrets";

/// Header carrying the base64 encoded driver params on delete requests.
pub const PARAMS_HEADER: &str = "Humanitec-Driver-Params";

/// Body of a create-or-update request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DriverResourceDefinition {
    /// Caller supplied resource identifier.
    pub id: String,
    /// Resource type requested (for example `s3` or `redis`).
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Parameters from the deployment set. Accepted but unused.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resource_params: JsonMap,
    /// Non-secret provisioning parameters such as the region.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub driver_params: JsonMap,
    /// Request scoped secrets holding the cloud account.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub driver_secrets: JsonMap,
}

/// Values and secrets split by sensitivity.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ValuesSecrets {
    /// Non-secret outputs.
    pub values: JsonMap,
    /// Sensitive outputs.
    pub secrets: JsonMap,
}

/// Response body returned after a successful create-or-update.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ResourceData {
    /// Resource type of the stored record.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Resource outputs handed to the workload.
    pub data: ValuesSecrets,
    /// Always [`DRIVER_TYPE`].
    pub driver_type: String,
    /// Driver private data. Always empty.
    pub driver_data: ValuesSecrets,
}

impl ResourceData {
    /// Builds a response for this driver from stored values and derived secrets.
    #[must_use]
    pub fn new(resource_type: impl Into<String>, values: JsonMap, secrets: JsonMap) -> Self {
        Self {
            resource_type: resource_type.into(),
            data: ValuesSecrets { values, secrets },
            driver_type: DRIVER_TYPE.to_owned(),
            driver_data: ValuesSecrets::default(),
        }
    }
}

/// Describes the JSON type of an optional value for error messages.
#[must_use]
pub const fn json_type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "nothing",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<JsonMap, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<JsonMap>::deserialize(deserializer)?.unwrap_or_default())
}
