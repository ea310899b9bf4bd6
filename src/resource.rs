//! Resource identifiers and the closed set of provisionable resource kinds.

use std::fmt;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::messages::{JsonMap, json_type_name};

/// Port exposed by every cache cluster.
pub const CACHE_PORT: u16 = 6379;

/// Prefix applied to generated cache cluster identifiers.
pub const CACHE_CLUSTER_PREFIX: &str = "redis-";

/// Where request parameters were read from, used in error messages.
pub const DRIVER_PARAMS: &str = "driver_params";

/// Returns `true` when `id` is lowercase alphanumerics and hyphens, at least
/// three characters long, and neither starts nor ends with a hyphen.
#[must_use]
pub fn is_valid_resource_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    let (Some(first), Some(last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    bytes.len() >= 3
        && *first != b'-'
        && *last != b'-'
        && bytes
            .iter()
            .all(|byte| byte.is_ascii_lowercase() || byte.is_ascii_digit() || *byte == b'-')
}

/// Resource kinds this driver can provision.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ResourceKind {
    /// S3 object storage bucket.
    Bucket,
    /// ElastiCache redis cluster.
    Cache,
}

impl ResourceKind {
    /// Type name used on the wire and in the metadata store.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Bucket => "s3",
            Self::Cache => "redis",
        }
    }

    /// Parses a wire type name, returning `None` for unsupported types.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "s3" => Some(Self::Bucket),
            "redis" => Some(Self::Cache),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Errors raised while reading typed parameters from a JSON object.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ParamError {
    /// A required field is missing or has the wrong JSON type.
    #[error("\"{field}\" property in {location}: expected string, got {found}")]
    ExpectedString {
        /// Field name.
        field: &'static str,
        /// Object the field was read from.
        location: &'static str,
        /// JSON type found instead.
        found: &'static str,
    },
}

/// Reads a required string field from `map`.
///
/// # Errors
///
/// Returns [`ParamError::ExpectedString`] when the field is absent or not a
/// string.
pub fn require_string(
    map: &JsonMap,
    field: &'static str,
    location: &'static str,
) -> Result<String, ParamError> {
    match map.get(field) {
        Some(Value::String(value)) => Ok(value.clone()),
        other => Err(ParamError::ExpectedString {
            field,
            location,
            found: json_type_name(other),
        }),
    }
}

/// Parameters for a bucket.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BucketParams {
    /// Region hosting the bucket.
    pub region: String,
}

/// Parameters for a cache cluster.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CacheParams {
    /// Region hosting the cluster.
    pub region: String,
    /// Node type such as `cache.t3.micro`.
    pub cache_node_type: String,
    /// Preferred availability zone for the single node.
    pub cache_az: String,
}

/// Validated provisioning request, one variant per resource kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceSpec {
    /// Bucket provisioning request.
    Bucket(BucketParams),
    /// Cache cluster provisioning request.
    Cache(CacheParams),
}

impl ResourceSpec {
    /// Validates `params` against the shape required by `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError`] naming the first missing or mistyped field.
    pub fn from_params(kind: ResourceKind, params: &JsonMap) -> Result<Self, ParamError> {
        let region = require_string(params, "region", DRIVER_PARAMS)?;
        Ok(match kind {
            ResourceKind::Bucket => Self::Bucket(BucketParams { region }),
            ResourceKind::Cache => Self::Cache(CacheParams {
                region,
                cache_node_type: require_string(params, "cache_node_type", DRIVER_PARAMS)?,
                cache_az: require_string(params, "cache_az", DRIVER_PARAMS)?,
            }),
        })
    }

    /// Kind of resource requested.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        match self {
            Self::Bucket(_) => ResourceKind::Bucket,
            Self::Cache(_) => ResourceKind::Cache,
        }
    }

    /// Region the resource is provisioned in.
    #[must_use]
    pub fn region(&self) -> &str {
        match self {
            Self::Bucket(params) => &params.region,
            Self::Cache(params) => &params.region,
        }
    }
}

/// Provider outputs recorded for a bucket.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct BucketValues {
    /// Location reported by the provider.
    pub region: String,
    /// Generated bucket name.
    pub bucket: String,
}

/// Provider outputs recorded for a cache cluster.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct CacheValues {
    /// Endpoint host of the cluster's node.
    pub host: String,
    /// Endpoint port.
    pub port: u16,
    /// Generated cluster identifier, needed for deletion.
    pub cluster_id: String,
}

/// Non-secret provider outputs, one variant per resource kind.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceValues {
    /// Bucket outputs.
    Bucket(BucketValues),
    /// Cache cluster outputs.
    Cache(CacheValues),
}

impl ResourceValues {
    /// Reads stored values for `kind`.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] when the stored object does not match
    /// the shape expected for `kind`.
    pub fn from_map(kind: ResourceKind, map: &JsonMap) -> Result<Self, serde_json::Error> {
        let value = Value::Object(map.clone());
        Ok(match kind {
            ResourceKind::Bucket => Self::Bucket(serde_json::from_value(value)?),
            ResourceKind::Cache => Self::Cache(serde_json::from_value(value)?),
        })
    }

    /// Renders the values as the JSON object persisted and returned to callers.
    #[must_use]
    pub fn to_map(&self) -> JsonMap {
        let mut map = JsonMap::new();
        match self {
            Self::Bucket(values) => {
                map.insert("region".to_owned(), Value::from(values.region.as_str()));
                map.insert("bucket".to_owned(), Value::from(values.bucket.as_str()));
            }
            Self::Cache(values) => {
                map.insert("host".to_owned(), Value::from(values.host.as_str()));
                map.insert("port".to_owned(), Value::from(values.port));
                map.insert(
                    "cluster_id".to_owned(),
                    Value::from(values.cluster_id.as_str()),
                );
            }
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn object(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[rstest]
    #[case("valid-id", true)]
    #[case("01-valid-id-2", true)]
    #[case("abc", true)]
    #[case("-invalid-id", false)]
    #[case("invalid-id-", false)]
    #[case("Invalid ID", false)]
    #[case("", false)]
    #[case("a", false)]
    #[case("ab", false)]
    #[case("under_score", false)]
    fn resource_id_rule(#[case] id: &str, #[case] expected: bool) {
        assert_eq!(is_valid_resource_id(id), expected, "id {id:?}");
    }

    #[rstest]
    #[case("s3", Some(ResourceKind::Bucket))]
    #[case("redis", Some(ResourceKind::Cache))]
    #[case("unknown", None)]
    #[case("S3", None)]
    fn wire_names_parse(#[case] name: &str, #[case] expected: Option<ResourceKind>) {
        assert_eq!(ResourceKind::from_wire(name), expected);
    }

    #[test]
    fn cache_spec_requires_every_field() {
        let params = object(json!({"region": "eu-west-1", "cache_node_type": "cache.t3.micro"}));

        let err = ResourceSpec::from_params(ResourceKind::Cache, &params)
            .expect_err("cache_az is required");

        assert_eq!(
            err.to_string(),
            "\"cache_az\" property in driver_params: expected string, got nothing"
        );
    }

    #[test]
    fn bucket_spec_rejects_non_string_region() {
        let params = object(json!({"region": 42}));

        let err = ResourceSpec::from_params(ResourceKind::Bucket, &params)
            .expect_err("region must be a string");

        assert_eq!(
            err,
            ParamError::ExpectedString {
                field: "region",
                location: DRIVER_PARAMS,
                found: "number",
            }
        );
    }

    #[test]
    fn cache_values_survive_storage_shape() {
        let values = ResourceValues::Cache(CacheValues {
            host: String::from("redis-1.eu-west-1"),
            port: CACHE_PORT,
            cluster_id: String::from("redis-1"),
        });

        let restored = ResourceValues::from_map(ResourceKind::Cache, &values.to_map())
            .unwrap_or_else(|err| panic!("stored values should parse: {err}"));

        assert_eq!(restored, values);
    }

    #[test]
    fn bucket_values_reject_cache_shape() {
        let stored = object(json!({"host": "h", "port": 6379, "cluster_id": "c"}));
        assert!(ResourceValues::from_map(ResourceKind::Bucket, &stored).is_err());
    }
}
