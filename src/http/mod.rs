//! HTTP surface of the driver.
//!
//! | Method | Path | Success |
//! |---|---|---|
//! | `POST` | `/` | `200` with the resource data |
//! | `DELETE` | `/{resource_id}` | `204` |
//! | `GET` | `/alive`, `/health` | `200` |

mod error;

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

pub use error::ApiError;

use crate::cloud::ProvisionerFactory;
use crate::messages::{DriverResourceDefinition, PARAMS_HEADER, ResourceData, SECRETS_HEADER};
use crate::orchestrator::{DeleteRequest, DriverError, ProvisioningOrchestrator};
use crate::resource::is_valid_resource_id;
use crate::store::MetadataStore;
use crate::telemetry;

type SharedOrchestrator<S, F> = Arc<ProvisioningOrchestrator<S, F>>;

/// Builds the router serving the driver protocol and health probes.
pub fn router<S, F>(orchestrator: SharedOrchestrator<S, F>) -> Router
where
    S: MetadataStore + 'static,
    F: ProvisionerFactory + 'static,
{
    Router::new()
        .route("/", post(create_or_update::<S, F>))
        .route("/{resource_id}", delete(delete_resource::<S, F>))
        .route("/alive", get(|| async { StatusCode::OK }))
        .route("/health", get(|| async { StatusCode::OK }))
        .layer(middleware::from_fn(telemetry::log_request))
        .with_state(orchestrator)
}

async fn create_or_update<S, F>(
    State(orchestrator): State<SharedOrchestrator<S, F>>,
    body: Bytes,
) -> Result<Json<ResourceData>, ApiError>
where
    S: MetadataStore + 'static,
    F: ProvisionerFactory + 'static,
{
    let definition: DriverResourceDefinition =
        serde_json::from_slice(&body).map_err(|err| ApiError::unprocessable(&err))?;
    let data = orchestrator.create_or_update(&definition).await?;
    Ok(Json(data))
}

async fn delete_resource<S, F>(
    State(orchestrator): State<SharedOrchestrator<S, F>>,
    Path(resource_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
    S: MetadataStore + 'static,
    F: ProvisionerFactory + 'static,
{
    if !is_valid_resource_id(&resource_id) {
        return Err(DriverError::NotFound(resource_id).into());
    }
    let secrets_header = header_value(&headers, SECRETS_HEADER)?;
    let params_header = header_value(&headers, PARAMS_HEADER)?;
    orchestrator
        .delete(&DeleteRequest {
            resource_id: &resource_id,
            secrets_header,
            params_header,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// An empty header counts as absent.
fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let text = value.to_str().map_err(|_| ApiError::bad_header(name))?;
    Ok(Some(text).filter(|raw| !raw.is_empty()))
}
