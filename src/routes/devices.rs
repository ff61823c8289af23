use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::dto::DeviceResponse;
use crate::auth::middleware::AuthUser;
use crate::entities::device::DeviceType;
use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::services::{DeviceService, RegisterDevice};
use crate::state::AppState;

/// Build the device group: `/devices/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_devices).post(register_device))
        .route("/{id}", get(get_device).delete(delete_device))
        .route("/{id}/settings", put(update_settings))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterDeviceRequest {
    name: String,
    device_type: DeviceType,
    device_identifier: String,
    settings: Option<Value>,
}

/// `POST /api/devices`. 201 for a new device, 200 when an existing one is re-activated.
async fn register_device(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppJson(body): AppJson<RegisterDeviceRequest>,
) -> Result<Response, AppError> {
    let (device, created) = DeviceService::register(
        &state.db,
        user.id,
        RegisterDevice {
            name: body.name,
            device_type: body.device_type,
            device_identifier: body.device_identifier,
            settings: body.settings,
        },
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DeviceResponse::from(device))).into_response())
}

/// `GET /api/devices`
async fn list_devices(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
) -> Result<Json<Vec<DeviceResponse>>, AppError> {
    let devices = DeviceService::list(&state.db, user.id).await?;
    Ok(Json(devices.into_iter().map(Into::into).collect()))
}

/// `GET /api/devices/{id}`
async fn get_device(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeviceResponse>, AppError> {
    Ok(Json(DeviceService::get(&state.db, user.id, id).await?.into()))
}

/// `PUT /api/devices/{id}/settings`
async fn update_settings(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(patch): AppJson<Value>,
) -> Result<Json<DeviceResponse>, AppError> {
    let device = DeviceService::update_settings(&state.db, user.id, id, patch).await?;
    Ok(Json(device.into()))
}

/// `DELETE /api/devices/{id}`
async fn delete_device(
    State(state): State<AppState>,
    AuthUser { user, .. }: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, AppError> {
    DeviceService::delete(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
