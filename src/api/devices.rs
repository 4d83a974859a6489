//! Device management endpoints (`/v1/device-management`)

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::{ApiError, blocking};
use crate::db::Device;

// --- Request/Response types ---

#[derive(Debug, Deserialize)]
pub struct CreateDeviceRequest {
    #[serde(default)]
    pub mac: String,
    #[serde(default, alias = "ip")]
    pub ipv4: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveDeviceRequest {
    #[serde(default, alias = "MAC")]
    pub mac: String,
}

#[derive(Debug, Deserialize)]
pub struct RenameDeviceRequest {
    #[serde(default)]
    pub old: String,
    #[serde(default)]
    pub new: String,
}

#[derive(Debug, Serialize)]
pub struct DeviceResponse {
    pub name: String,
    pub date_added: i64,
    pub ipv4: String,
    pub ipv6: Option<String>,
    pub is_trusted: bool,
    pub mac: String,
}

impl From<Device> for DeviceResponse {
    fn from(device: Device) -> Self {
        Self {
            name: device.name,
            date_added: device.date_added,
            ipv4: device.ipv4,
            ipv6: device.ipv6,
            is_trusted: device.is_trusted,
            mac: device.mac,
        }
    }
}

// --- Handlers ---

/// Register a device
async fn create_device(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CreateDeviceRequest>, JsonRejection>,
) -> Result<Json<DeviceResponse>, ApiError> {
    let Json(req) = payload?;
    let devices = state.devices.clone();

    let device = blocking(move || devices.create(&req.mac, &req.ipv4, &req.name)).await?;

    Ok(Json(device.into()))
}

/// List all devices, newest first
async fn list_devices(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<DeviceResponse>>, ApiError> {
    let devices = state.devices.clone();

    let listed = blocking(move || devices.list()).await?;

    Ok(Json(listed.into_iter().map(DeviceResponse::from).collect()))
}

/// Remove a device by MAC address
async fn remove_device(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RemoveDeviceRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    let devices = state.devices.clone();

    blocking(move || devices.remove(&req.mac)).await?;

    Ok(StatusCode::OK)
}

/// Rename a device
async fn rename_device(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RenameDeviceRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    let devices = state.devices.clone();

    blocking(move || devices.rename(&req.old, &req.new)).await?;

    Ok(StatusCode::OK)
}

/// Build device management routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/",
            get(list_devices)
                .post(create_device)
                .put(rename_device)
                .delete(remove_device),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_ip_alias() {
        let req: CreateDeviceRequest = serde_json::from_str(
            r#"{"mac": "AA:AA:AA:AA:AA:AA", "ip": "10.0.0.2", "name": "tv"}"#,
        )
        .unwrap();
        assert_eq!(req.ipv4, "10.0.0.2");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let req: CreateDeviceRequest = serde_json::from_str(r#"{"name": "tv"}"#).unwrap();
        assert!(req.mac.is_empty());
        assert!(req.ipv4.is_empty());

        let req: RemoveDeviceRequest =
            serde_json::from_str(r#"{"MAC": "AA:AA:AA:AA:AA:AA"}"#).unwrap();
        assert_eq!(req.mac, "AA:AA:AA:AA:AA:AA");
    }

    #[test]
    fn test_device_response_shape() {
        let response = DeviceResponse::from(Device {
            mac: "AA:AA:AA:AA:AA:AA".to_string(),
            name: "tv".to_string(),
            ipv4: "10.0.0.2".to_string(),
            ipv6: None,
            date_added: 1_700_000_000,
            is_trusted: false,
        });

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["name"], "tv");
        assert_eq!(json["date_added"], 1_700_000_000);
        assert!(json["ipv6"].is_null());
        assert_eq!(json["is_trusted"], false);
        assert_eq!(json["mac"], "AA:AA:AA:AA:AA:AA");
    }
}
