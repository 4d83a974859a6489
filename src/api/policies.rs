//! Policy management endpoints (`/v1/policy-management`)

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    routing::get,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::{ApiError, blocking};
use crate::db::{PeerDevice, Policy};

// --- Request/Response types ---

#[derive(Debug, Deserialize)]
pub struct CreatePolicyRequest {
    #[serde(default)]
    pub namedeviceto: String,
    #[serde(default)]
    pub namedevicefrom: String,
}

#[derive(Debug, Deserialize)]
pub struct RemovePolicyRequest {
    #[serde(rename = "policyId")]
    pub policy_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PolicyResponse {
    pub device_1: String,
    pub device_2: String,
    #[serde(rename = "policyId")]
    pub policy_id: i64,
}

impl From<Policy> for PolicyResponse {
    fn from(policy: Policy) -> Self {
        Self {
            device_1: policy.device_1,
            device_2: policy.device_2,
            policy_id: policy.id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PeerResponse {
    pub name: String,
    pub ipv4: String,
    pub mac: String,
}

impl From<PeerDevice> for PeerResponse {
    fn from(peer: PeerDevice) -> Self {
        Self {
            name: peer.name,
            ipv4: peer.ipv4,
            mac: peer.mac,
        }
    }
}

// --- Handlers ---

/// Create a policy from `namedevicefrom` to `namedeviceto`
async fn create_policy(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<CreatePolicyRequest>, JsonRejection>,
) -> Result<Json<PolicyResponse>, ApiError> {
    let Json(req) = payload?;
    let policies = state.policies.clone();

    let policy =
        blocking(move || policies.create(&req.namedevicefrom, &req.namedeviceto)).await?;

    Ok(Json(policy.into()))
}

/// List all policies in ID order
async fn list_policies(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<PolicyResponse>>, ApiError> {
    let policies = state.policies.clone();

    let listed = blocking(move || policies.list()).await?;

    Ok(Json(listed.into_iter().map(PolicyResponse::from).collect()))
}

/// List the devices a named device has policies with
async fn list_device_peers(
    State(state): State<Arc<ApiState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<PeerResponse>>, ApiError> {
    let policies = state.policies.clone();

    let peers = blocking(move || policies.peers(&name)).await?;

    Ok(Json(peers.into_iter().map(PeerResponse::from).collect()))
}

/// Remove a policy by ID
async fn remove_policy(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<RemovePolicyRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload?;
    let policies = state.policies.clone();

    blocking(move || policies.remove(req.policy_id)).await?;

    Ok(StatusCode::OK)
}

/// Build policy management routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(
            "/",
            get(list_policies)
                .post(create_policy)
                .delete(remove_policy),
        )
        .route("/{name}", get(list_device_peers))
        .with_state(state)
}
