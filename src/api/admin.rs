use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::api::transition::apply_transition;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{LeaveAction, LeaveStatus};

fn transition_ok(message: &str, status: LeaveStatus) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "status": status.code()
    }))
}

/* =========================
Approve leave (administrator / long-leave authority)
========================= */
#[utoipa::path(
    patch,
    path = "/api/v1/admin/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Not approvable from the current status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Concurrent transition won the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave workflow"
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let status = apply_transition(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveAction::Approve,
        None,
    )
    .await?;
    Ok(transition_ok("Leave approved", status))
}

/* =========================
Pre-approve leave (advisor / administrator)
========================= */
#[utoipa::path(
    patch,
    path = "/api/v1/admin/leave/{leave_id}/pre-approve",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave pre-approved"),
        (status = 400, description = "Only pending leaves can be pre-approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Concurrent transition won the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave workflow"
)]
pub async fn pre_approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let status = apply_transition(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveAction::PreApprove,
        None,
    )
    .await?;
    Ok(transition_ok("Leave pre-approved", status))
}

/* =========================
Long-leave approval (long-leave authority only)
========================= */
#[utoipa::path(
    patch,
    path = "/api/v1/admin/leave/{leave_id}/mas-approve",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Long leave approved"),
        (status = 400, description = "Record is not pre-approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Concurrent transition won the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave workflow"
)]
pub async fn mas_approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let status = apply_transition(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveAction::MasApprove,
        None,
    )
    .await?;
    Ok(transition_ok("Long leave approved", status))
}

#[derive(Deserialize, ToSchema)]
pub struct RejectLeave {
    #[schema(example = "insufficient justification", nullable = true)]
    pub reject_reason: Option<String>,
}

/* =========================
Reject leave
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/admin/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    request_body = RejectLeave,
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Not rejectable from the current status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Concurrent transition won the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave workflow"
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<RejectLeave>,
) -> Result<impl Responder, ApiError> {
    let status = apply_transition(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveAction::Reject,
        payload.into_inner().reject_reason,
    )
    .await?;
    Ok(transition_ok("Leave rejected", status))
}

/* =========================
Complete leave (student returned)
========================= */
#[utoipa::path(
    patch,
    path = "/api/v1/admin/leave/{leave_id}/complete",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave completed"),
        (status = 400, description = "Only approved leaves can be completed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Concurrent transition won the race")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave workflow"
)]
pub async fn complete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let status = apply_transition(
        pool.get_ref(),
        &auth,
        path.into_inner(),
        LeaveAction::Complete,
        None,
    )
    .await?;
    Ok(transition_ok("Leave completed", status))
}
