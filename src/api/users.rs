use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::StudentProfile;

/* =========================
Current user info
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Caller's account info"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn me(auth: AuthUser, pool: web::Data<MySqlPool>) -> Result<impl Responder, ApiError> {
    // Students have a profile row; staff accounts do not.
    let class_name: Option<String> =
        sqlx::query_scalar("SELECT class_name FROM student_profiles WHERE user_id = ?")
            .bind(auth.user_id)
            .fetch_optional(pool.get_ref())
            .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": auth.user_id,
        "username": auth.username,
        "display_name": auth.display_name,
        "roles": auth.roles.iter().map(|r| r.id()).collect::<Vec<_>>(),
        "class_name": class_name
    })))
}

#[derive(Deserialize, ToSchema)]
pub struct AssignAdvisor {
    #[schema(example = 7)]
    pub advisor_id: u64,
}

/* =========================
Assign a student's advisor (administrator)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/advisor",
    params(("user_id" = u64, Path, description = "Student user id")),
    request_body = AssignAdvisor,
    responses(
        (status = 200, description = "Advisor assigned"),
        (status = 400, description = "Advisor does not hold the advisor role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No student profile for this user")
    ),
    security(("bearer_auth" = [])),
    tag = "Users"
)]
pub async fn assign_advisor(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<AssignAdvisor>,
) -> Result<impl Responder, ApiError> {
    auth.require_any(&[Role::Administrator])?;

    let student_id = path.into_inner();
    let advisor_id = payload.advisor_id;

    let is_advisor: Option<i64> = sqlx::query_scalar(
        "SELECT 1 FROM user_roles WHERE user_id = ? AND role_id = ?",
    )
    .bind(advisor_id)
    .bind(Role::Advisor.id())
    .fetch_optional(pool.get_ref())
    .await?;

    if is_advisor.is_none() {
        return Err(ApiError::Validation(
            "advisor_id does not refer to an advisor account".into(),
        ));
    }

    // Existence checked separately: MySQL reports zero affected rows for
    // a no-op update, which is not a missing profile.
    let profile = sqlx::query_as::<_, StudentProfile>(
        "SELECT user_id, class_name, advisor_id FROM student_profiles WHERE user_id = ?",
    )
    .bind(student_id)
    .fetch_optional(pool.get_ref())
    .await?;

    if profile.is_none() {
        return Err(ApiError::NotFound);
    }

    sqlx::query("UPDATE student_profiles SET advisor_id = ? WHERE user_id = ?")
        .bind(advisor_id)
        .bind(student_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Advisor assigned"
    })))
}
