use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

use crate::api::transition::apply_transition;
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{LeaveAction, LeaveStatus};
use crate::model::role::Role;

/// Submission datetimes come from the dashboard at hour precision;
/// minutes and seconds are optional.
fn parse_leave_datetime(value: &str) -> Option<NaiveDateTime> {
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }
    None
}

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2024-03-01T08", value_type = String)]
    pub start_date: String,
    #[schema(example = "2024-03-01T18", value_type = String)]
    pub end_date: String,
    #[schema(example = "medical")]
    pub reason: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by status code
    #[schema(example = 0)]
    pub status: Option<i8>,
    /// Pagination page number (1-based)
    #[schema(example = 1)]
    pub page: Option<i64>,
    /// Items per page (max 100)
    #[schema(example = 10)]
    pub page_size: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    I8(i8),
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    student_id: u64,
    student_number: String,
    student_name: String,
    class_name: String,
    start_date: NaiveDateTime,
    end_date: NaiveDateTime,
    reason: String,
    submitted_at: Option<DateTime<Utc>>,
    status: i8,
    approver: Option<String>,
    reject_reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveResponse {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 42)]
    pub student_id: u64,
    #[schema(example = "20240101")]
    pub student_number: String,
    #[schema(example = "Alice Zhang")]
    pub student_name: String,
    /// Class label snapshot taken at submission time
    #[schema(example = "CS-2401")]
    pub class_name: String,
    #[schema(example = "2024-03-01T08:00:00", value_type = String)]
    pub start_date: NaiveDateTime,
    #[schema(example = "2024-03-01T18:00:00", value_type = String)]
    pub end_date: NaiveDateTime,
    #[schema(example = "medical")]
    pub reason: String,
    #[schema(example = "2024-03-01T07:12:00Z", value_type = String)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[schema(example = 0)]
    pub status: i8,
    #[schema(example = "pending")]
    pub status_label: Option<String>,
    #[schema(example = "Dr. Li", nullable = true)]
    pub approver: Option<String>,
    #[schema(nullable = true)]
    pub reject_reason: Option<String>,
}

impl From<LeaveRow> for LeaveResponse {
    fn from(row: LeaveRow) -> Self {
        let status_label = LeaveStatus::from_code(row.status).map(|s| s.to_string());
        LeaveResponse {
            id: row.id,
            student_id: row.student_id,
            student_number: row.student_number,
            student_name: row.student_name,
            class_name: row.class_name,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            submitted_at: row.submitted_at,
            status: row.status,
            status_label,
            approver: row.approver,
            reject_reason: row.reject_reason,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub items: Vec<LeaveResponse>,
    #[schema(example = 1)]
    pub total: i64,
    #[schema(example = 1)]
    pub page: i64,
    #[schema(example = 10)]
    pub page_size: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

/// Pagination window for a 1-based page number. Out-of-range pages map
/// to an empty window with accurate navigation flags instead of an
/// error.
pub struct PageWindow {
    /// None means the page selects nothing: before page 1, or so far
    /// past the end the offset does not even fit in u64.
    pub offset: Option<u64>,
    pub has_next: bool,
    pub has_prev: bool,
}

pub fn page_window(page: i64, page_size: u64, total: i64) -> PageWindow {
    if page < 1 {
        return PageWindow {
            offset: None,
            has_next: total > 0,
            has_prev: false,
        };
    }
    // An offset that overflows is unreachably far past the last page;
    // it selects nothing rather than wrapping around into real data.
    match (page as u64 - 1).checked_mul(page_size) {
        Some(offset) => PageWindow {
            offset: Some(offset),
            has_next: (page as i128) * (page_size as i128) < total as i128,
            has_prev: page > 1 && total > 0,
        },
        None => PageWindow {
            offset: None,
            has_next: false,
            has_prev: total > 0,
        },
    }
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted"),
        (status = 400, description = "Invalid dates or empty reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> Result<impl Responder, ApiError> {
    auth.require_any(&[Role::Student])?;

    // 1) validate reason
    if payload.reason.trim().is_empty() {
        return Err(ApiError::Validation("reason must not be empty".into()));
    }

    // 2) validate dates
    let start_date = parse_leave_datetime(&payload.start_date).ok_or_else(|| {
        ApiError::Validation("Datetime has wrong format. Use YYYY-MM-DDTHH format.".into())
    })?;
    let end_date = parse_leave_datetime(&payload.end_date).ok_or_else(|| {
        ApiError::Validation("Datetime has wrong format. Use YYYY-MM-DDTHH format.".into())
    })?;

    if start_date > end_date {
        return Err(ApiError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }

    // 3) snapshot the class label from the profile
    let class_name: Option<String> =
        sqlx::query_scalar("SELECT class_name FROM student_profiles WHERE user_id = ?")
            .bind(auth.user_id)
            .fetch_optional(pool.get_ref())
            .await?;

    let class_name = class_name.ok_or_else(|| {
        ApiError::Validation("User profile or assigned class is not set.".into())
    })?;

    // 4) insert request
    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (student_id, class_name, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(&class_name)
    .bind(start_date)
    .bind(end_date)
    .bind(payload.reason.trim())
    .bind(LeaveStatus::Pending.code())
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": result.last_insert_id(),
        "status": LeaveStatus::Pending.code(),
        "message": "Leave request submitted"
    })))
}

/* =========================
List leave requests (scoped)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, ApiError> {
    let page_size = query.page_size.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1);

    // -------------------------
    // WHERE clause: scope first, then the status filter
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(scope_arg) = auth.visibility_scope().append_sql(&mut where_sql) {
        args.push(FilterValue::U64(scope_arg));
    }

    if let Some(code) = query.status {
        let status = LeaveStatus::from_code(code)
            .ok_or_else(|| ApiError::Validation(format!("unknown status code {code}")))?;
        where_sql.push_str(" AND l.status = ?");
        args.push(FilterValue::I8(status.code()));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leaves l{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::I8(v) => count_q.bind(*v),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query
    // -------------------------
    let window = page_window(page, page_size, total);

    let items = match window.offset {
        None => Vec::new(),
        Some(offset) => {
            let data_sql = format!(
                r#"
                SELECT l.id, l.student_id, u.username AS student_number,
                       u.display_name AS student_name, l.class_name,
                       l.start_date, l.end_date, l.reason, l.submitted_at,
                       l.status, l.approver, l.reject_reason
                FROM leaves l
                JOIN users u ON u.id = l.student_id
                {}
                ORDER BY l.submitted_at DESC, l.id DESC
                LIMIT ? OFFSET ?
                "#,
                where_sql
            );

            let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
            for arg in args {
                data_q = match arg {
                    FilterValue::U64(v) => data_q.bind(v),
                    FilterValue::I8(v) => data_q.bind(v),
                };
            }

            data_q
                .bind(page_size)
                .bind(offset)
                .fetch_all(pool.get_ref())
                .await?
                .into_iter()
                .map(LeaveResponse::from)
                .collect()
        }
    };

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        items,
        total,
        page,
        page_size,
        has_next: window.has_next,
        has_prev: window.has_prev,
    }))
}

/* =========================
Fetch one leave request (scoped)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown id or outside the caller's scope")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let leave_id = path.into_inner();

    let mut sql = String::from(
        r#"
        SELECT l.id, l.student_id, u.username AS student_number,
               u.display_name AS student_name, l.class_name,
               l.start_date, l.end_date, l.reason, l.submitted_at,
               l.status, l.approver, l.reject_reason
        FROM leaves l
        JOIN users u ON u.id = l.student_id
        WHERE l.id = ?
        "#,
    );

    let scope_arg = auth.visibility_scope().append_sql(&mut sql);

    let mut q = sqlx::query_as::<_, LeaveRow>(&sql).bind(leave_id);
    if let Some(arg) = scope_arg {
        q = q.bind(arg);
    }

    let row = q.fetch_optional(pool.get_ref()).await?;

    match row {
        Some(row) => Ok(HttpResponse::Ok().json(LeaveResponse::from(row))),
        None => Err(ApiError::NotFound),
    }
}

/* =========================
Cancel own leave request
========================= */
#[utoipa::path(
    patch,
    path = "/api/v1/leave/{leave_id}/cancel",
    params(("leave_id" = u64, Path, description = "Leave request id")),
    responses(
        (status = 200, description = "Leave cancelled"),
        (status = 400, description = "Not cancellable from the current status"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Unknown id or not the caller's record")
    ),
    security(("bearer_auth" = [])),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, ApiError> {
    let leave_id = path.into_inner();

    let status =
        apply_transition(pool.get_ref(), &auth, leave_id, LeaveAction::Cancel, None).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave cancelled",
        "status": status.code()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hour_precision_datetimes_are_accepted() {
        assert!(parse_leave_datetime("2024-03-01T08").is_some());
        assert!(parse_leave_datetime("2024-03-01T08:30").is_some());
        assert!(parse_leave_datetime("2024-03-01T08:30:15").is_some());
        assert!(parse_leave_datetime("2024-03-01").is_none());
        assert!(parse_leave_datetime("not-a-date").is_none());
    }

    #[test]
    fn window_for_a_normal_page() {
        let w = page_window(2, 10, 35);
        assert_eq!(w.offset, Some(10));
        assert!(w.has_next);
        assert!(w.has_prev);
    }

    #[test]
    fn first_page_has_no_prev() {
        let w = page_window(1, 10, 35);
        assert_eq!(w.offset, Some(0));
        assert!(w.has_next);
        assert!(!w.has_prev);
    }

    #[test]
    fn last_page_has_no_next() {
        let w = page_window(4, 10, 35);
        assert_eq!(w.offset, Some(30));
        assert!(!w.has_next);
        assert!(w.has_prev);
    }

    #[test]
    fn page_below_one_is_empty_with_flags() {
        let w = page_window(0, 10, 35);
        assert_eq!(w.offset, None);
        assert!(w.has_next);
        assert!(!w.has_prev);

        let w = page_window(-3, 10, 0);
        assert_eq!(w.offset, None);
        assert!(!w.has_next);
        assert!(!w.has_prev);
    }

    #[test]
    fn page_past_the_end_is_empty_with_flags() {
        let w = page_window(9, 10, 35);
        assert_eq!(w.offset, Some(80));
        assert!(!w.has_next);
        assert!(w.has_prev);
    }

    #[test]
    fn huge_page_number_is_out_of_range_not_a_panic() {
        let w = page_window(i64::MAX, 100, 35);
        assert_eq!(w.offset, None);
        assert!(!w.has_next);
        assert!(w.has_prev);

        let w = page_window(i64::MAX, 100, 0);
        assert_eq!(w.offset, None);
        assert!(!w.has_next);
        assert!(!w.has_prev);
    }

    #[test]
    fn empty_data_set_has_no_navigation() {
        let w = page_window(1, 10, 0);
        assert_eq!(w.offset, Some(0));
        assert!(!w.has_next);
        assert!(!w.has_prev);
    }
}
