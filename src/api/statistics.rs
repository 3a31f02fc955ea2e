use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;
use tracing::debug;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::stats::{self, LeaveSample, LeaveStatistics};
use crate::stats::cache::StatsCache;

/* =========================
Dashboard statistics snapshot
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/statistics",
    responses(
        (status = 200, description = "Aggregate dashboard data", body = LeaveStatistics),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Statistics"
)]
pub async fn statistics(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    cache: web::Data<StatsCache>,
) -> Result<impl Responder, ApiError> {
    auth.require_any(&[Role::Administrator])?;

    let snapshot = cache
        .get_or_compute(async {
            debug!("Recomputing statistics snapshot");

            let samples = sqlx::query_as::<_, LeaveSample>(
                r#"SELECT class_name, start_date, end_date FROM leaves"#,
            )
            .fetch_all(pool.get_ref())
            .await?;

            Ok(stats::compute(&samples))
        })
        .await?;

    Ok(HttpResponse::Ok().json(snapshot.as_ref()))
}
