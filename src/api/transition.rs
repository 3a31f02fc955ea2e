use sqlx::MySqlPool;
use tracing::info;

use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave::{LeaveAction, LeaveStatus};

/// Applies one workflow action to a leave record as an atomic
/// check-then-act: read the current status under the caller's
/// visibility scope, verify the action is legal from it, then write the
/// new status keyed on the observed one. A concurrent writer between
/// the read and the write makes the conditional update match zero rows,
/// which surfaces as `Conflict`; the record is left untouched.
pub async fn apply_transition(
    pool: &MySqlPool,
    auth: &AuthUser,
    leave_id: u64,
    action: LeaveAction,
    reject_reason: Option<String>,
) -> Result<LeaveStatus, ApiError> {
    auth.require_any(action.required_roles())?;

    // Out-of-scope ids read as absent, same as unknown ids: cancel is
    // restricted to the caller's own record, and the other actions see
    // only what the caller's scope grants (an advisor cannot act on
    // another advisor's advisee).
    let current: Option<i8> = if action == LeaveAction::Cancel {
        sqlx::query_scalar("SELECT status FROM leaves l WHERE l.id = ? AND l.student_id = ?")
            .bind(leave_id)
            .bind(auth.user_id)
            .fetch_optional(pool)
            .await?
    } else {
        let mut sql = String::from("SELECT status FROM leaves l WHERE l.id = ?");
        let scope_arg = auth.visibility_scope().append_sql(&mut sql);

        let mut q = sqlx::query_scalar::<_, i8>(&sql).bind(leave_id);
        if let Some(arg) = scope_arg {
            q = q.bind(arg);
        }
        q.fetch_optional(pool).await?
    };

    let current = current.ok_or(ApiError::NotFound)?;
    let current = LeaveStatus::from_code(current).ok_or(ApiError::Internal)?;

    if !action.applies_to(current) {
        return Err(ApiError::InvalidTransition);
    }

    let target = action.target();

    let result = match action {
        LeaveAction::Cancel => {
            sqlx::query(
                r#"
                UPDATE leaves
                SET status = ?
                WHERE id = ? AND student_id = ? AND status = ?
                "#,
            )
            .bind(target.code())
            .bind(leave_id)
            .bind(auth.user_id)
            .bind(current.code())
            .execute(pool)
            .await?
        }
        LeaveAction::Reject => {
            sqlx::query(
                r#"
                UPDATE leaves
                SET status = ?, approver = ?, reject_reason = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(target.code())
            .bind(&auth.display_name)
            .bind(reject_reason.as_deref())
            .bind(leave_id)
            .bind(current.code())
            .execute(pool)
            .await?
        }
        _ => {
            sqlx::query(
                r#"
                UPDATE leaves
                SET status = ?, approver = ?
                WHERE id = ? AND status = ?
                "#,
            )
            .bind(target.code())
            .bind(&auth.display_name)
            .bind(leave_id)
            .bind(current.code())
            .execute(pool)
            .await?
        }
    };

    if result.rows_affected() == 0 {
        return Err(ApiError::Conflict);
    }

    info!(
        leave_id,
        user_id = auth.user_id,
        from = %current,
        to = %target,
        "Leave transition applied"
    );

    Ok(target)
}
