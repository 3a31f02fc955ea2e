use crate::api::admin::RejectLeave;
use crate::api::leave::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveResponse};
use crate::api::users::AssignAdvisor;
use crate::model::leave::LeaveStatus;
use crate::models::{LoginReqDto, RegisterReq};
use crate::stats::{HeatmapCell, LeaveStatistics, NameValue, TrendData};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Student Leave Management API",
        version = "1.0.0",
        description = r#"
## Student Leave Management System

Backend for a student leave workflow with multi-role approval and a
statistics dashboard.

### Key Features
- **Leave workflow**
  - Students submit and cancel leave requests
  - Advisors pre-approve, administrators and the long-leave authority
    approve or reject, advisors/administrators close completed leaves
- **Role-scoped visibility**
  - Students see their own records, advisors their advisees',
    administrators everything
- **Statistics dashboard**
  - Class distribution, daily trend with a smoothed overlay, duration
    buckets and a month/weekday heatmap, cached for 24 hours

### Security
Endpoints under the API prefix require **JWT Bearer authentication**;
workflow transitions are gated per role.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::create_leave,
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::cancel_leave,

        crate::api::admin::approve_leave,
        crate::api::admin::pre_approve_leave,
        crate::api::admin::mas_approve_leave,
        crate::api::admin::reject_leave,
        crate::api::admin::complete_leave,

        crate::api::users::me,
        crate::api::users::assign_advisor,

        crate::api::statistics::statistics
    ),
    components(
        schemas(
            CreateLeave,
            LeaveFilter,
            LeaveResponse,
            LeaveListResponse,
            LeaveStatus,
            RejectLeave,
            RegisterReq,
            LoginReqDto,
            AssignAdvisor,
            LeaveStatistics,
            NameValue,
            TrendData,
            HeatmapCell
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Student leave APIs"),
        (name = "Leave workflow", description = "Approval workflow APIs"),
        (name = "Users", description = "Account and profile APIs"),
        (name = "Statistics", description = "Dashboard aggregation APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
