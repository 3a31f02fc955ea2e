use strum_macros::Display;
use utoipa::ToSchema;

use crate::model::role::Role;

/// Status codes are stable wire values persisted in `leaves.status`
/// (TINYINT); do not renumber.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, ToSchema)]
#[strum(serialize_all = "snake_case")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    // No operation currently produces this state; `reject` still accepts
    // it as a source so historical records remain actionable.
    // TODO: drop or wire up once product decides whether resubmission
    // returns as a distinct state or a fresh PENDING record.
    Resubmitted,
    PreApproved,
    Cancelled,
}

impl LeaveStatus {
    pub fn code(&self) -> i8 {
        match self {
            LeaveStatus::Pending => 0,
            LeaveStatus::Approved => 1,
            LeaveStatus::Rejected => 2,
            LeaveStatus::Completed => 3,
            LeaveStatus::Resubmitted => 4,
            LeaveStatus::PreApproved => 5,
            LeaveStatus::Cancelled => -1,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            0 => Some(LeaveStatus::Pending),
            1 => Some(LeaveStatus::Approved),
            2 => Some(LeaveStatus::Rejected),
            3 => Some(LeaveStatus::Completed),
            4 => Some(LeaveStatus::Resubmitted),
            5 => Some(LeaveStatus::PreApproved),
            -1 => Some(LeaveStatus::Cancelled),
            _ => None,
        }
    }
}

/// Workflow operations that move an existing record between states.
/// Submission is not listed here: it creates the record in PENDING.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LeaveAction {
    PreApprove,
    Approve,
    MasApprove,
    Reject,
    Complete,
    Cancel,
}

impl LeaveAction {
    /// States the action may legally start from.
    pub fn allowed_from(&self) -> &'static [LeaveStatus] {
        match self {
            LeaveAction::PreApprove => &[LeaveStatus::Pending],
            LeaveAction::Approve => &[LeaveStatus::Pending, LeaveStatus::PreApproved],
            // The long-leave path requires the advisor's sign-off first.
            LeaveAction::MasApprove => &[LeaveStatus::PreApproved],
            LeaveAction::Reject => &[LeaveStatus::Pending, LeaveStatus::Resubmitted],
            LeaveAction::Complete => &[LeaveStatus::Approved],
            LeaveAction::Cancel => &[LeaveStatus::Pending],
        }
    }

    pub fn target(&self) -> LeaveStatus {
        match self {
            LeaveAction::PreApprove => LeaveStatus::PreApproved,
            LeaveAction::Approve => LeaveStatus::Approved,
            LeaveAction::MasApprove => LeaveStatus::Approved,
            LeaveAction::Reject => LeaveStatus::Rejected,
            LeaveAction::Complete => LeaveStatus::Completed,
            LeaveAction::Cancel => LeaveStatus::Cancelled,
        }
    }

    /// Roles allowed to perform the action. Cancel is additionally
    /// restricted to the record's own student, enforced at the store
    /// query, not here.
    pub fn required_roles(&self) -> &'static [Role] {
        match self {
            LeaveAction::PreApprove => &[Role::Advisor, Role::Administrator],
            LeaveAction::Approve => &[Role::Administrator, Role::LongLeaveAuthority],
            LeaveAction::MasApprove => &[Role::LongLeaveAuthority],
            LeaveAction::Reject => &[
                Role::Advisor,
                Role::Administrator,
                Role::LongLeaveAuthority,
            ],
            LeaveAction::Complete => &[Role::Advisor, Role::Administrator],
            LeaveAction::Cancel => &[Role::Student],
        }
    }

    /// Whether the action records who performed it.
    pub fn stamps_approver(&self) -> bool {
        !matches!(self, LeaveAction::Cancel)
    }

    pub fn applies_to(&self, current: LeaveStatus) -> bool {
        self.allowed_from().contains(&current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_STATUSES: [LeaveStatus; 7] = [
        LeaveStatus::Pending,
        LeaveStatus::Approved,
        LeaveStatus::Rejected,
        LeaveStatus::Completed,
        LeaveStatus::Resubmitted,
        LeaveStatus::PreApproved,
        LeaveStatus::Cancelled,
    ];

    const ALL_ACTIONS: [LeaveAction; 6] = [
        LeaveAction::PreApprove,
        LeaveAction::Approve,
        LeaveAction::MasApprove,
        LeaveAction::Reject,
        LeaveAction::Complete,
        LeaveAction::Cancel,
    ];

    #[test]
    fn status_codes_round_trip() {
        for status in ALL_STATUSES {
            assert_eq!(LeaveStatus::from_code(status.code()), Some(status));
        }
        assert_eq!(LeaveStatus::from_code(6), None);
        assert_eq!(LeaveStatus::from_code(-2), None);
    }

    #[test]
    fn every_target_is_a_defined_status() {
        for action in ALL_ACTIONS {
            assert!(LeaveStatus::from_code(action.target().code()).is_some());
        }
    }

    #[test]
    fn transition_table_matches_workflow() {
        assert!(LeaveAction::PreApprove.applies_to(LeaveStatus::Pending));
        assert!(!LeaveAction::PreApprove.applies_to(LeaveStatus::PreApproved));

        assert!(LeaveAction::Approve.applies_to(LeaveStatus::Pending));
        assert!(LeaveAction::Approve.applies_to(LeaveStatus::PreApproved));
        assert!(!LeaveAction::Approve.applies_to(LeaveStatus::Approved));

        // Long-leave approval is only valid after pre-approval.
        assert!(LeaveAction::MasApprove.applies_to(LeaveStatus::PreApproved));
        assert!(!LeaveAction::MasApprove.applies_to(LeaveStatus::Pending));

        assert!(LeaveAction::Reject.applies_to(LeaveStatus::Pending));
        assert!(LeaveAction::Reject.applies_to(LeaveStatus::Resubmitted));
        assert!(!LeaveAction::Reject.applies_to(LeaveStatus::Approved));

        assert!(LeaveAction::Complete.applies_to(LeaveStatus::Approved));
        assert!(!LeaveAction::Complete.applies_to(LeaveStatus::Pending));
    }

    #[test]
    fn cancel_only_applies_to_pending() {
        for status in ALL_STATUSES {
            assert_eq!(
                LeaveAction::Cancel.applies_to(status),
                status == LeaveStatus::Pending
            );
        }
    }

    #[test]
    fn terminal_states_admit_no_action() {
        for terminal in [LeaveStatus::Completed, LeaveStatus::Cancelled] {
            for action in ALL_ACTIONS {
                assert!(!action.applies_to(terminal));
            }
        }
    }

    #[test]
    fn cancel_stamps_no_approver() {
        assert!(!LeaveAction::Cancel.stamps_approver());
        for action in ALL_ACTIONS {
            if action != LeaveAction::Cancel {
                assert!(action.stamps_approver());
            }
        }
    }
}
