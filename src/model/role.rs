#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Student = 1,
    Advisor = 2,
    Administrator = 3,
    LongLeaveAuthority = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Student),
            2 => Some(Role::Advisor),
            3 => Some(Role::Administrator),
            4 => Some(Role::LongLeaveAuthority),
            _ => None,
        }
    }

    pub fn id(&self) -> u8 {
        *self as u8
    }
}

/// Capability check: allowed iff the principal holds at least one of the
/// required roles.
pub fn has_any(roles: &[Role], required: &[Role]) -> bool {
    roles.iter().any(|r| required.contains(r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_id_round_trips_known_roles() {
        for role in [
            Role::Student,
            Role::Advisor,
            Role::Administrator,
            Role::LongLeaveAuthority,
        ] {
            assert_eq!(Role::from_id(role.id()), Some(role));
        }
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(5), None);
    }

    #[test]
    fn has_any_is_set_intersection() {
        let roles = [Role::Student, Role::Advisor];
        assert!(has_any(&roles, &[Role::Advisor, Role::Administrator]));
        assert!(!has_any(&roles, &[Role::Administrator]));
        assert!(!has_any(&[], &[Role::Student]));
    }
}
