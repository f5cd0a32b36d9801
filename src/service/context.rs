use crate::model::role::Role;

/// Who is performing an operation.
///
/// Built once per request from the bearer token and passed explicitly into
/// every workflow call instead of being read from ambient request state.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorContext {
    pub user_id: u64,
    pub role: Role,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
    pub branch_id: Option<u64>,
}

impl ActorContext {
    pub fn new(user_id: u64, role: Role) -> Self {
        Self {
            user_id,
            role,
            employee_id: None,
            branch_id: None,
        }
    }

    pub fn with_employee(mut self, employee_id: u64) -> Self {
        self.employee_id = Some(employee_id);
        self
    }
}
