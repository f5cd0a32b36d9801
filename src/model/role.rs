use serde::{Deserialize, Serialize};
use strum_macros::Display;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
    Finance = 6,
    Supplier = 7,
    Procurement = 8,
    Inventory = 9,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            6 => Some(Role::Finance),
            7 => Some(Role::Supplier),
            8 => Some(Role::Procurement),
            9 => Some(Role::Inventory),
            _ => None,
        }
    }

    pub fn is_hr_or_admin(self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}
