pub mod attendance_rules;
pub mod context;
pub mod leave_balance;
pub mod notify;
pub mod payroll;
pub mod procurement;
pub mod training;
