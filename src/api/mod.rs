pub mod attendance;
pub mod extra_shift;
pub mod holiday;
pub mod leave_request;
pub mod payroll;
pub mod purchase_request;
pub mod training;
