pub mod attendance;
pub mod base_salary;
pub mod employee;
pub mod extra_shift;
pub mod holiday;
pub mod leave_request;
pub mod payslip;
pub mod purchase_request;
pub mod role;
