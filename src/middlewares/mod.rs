pub mod device_gate;
pub mod negotiate;
pub mod require_admin;
pub mod trace_id;
