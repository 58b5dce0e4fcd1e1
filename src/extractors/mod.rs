mod client_ip;
mod device_signals;
mod identity;

pub use client_ip::ClientIp;
pub use identity::Identity;
