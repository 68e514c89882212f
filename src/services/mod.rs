pub mod booking;
pub mod identity;
pub mod pricing;
pub mod session;
