pub mod booking;
pub mod file;
pub mod payment;
pub mod payment_available;
pub mod role;
pub mod tour;
pub mod user;
pub mod user_role;
