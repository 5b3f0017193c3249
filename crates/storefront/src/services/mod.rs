//! Business logic services.
//!
//! Services compose repositories and hold the rules; route handlers stay
//! thin and translate between HTTP and these calls.

pub mod auth;
pub mod orders;
pub mod otp;
pub mod password;
pub mod token;
