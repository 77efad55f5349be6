//! Utility functions for formatting and input validation.

pub mod format;
pub mod validate;

pub use format::{format_date, format_money, format_optional, format_remaining, truncate_string};
pub use validate::{validate_login, validate_new_password, validate_otp};
