//! Input checks the auth flows run before contacting the API.

use crate::api::ApiError;

/// Minimum length accepted for a new password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Length of the one-time code mailed by the forgot-password flow.
pub const OTP_LENGTH: usize = 6;

pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Validation("Email and password required".to_string()));
    }
    Ok(())
}

pub fn validate_new_password(password: &str, confirmation: &str) -> Result<(), ApiError> {
    if password.is_empty() || confirmation.is_empty() {
        return Err(ApiError::Validation("Please fill in all password fields".to_string()));
    }
    if password != confirmation {
        return Err(ApiError::Validation("Passwords do not match".to_string()));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_otp(otp: &str) -> Result<(), ApiError> {
    if otp.len() != OTP_LENGTH || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err(ApiError::Validation(format!("Enter the {}-digit code", OTP_LENGTH)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_new_password() {
        assert!(validate_new_password("secret1", "secret1").is_ok());
        assert!(validate_new_password("", "").is_err());
        assert!(validate_new_password("secret1", "secret2").is_err());
        assert!(matches!(
            validate_new_password("abc", "abc"),
            Err(ApiError::Validation(ref m)) if m.contains("at least 6")
        ));
    }

    #[test]
    fn test_validate_otp() {
        assert!(validate_otp("012345").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
        assert!(validate_otp("１２３４５６").is_err());
    }

    #[test]
    fn test_validate_login() {
        assert!(validate_login("a@b.c", "pw").is_ok());
        assert!(validate_login("  ", "pw").is_err());
        assert!(validate_login("a@b.c", "").is_err());
    }
}
