use app_error::{AppError, AppResult};
use app_models::{LoginInput, RegisterInput};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"(?i)^([a-z0-9_+]([a-z0-9_+.\-]*[a-z0-9_+])?)@([a-z0-9]+([\-\.]{1}[a-z0-9]+)*\.[a-z]{2,24})$"
    ).unwrap();

    // Alphanumeric characters, underscores, and hyphens, 3-30 characters
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9_-]{3,30}$"
    ).unwrap();
}

pub fn validate_username(username: &str) -> AppResult<()> {
    if username.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Username cannot be empty".to_string(),
        ));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(AppError::ValidationError(
            "Username must be 3-30 characters long and can only contain letters, numbers, underscores, and hyphens".to_string()
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if email.trim().is_empty() {
        return Err(AppError::ValidationError(
            "Email cannot be empty".to_string(),
        ));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(AppError::ValidationError(
            "Invalid email format".to_string(),
        ));
    }

    Ok(())
}

/// Passwords only need to be present; strength rules are not enforced.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::ValidationError(
            "Password cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Sanitizes a string input by trimming whitespace
pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

/// Trims and validates a registration payload. The password is left as typed.
pub fn sanitize_registration(input: RegisterInput) -> AppResult<RegisterInput> {
    let sanitized = RegisterInput {
        email: sanitize_string(&input.email),
        username: sanitize_string(&input.username),
        password: input.password,
    };

    validate_email(&sanitized.email)?;
    validate_username(&sanitized.username)?;
    validate_password(&sanitized.password)?;

    Ok(sanitized)
}

pub fn sanitize_login(input: LoginInput) -> AppResult<LoginInput> {
    let sanitized = LoginInput {
        email: sanitize_string(&input.email),
        password: input.password,
    };

    if sanitized.email.is_empty() || sanitized.password.is_empty() {
        return Err(AppError::ValidationError(
            "Email and password are required".to_string(),
        ));
    }

    Ok(sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("First.Last+tag@Example.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@x").is_err());
        assert!(validate_email("a@x.com trailing").is_err());
    }

    #[test]
    fn test_username_validation() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a_b-c").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("bad name").is_err());
    }

    #[test]
    fn test_registration_is_trimmed() {
        let input = RegisterInput {
            email: "  a@x.com ".into(),
            username: " alice ".into(),
            password: " pw1 ".into(),
        };

        let sanitized = sanitize_registration(input).unwrap();
        assert_eq!(sanitized.email, "a@x.com");
        assert_eq!(sanitized.username, "alice");
        assert_eq!(sanitized.password, " pw1 ");
    }

    #[test]
    fn test_registration_requires_password() {
        let input = RegisterInput {
            email: "a@x.com".into(),
            username: "alice".into(),
            password: String::new(),
        };
        assert!(matches!(
            sanitize_registration(input),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_login_requires_both_fields() {
        assert!(sanitize_login(LoginInput::default()).is_err());
        assert!(
            sanitize_login(LoginInput {
                email: " a@x.com ".into(),
                password: "pw".into()
            })
            .is_ok()
        );
    }
}
