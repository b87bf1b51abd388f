use crate::{CoreError, CoreResult};

/// Basic email address check.
///
/// - 3 to 255 characters, exactly one `@`
/// - local part: ASCII alphanumerics and `.-+_`
/// - domain: ASCII alphanumerics and `.-`, at least one dot, no empty labels
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    if !domain.contains('.') {
        return false;
    }

    let valid_local = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-');

    if !local.chars().all(valid_local) || !domain.chars().all(valid_domain) {
        return false;
    }

    domain.split('.').all(|label| !label.is_empty())
}

pub fn validate_passenger_email(email: &str) -> CoreResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(CoreError::ValidationError("Invalid email format".to_string()))
    }
}

pub fn validate_passenger_name(name: &str) -> CoreResult<()> {
    if name.trim().is_empty() {
        return Err(CoreError::ValidationError(
            "Passenger name must not be blank".to_string(),
        ));
    }
    Ok(())
}
