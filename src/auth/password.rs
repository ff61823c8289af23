use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;

/// Hash a password using `Argon2id`.
///
/// # Errors
///
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Verify a password against an `Argon2id` hash.
///
/// # Errors
///
/// Returns an error if the stored hash is not a valid PHC string.
pub fn verify_password(password: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 8 to 128 characters.
///
/// # Errors
///
/// Returns a user-facing message if the password is rejected.
pub fn validate_password(password: &str) -> Result<(), String> {
    let len = password.chars().count();
    if len < 8 {
        return Err("Password must be at least 8 characters.".to_string());
    }
    if len > 128 {
        return Err("Password must be at most 128 characters.".to_string());
    }
    Ok(())
}

/// Basic shape check: one `@`, non-empty local part, dotted domain.
///
/// # Errors
///
/// Returns a user-facing message if the email is rejected.
pub fn validate_email(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required.".to_string());
    }
    if trimmed.len() > 255 {
        return Err("Email must be at most 255 characters.".to_string());
    }
    match trimmed.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.') =>
        {
            Ok(())
        }
        _ => Err("Invalid email format.".to_string()),
    }
}

/// 3-50 characters: letters, digits and underscores.
///
/// # Errors
///
/// Returns a user-facing message if the username is rejected.
pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < 3 {
        return Err("Username must be at least 3 characters.".to_string());
    }
    if len > 50 {
        return Err("Username must be at most 50 characters.".to_string());
    }
    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err("Username may only contain letters, numbers, and underscores.".to_string());
    }
    Ok(())
}

/// Run every registration field check and collect all failures.
#[must_use]
pub fn registration_errors(email: &str, username: &str, password: &str) -> Vec<String> {
    [
        validate_email(email),
        validate_username(username),
        validate_password(password),
    ]
    .into_iter()
    .filter_map(Result::err)
    .collect()
}
