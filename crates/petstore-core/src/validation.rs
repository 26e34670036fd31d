//! # Validation Module
//!
//! Input validation utilities for the petstore.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Transition rules (transitions.rs)                            │
//! │  └── State preconditions, checked inside the atomic unit               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints                                                │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use petstore_core::validation::{validate_username, validate_photo_url};
//!
//! validate_username("jane_doe").unwrap();
//! assert!(validate_photo_url("ftp://example.com/cat.png").is_err());
//! ```

use crate::error::ValidationError;
use crate::types::{NewPet, NewUser, PetPatch, UserPatch};
use crate::{MAX_PET_PHOTOS, MAX_PET_TAGS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn required_len(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }
    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a username.
///
/// ## Rules
/// - 3 to 50 characters
/// - Letters, digits, `_`, `-` and `.` only
///
/// ## Example
/// ```rust
/// use petstore_core::validation::validate_username;
///
/// assert!(validate_username("user1").is_ok());
/// assert!(validate_username("ab").is_err());
/// assert!(validate_username("no spaces").is_err());
/// ```
pub fn validate_username(username: &str) -> ValidationResult<()> {
    required_len("username", username, 3, 50)?;

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, numbers, '_', '-' and '.'".to_string(),
        });
    }

    Ok(())
}

/// Validates a password before hashing.
///
/// ## Rules
/// - 8 to 128 characters
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::Required {
            field: "password".to_string(),
        });
    }
    let len = password.chars().count();
    if len < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }
    if len > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }
    Ok(())
}

/// Validates an email address (shape only).
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required_len("email", email, 3, 254)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@domain".to_string(),
    };

    let (local, domain) = email.trim().split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(invalid());
    }

    Ok(())
}

/// Validates a phone number.
///
/// Digits plus the usual separators, at most 32 characters.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    required_len("phone", phone, 1, 32)?;

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces and + - ( )".to_string(),
        });
    }

    Ok(())
}

/// Validates a pet name (1 to 100 characters).
pub fn validate_pet_name(name: &str) -> ValidationResult<()> {
    required_len("name", name, 1, 100)
}

/// Validates a category name (1 to 50 characters).
pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    required_len("category", name, 1, 50)
}

/// Validates a tag name (1 to 50 characters).
pub fn validate_tag_name(name: &str) -> ValidationResult<()> {
    required_len("tag", name, 1, 50)
}

/// Validates a photo URL.
///
/// ## Rules
/// - `http://` or `https://`
/// - At most 2048 characters
pub fn validate_photo_url(url: &str) -> ValidationResult<()> {
    required_len("photoUrl", url, 1, 2048)?;

    let url = url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidFormat {
            field: "photoUrl".to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a tag list.
pub fn validate_tags(tags: &[String]) -> ValidationResult<()> {
    if tags.len() > MAX_PET_TAGS {
        return Err(ValidationError::TooMany {
            field: "tags".to_string(),
            max: MAX_PET_TAGS,
        });
    }
    tags.iter().try_for_each(|t| validate_tag_name(t))
}

/// Validates a photo URL list.
pub fn validate_photo_urls(urls: &[String]) -> ValidationResult<()> {
    if urls.len() > MAX_PET_PHOTOS {
        return Err(ValidationError::TooMany {
            field: "photoUrls".to_string(),
            max: MAX_PET_PHOTOS,
        });
    }
    urls.iter().try_for_each(|u| validate_photo_url(u))
}

// =============================================================================
// Payload Validators
// =============================================================================

/// Validates a pet creation payload.
pub fn validate_new_pet(pet: &NewPet) -> ValidationResult<()> {
    validate_pet_name(&pet.name)?;
    if let Some(category) = &pet.category {
        validate_category_name(category)?;
    }
    validate_tags(&pet.tags)?;
    validate_photo_urls(&pet.photo_urls)
}

/// Validates the fields present in a pet patch.
pub fn validate_pet_patch(patch: &PetPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_pet_name(name)?;
    }
    if let Some(Some(category)) = &patch.category {
        validate_category_name(category)?;
    }
    if let Some(tags) = &patch.tags {
        validate_tags(tags)?;
    }
    if let Some(urls) = &patch.photo_urls {
        validate_photo_urls(urls)?;
    }
    Ok(())
}

/// Validates a registration payload.
pub fn validate_new_user(user: &NewUser) -> ValidationResult<()> {
    validate_username(&user.username)?;
    validate_password(&user.password)?;
    if let Some(email) = &user.email {
        validate_email(email)?;
    }
    if let Some(phone) = &user.phone {
        validate_phone(phone)?;
    }
    Ok(())
}

/// Validates the fields present in a profile patch.
pub fn validate_user_patch(patch: &UserPatch) -> ValidationResult<()> {
    if let Some(Some(email)) = &patch.email {
        validate_email(email)?;
    }
    if let Some(Some(phone)) = &patch.phone {
        validate_phone(phone)?;
    }
    if let Some(password) = &patch.password {
        validate_password(password)?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("a.b-c_d").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("al").is_err());
        assert!(validate_username("bad name").is_err());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_password() {
        assert!(validate_password("hunter22").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
    }

    #[test]
    fn test_email() {
        assert!(validate_email("a@b.io").is_ok());
        assert!(validate_email("nope").is_err());
        assert!(validate_email("@b.io").is_err());
        assert!(validate_email("a@localhost").is_err());
    }

    #[test]
    fn test_phone() {
        assert!(validate_phone("+1 (555) 123-4567").is_ok());
        assert!(validate_phone("call me").is_err());
    }

    #[test]
    fn test_photo_urls() {
        assert!(validate_photo_url("https://img.example.com/rex.jpg").is_ok());
        assert!(validate_photo_url("rex.jpg").is_err());
        let too_many: Vec<String> = (0..=MAX_PET_PHOTOS)
            .map(|i| format!("https://img.example.com/{i}.jpg"))
            .collect();
        assert!(matches!(
            validate_photo_urls(&too_many),
            Err(ValidationError::TooMany { .. })
        ));
    }

    #[test]
    fn test_new_pet() {
        let pet = NewPet {
            name: "Rex".to_string(),
            category: Some("Dogs".to_string()),
            tags: vec!["friendly".to_string()],
            photo_urls: vec!["https://img.example.com/rex.jpg".to_string()],
        };
        assert!(validate_new_pet(&pet).is_ok());

        let nameless = NewPet {
            name: "  ".to_string(),
            ..pet
        };
        assert!(matches!(
            validate_new_pet(&nameless),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_user_patch_allows_clearing() {
        let patch = UserPatch {
            email: Some(None),
            ..Default::default()
        };
        assert!(validate_user_patch(&patch).is_ok());

        let patch = UserPatch {
            email: Some(Some("broken".to_string())),
            ..Default::default()
        };
        assert!(validate_user_patch(&patch).is_err());
    }
}
