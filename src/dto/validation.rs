//! Validation helpers for DTOs.

use validator::ValidationError;

/// Shortest accepted room code.
pub const ROOM_CODE_MIN: usize = 4;
/// Longest accepted room code.
pub const ROOM_CODE_MAX: usize = 8;
/// Longest accepted team name.
pub const TEAM_NAME_MAX: usize = 40;

/// Validates a client-supplied room code: 4 to 8 ASCII letters or digits.
///
/// Codes are canonicalized to uppercase before storage, so case is accepted
/// here and folded later.
pub fn validate_room_code(code: &str) -> Result<(), ValidationError> {
    let trimmed = code.trim();
    if !(ROOM_CODE_MIN..=ROOM_CODE_MAX).contains(&trimmed.len()) {
        let mut err = ValidationError::new("room_code_length");
        err.message = Some(
            format!(
                "room code must be {ROOM_CODE_MIN} to {ROOM_CODE_MAX} characters (got {})",
                trimmed.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("room_code_format");
        err.message = Some("room code must contain only ASCII letters and digits".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a team name: non-blank after trimming, at most 40 characters.
pub fn validate_team_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("team_name_blank");
        err.message = Some("team name must not be blank".into());
        return Err(err);
    }

    if trimmed.chars().count() > TEAM_NAME_MAX {
        let mut err = ValidationError::new("team_name_length");
        err.message = Some(format!("team name must be at most {TEAM_NAME_MAX} characters").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_code_valid() {
        assert!(validate_room_code("DEMO").is_ok());
        assert!(validate_room_code("demo42").is_ok());
        assert!(validate_room_code("  ABCD1234  ").is_ok());
    }

    #[test]
    fn test_validate_room_code_invalid() {
        assert!(validate_room_code("").is_err());
        assert!(validate_room_code("ABC").is_err()); // too short
        assert!(validate_room_code("ABCDEFGHI").is_err()); // too long
        assert!(validate_room_code("AB CD").is_err()); // inner space
        assert!(validate_room_code("DEMO!").is_err()); // punctuation
    }

    #[test]
    fn test_validate_team_name_valid() {
        assert!(validate_team_name("Alpha").is_ok());
        assert!(validate_team_name("  The Quizzards  ").is_ok());
    }

    #[test]
    fn test_validate_team_name_invalid() {
        assert!(validate_team_name("").is_err());
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name(&"x".repeat(41)).is_err());
    }
}
