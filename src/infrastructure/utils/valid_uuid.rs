use uuid::Uuid;

use crate::errors::AppError;

pub const INVALID_LEAD_ID: &str = "Неверный идентификатор заявки";

/// Validates if a string is a valid UUID format
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::BadRequest(INVALID_LEAD_ID.to_string()))
}

/// Shortens free-form input for log records, on a char boundary.
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &input[..idx]),
        None => input.to_string(),
    }
}
