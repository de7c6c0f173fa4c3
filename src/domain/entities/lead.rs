use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// ───── Constants ──────────────────────────────────────────────────────
const MIN_NAME_LENGTH: usize = 2;
const MAX_NAME_LENGTH: usize = 100;
const MAX_MESSAGE_LENGTH: u64 = 1000;

pub const NAME_TOO_SHORT: &str = "Имя должно содержать минимум 2 символа";
pub const NAME_TOO_LONG: &str = "Имя слишком длинное";
pub const PHONE_INVALID: &str = "Неверный формат телефона";
pub const MESSAGE_TOO_LONG: &str = "Сообщение слишком длинное";

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9\s\-\(\)]{10,20}$").expect("phone pattern is valid")
});

// ───── Status ─────────────────────────────────────────────────────────

/// Triage state of a lead. Any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "lead_status", rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    /// Older clients send `converted` for the same state.
    #[serde(alias = "converted")]
    Completed,
    Rejected,
}

impl LeadStatus {
    pub const ALL: [LeadStatus; 4] = [
        LeadStatus::New,
        LeadStatus::Contacted,
        LeadStatus::Completed,
        LeadStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Completed => "completed",
            LeadStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "completed" | "converted" => Ok(LeadStatus::Completed),
            "rejected" => Ok(LeadStatus::Rejected),
            _ => Err(()),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub message: Option<String>,
    pub status: LeadStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated values ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadInsert {
    pub name: String,
    pub phone: String,
    pub message: Option<String>,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// Contact form submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct NewLeadRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,

    #[validate(length(max = MAX_MESSAGE_LENGTH, message = "Сообщение слишком длинное"))]
    pub message: Option<String>,
}

impl From<NewLeadRequest> for LeadInsert {
    fn from(request: NewLeadRequest) -> Self {
        LeadInsert {
            name: request.name,
            phone: request.phone,
            message: request.message.filter(|m| !m.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateLeadStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadListQuery {
    pub status: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadCreatedResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LeadDeletedResponse {
    pub message: String,
}

/// Per-status counters for the admin dashboard.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadStats {
    pub total: i64,
    pub new: i64,
    pub contacted: i64,
    pub completed: i64,
    pub rejected: i64,
}

impl LeadStats {
    pub fn from_counts(counts: impl IntoIterator<Item = (LeadStatus, i64)>) -> Self {
        let mut stats = LeadStats::default();
        for (status, count) in counts {
            match status {
                LeadStatus::New => stats.new += count,
                LeadStatus::Contacted => stats.contacted += count,
                LeadStatus::Completed => stats.completed += count,
                LeadStatus::Rejected => stats.rejected += count,
            }
            stats.total += count;
        }
        stats
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < MIN_NAME_LENGTH {
        return Err(new_validation_error("name_too_short", NAME_TOO_SHORT));
    }
    if len > MAX_NAME_LENGTH {
        return Err(new_validation_error("name_too_long", NAME_TOO_LONG));
    }
    Ok(())
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if !PHONE_REGEX.is_match(phone) {
        return Err(new_validation_error("phone_format", PHONE_INVALID));
    }
    Ok(())
}

fn new_validation_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::ValidationErrors;

    fn request(name: &str, phone: &str, message: Option<&str>) -> NewLeadRequest {
        NewLeadRequest {
            name: name.into(),
            phone: phone.into(),
            message: message.map(String::from),
        }
    }

    fn messages(errors: &ValidationErrors) -> Vec<String> {
        errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect()
    }

    #[test]
    fn accepts_valid_submission() {
        assert!(request("Ann Lee", "+1 555-123-4567", Some("Need a bench")).validate().is_ok());
        assert!(request("Иван", "+7 (999) 123-45-67", None).validate().is_ok());
    }

    #[test]
    fn reports_every_violation() {
        let errors = request("A", "123", Some("x".repeat(1001).as_str())).validate().unwrap_err();
        let msgs = messages(&errors);

        assert!(msgs.contains(&NAME_TOO_SHORT.to_string()));
        assert!(msgs.contains(&PHONE_INVALID.to_string()));
        assert!(msgs.contains(&MESSAGE_TOO_LONG.to_string()));
        assert_eq!(msgs.len(), 3);
    }

    #[test]
    fn name_length_counts_characters_not_bytes() {
        assert!(validate_name("Ян").is_ok());
        assert!(validate_name(&"я".repeat(100)).is_ok());
        assert_eq!(
            validate_name(&"я".repeat(101)).unwrap_err().message.unwrap(),
            NAME_TOO_LONG
        );
    }

    #[test]
    fn phone_pattern_bounds() {
        assert!(validate_phone("1234567890").is_ok());
        assert!(validate_phone("+12345678901234567890").is_ok());
        assert!(validate_phone("123456789").is_err());
        assert!(validate_phone("123456789012345678901").is_err());
        assert!(validate_phone("555-CALL-NOW").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let parsed: NewLeadRequest = serde_json::from_str("{}").unwrap();
        let msgs = messages(&parsed.validate().unwrap_err());
        assert!(msgs.contains(&NAME_TOO_SHORT.to_string()));
        assert!(msgs.contains(&PHONE_INVALID.to_string()));
    }

    #[test]
    fn blank_message_is_dropped_on_insert() {
        let insert = LeadInsert::from(request("Ann", "+1 555 123 4567", Some("   ")));
        assert_eq!(insert.message, None);
    }

    #[test]
    fn legacy_converted_label_maps_to_completed() {
        assert_eq!("converted".parse::<LeadStatus>(), Ok(LeadStatus::Completed));
        let parsed: LeadStatus = serde_json::from_str("\"converted\"").unwrap();
        assert_eq!(parsed, LeadStatus::Completed);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"completed\"");
        assert!("won".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn lead_serializes_with_camel_case_timestamps() {
        let now = Utc::now();
        let lead = Lead {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            phone: "+1 555 123 4567".into(),
            message: None,
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        };
        let value = serde_json::to_value(&lead).unwrap();
        assert_eq!(value["status"], "new");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn stats_accumulate_per_status() {
        let stats = LeadStats::from_counts([(LeadStatus::New, 3), (LeadStatus::Rejected, 1)]);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.new, 3);
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.completed, 0);
    }
}
