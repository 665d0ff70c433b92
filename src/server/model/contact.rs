use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern must compile"));

/// Room count arrives either as a number or as the raw form string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomCount {
    Number(u64),
    Text(String),
}

impl RoomCount {
    fn as_text(&self) -> String {
        match self {
            RoomCount::Number(n) => n.to_string(),
            RoomCount::Text(s) => s.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRequest {
    pub name: Option<String>,
    pub hotel_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub room_count: Option<RoomCount>,
    pub message: Option<String>,
}

/// A contact submission with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub hotel_name: String,
    pub email: String,
    pub phone: String,
    pub room_count: String,
    pub message: Option<String>,
}

fn required(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ContactRequest {
    pub fn validate(&self) -> Result<ContactForm, &'static str> {
        let (Some(name), Some(hotel_name), Some(email), Some(phone), Some(room_count)) = (
            required(&self.name),
            required(&self.hotel_name),
            required(&self.email),
            required(&self.phone),
            self.room_count
                .as_ref()
                .map(RoomCount::as_text)
                .filter(|v| !v.is_empty()),
        ) else {
            return Err("All required fields must be provided");
        };
        if !EMAIL_PATTERN.is_match(&email) {
            return Err("Invalid email address");
        }
        Ok(ContactForm {
            name,
            hotel_name,
            email,
            phone,
            room_count,
            message: required(&self.message),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ContactRequest {
        ContactRequest {
            name: Some("Jane Doe".to_string()),
            hotel_name: Some("Seaside Inn".to_string()),
            email: Some("jane@seaside.example".to_string()),
            phone: Some("+1 555 0100".to_string()),
            room_count: Some(RoomCount::Number(42)),
            message: None,
        }
    }

    #[test]
    fn complete_form_validates() {
        let form = complete().validate().unwrap();
        assert_eq!(form.room_count, "42");
        assert_eq!(form.message, None);
    }

    #[test]
    fn missing_or_blank_fields_are_rejected() {
        let mut req = complete();
        req.room_count = None;
        assert!(req.validate().is_err());

        let mut req = complete();
        req.room_count = Some(RoomCount::Text("  ".to_string()));
        assert!(req.validate().is_err());

        let mut req = complete();
        req.hotel_name = Some(String::new());
        assert!(req.validate().is_err());
    }

    #[test]
    fn email_pattern_compiles() {
        assert!(LazyLock::force(&EMAIL_PATTERN).is_match("front.desk@seaside.example"));
    }

    #[test]
    fn email_shape_is_checked() {
        for bad in ["jane", "jane@", "jane@host", "ja ne@host.com"] {
            let mut req = complete();
            req.email = Some(bad.to_string());
            assert_eq!(req.validate(), Err("Invalid email address"), "{bad}");
        }
    }
}
