use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Contact form contents as entered by a prospective customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormData {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub service: String,
    pub urgency: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactFormData {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Phone => &self.phone,
            FormField::Email => &self.email,
            FormField::Service => &self.service,
            FormField::Urgency => &self.urgency,
            FormField::Message => &self.message,
            FormField::Address => self.address.as_deref().unwrap_or(""),
        }
    }

    /// Store `value` in `field`. An empty address is recorded as absent.
    pub fn set(&mut self, field: FormField, value: String) {
        match field {
            FormField::Name => self.name = value,
            FormField::Phone => self.phone = value,
            FormField::Email => self.email = value,
            FormField::Service => self.service = value,
            FormField::Urgency => self.urgency = value,
            FormField::Message => self.message = value,
            FormField::Address => {
                self.address = if value.is_empty() { None } else { Some(value) }
            }
        }
    }
}

/// Identifies a single input on the contact form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Phone,
    Email,
    Service,
    Urgency,
    Message,
    Address,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Name,
        FormField::Phone,
        FormField::Email,
        FormField::Service,
        FormField::Urgency,
        FormField::Message,
        FormField::Address,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Phone => "phone",
            FormField::Email => "email",
            FormField::Service => "service",
            FormField::Urgency => "urgency",
            FormField::Message => "message",
            FormField::Address => "address",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for FormField {
    type Err = UnknownField;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        FormField::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownField(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown form field '{0}'")]
pub struct UnknownField(pub String);
