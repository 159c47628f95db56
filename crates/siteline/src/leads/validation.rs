use std::collections::BTreeMap;

use super::domain::{ContactFormData, FormField};

const MIN_NAME_CHARS: usize = 2;
// Counts characters, not digits: "(555) 123-" is long enough.
const MIN_PHONE_CHARS: usize = 10;

/// Fields that currently fail their rule, with the message shown next to each.
pub fn field_messages(form: &ContactFormData) -> BTreeMap<FormField, &'static str> {
    let mut failures = BTreeMap::new();

    if form.name.trim().chars().count() < MIN_NAME_CHARS {
        failures.insert(FormField::Name, "Please enter your name");
    }
    if form.phone.trim().chars().count() < MIN_PHONE_CHARS {
        failures.insert(FormField::Phone, "Please enter a phone number we can reach you at");
    }
    if !form.email.contains('@') {
        failures.insert(FormField::Email, "Please enter a valid email address");
    }
    if form.service.is_empty() {
        failures.insert(FormField::Service, "Please choose the service you need");
    }

    failures
}

pub fn is_valid(form: &ContactFormData) -> bool {
    field_messages(form).is_empty()
}
