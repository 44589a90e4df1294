//! crates/edudash_core/src/validation.rs
//!
//! Pre-submission form validation. Domain errors are caught here, rendered
//! inline per field, and block the request before it reaches the network.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::domain::NewAssignment;

pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;
pub const MAX_POINTS: i64 = 1000;

/// Field name to message. Empty means the form may be submitted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<&'static str, String>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }
}

/// Validates a new-assignment form before it is posted.
pub fn validate_new_assignment(form: &NewAssignment, now: DateTime<Utc>) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    if form.title.trim().is_empty() {
        errors.push("title", "Title is required");
    }
    if form.description.trim().is_empty() {
        errors.push("description", "Description is required");
    }

    if form.due_date.trim().is_empty() {
        errors.push("due_date", "Due date is required");
    } else {
        match form.due_date.parse::<DateTime<Utc>>() {
            Ok(due) if due <= now => {
                errors.push("due_date", "Due date must be in the future");
            }
            Ok(_) => {}
            Err(_) => errors.push("due_date", "Due date must be a valid date"),
        }
    }

    if form.points < 0 || form.points > MAX_POINTS {
        errors.push("points", "Points must be between 0 and 1000");
    }

    errors
}

/// Validates a material upload: PDFs only, at most 50MB, titled.
pub fn validate_material_upload(
    file_name: &str,
    file_size: u64,
    title: &str,
) -> ValidationErrors {
    let mut errors = ValidationErrors::default();

    let is_pdf = file_name
        .rsplit('.')
        .next()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        && file_name.contains('.');
    if !is_pdf {
        errors.push("file", "Only PDF files are allowed");
    }
    if file_size > MAX_UPLOAD_BYTES {
        errors.push("file", "File size must be less than 50MB");
    }
    if title.trim().is_empty() {
        errors.push("title", "Title is required");
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap()
    }

    fn valid_form() -> NewAssignment {
        NewAssignment {
            title: "Problem Set 5".to_string(),
            description: "Integration practice".to_string(),
            due_date: "2024-03-22T23:59:00Z".to_string(),
            course_name: Some("Mathematics".to_string()),
            points: 100,
            instructions: None,
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        assert!(validate_new_assignment(&valid_form(), now()).is_empty());
    }

    #[test]
    fn requires_title_and_description() {
        let mut form = valid_form();
        form.title = "   ".to_string();
        form.description = String::new();
        let errors = validate_new_assignment(&form, now());
        assert_eq!(errors.get("title"), Some("Title is required"));
        assert_eq!(errors.get("description"), Some("Description is required"));
    }

    #[test]
    fn rejects_past_and_malformed_due_dates() {
        let mut form = valid_form();
        form.due_date = "2024-03-01T00:00:00Z".to_string();
        assert_eq!(
            validate_new_assignment(&form, now()).get("due_date"),
            Some("Due date must be in the future")
        );

        form.due_date = "next tuesday".to_string();
        assert_eq!(
            validate_new_assignment(&form, now()).get("due_date"),
            Some("Due date must be a valid date")
        );
    }

    #[test]
    fn points_must_be_in_range() {
        let mut form = valid_form();
        form.points = 1001;
        assert!(!validate_new_assignment(&form, now()).is_empty());
        form.points = -1;
        assert!(!validate_new_assignment(&form, now()).is_empty());
        form.points = 0;
        assert!(validate_new_assignment(&form, now()).is_empty());
        form.points = 1000;
        assert!(validate_new_assignment(&form, now()).is_empty());
    }

    #[test]
    fn uploads_must_be_reasonably_sized_pdfs() {
        assert!(validate_material_upload("notes.pdf", 1024, "Notes").is_empty());
        assert!(validate_material_upload("notes.PDF", 1024, "Notes").is_empty());
        assert_eq!(
            validate_material_upload("notes.docx", 1024, "Notes").get("file"),
            Some("Only PDF files are allowed")
        );
        assert_eq!(
            validate_material_upload("pdf", 1024, "Notes").get("file"),
            Some("Only PDF files are allowed")
        );
        assert_eq!(
            validate_material_upload("huge.pdf", MAX_UPLOAD_BYTES + 1, "Huge").get("file"),
            Some("File size must be less than 50MB")
        );
        assert_eq!(
            validate_material_upload("notes.pdf", 10, " ").get("title"),
            Some("Title is required")
        );
    }
}
