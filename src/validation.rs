// src/validation.rs
//
// Client-side checks run before any request goes out. The backend stays authoritative;
// these only save a round trip for obviously bad input.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::path::Path;
use thiserror::Error;

use crate::error::HrError;
use crate::models::{
    DurationKind, ExpenseCategory, ExpenseForm, ExpenseRequestCreate, LeaveForm,
    LeaveRequestCreate, LeaveType, ReceiptFile, RegisterRequest,
};

pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_RECEIPT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "application/pdf"];

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("{field} is required")]
    Required { field: String },
    #[error("'{value}' is not a valid email address")]
    InvalidEmail { value: String },
    #[error("End date ({end}) cannot be before start date ({start})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("Amount must be greater than zero (got {amount})")]
    NonPositiveAmount { amount: Decimal },
    #[error("{field} ({date}) cannot be in the future")]
    FutureDate { field: String, date: NaiveDate },
    #[error("Category '{category}' requires a receipt")]
    ReceiptRequired { category: String },
    #[error("Receipt is {size} bytes; the limit is {max} bytes")]
    ReceiptTooLarge { size: usize, max: usize },
    #[error("Receipt type '{content_type}' is not allowed (use JPEG, PNG or PDF)")]
    UnsupportedReceiptType { content_type: String },
    #[error("Leave type '{leave_type}' does not support {duration}")]
    DurationNotSupported {
        leave_type: String,
        duration: DurationKind,
    },
    #[error("Unknown {field} '{value}'")]
    UnknownReference { field: String, value: String },
}

impl FieldError {
    fn required(field: &str) -> Self {
        FieldError::Required {
            field: field.to_string(),
        }
    }
}

fn finish(errors: Vec<FieldError>) -> Result<(), HrError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HrError::validation(errors))
    }
}

fn require_text(errors: &mut Vec<FieldError>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::required(field));
    }
}

fn check_email(errors: &mut Vec<FieldError>, email: &str) {
    if email.trim().is_empty() {
        errors.push(FieldError::required("email"));
    } else if !EMAIL_RE.is_match(email.trim()) {
        errors.push(FieldError::InvalidEmail {
            value: email.to_string(),
        });
    }
}

// --- Auth ---

pub fn validate_login(email: &str, password: &str) -> Result<(), HrError> {
    let mut errors = Vec::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.push(FieldError::required("password"));
    }
    finish(errors)
}

pub fn validate_registration(request: &RegisterRequest) -> Result<(), HrError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "full_name", &request.full_name);
    require_text(&mut errors, "employee_id", &request.employee_id);
    check_email(&mut errors, &request.email);
    if request.password.is_empty() {
        errors.push(FieldError::required("password"));
    }
    require_text(&mut errors, "department_id", &request.department_id);
    finish(errors)
}

// --- Leave ---

/// Checks a leave form and turns it into the request body.
///
/// `leave_type` is the selected type when the caller has the reference list at hand; it
/// enables the half-day / work-from-home support check.
pub fn validate_leave_form(
    form: &LeaveForm,
    leave_type: Option<&LeaveType>,
) -> Result<LeaveRequestCreate, HrError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "leave_type_id", &form.leave_type_id);
    if form.start_date.is_none() {
        errors.push(FieldError::required("start_date"));
    }
    if form.end_date.is_none() {
        errors.push(FieldError::required("end_date"));
    }
    if form.duration_type.is_none() {
        errors.push(FieldError::required("duration_type"));
    }
    require_text(&mut errors, "reason", &form.reason);

    if let (Some(start), Some(end)) = (form.start_date, form.end_date) {
        if end < start {
            errors.push(FieldError::EndBeforeStart { start, end });
        }
    }

    if let (Some(leave_type), Some(duration)) = (leave_type, form.duration_type) {
        if !leave_type.supports(duration) {
            errors.push(FieldError::DurationNotSupported {
                leave_type: leave_type.name.clone(),
                duration,
            });
        }
    }

    match (form.start_date, form.end_date, form.duration_type) {
        (Some(start_date), Some(end_date), Some(duration_type)) if errors.is_empty() => {
            Ok(LeaveRequestCreate {
                leave_type_id: form.leave_type_id.trim().to_string(),
                start_date,
                end_date,
                duration_type,
                reason: form.reason.trim().to_string(),
                manager_id: form.manager_id.clone(),
            })
        }
        _ => Err(HrError::validation(errors)),
    }
}

// --- Expense ---

pub fn validate_expense_form(
    form: &ExpenseForm,
    category: Option<&ExpenseCategory>,
    today: NaiveDate,
) -> Result<ExpenseRequestCreate, HrError> {
    let mut errors = Vec::new();
    require_text(&mut errors, "category_id", &form.category_id);

    match form.amount {
        None => errors.push(FieldError::required("amount")),
        Some(amount) if amount <= Decimal::ZERO => {
            errors.push(FieldError::NonPositiveAmount { amount })
        }
        Some(_) => {}
    }

    match form.expense_date {
        None => errors.push(FieldError::required("expense_date")),
        Some(date) if date > today => errors.push(FieldError::FutureDate {
            field: "expense_date".to_string(),
            date,
        }),
        Some(_) => {}
    }

    require_text(&mut errors, "description", &form.description);

    match &form.receipt {
        Some(receipt) => errors.extend(receipt_errors(receipt)),
        None => {
            if let Some(category) = category.filter(|c| c.requires_receipt) {
                errors.push(FieldError::ReceiptRequired {
                    category: category.name.clone(),
                });
            }
        }
    }

    match (form.amount, form.expense_date) {
        (Some(amount), Some(expense_date)) if errors.is_empty() => Ok(ExpenseRequestCreate {
            category_id: form.category_id.trim().to_string(),
            amount,
            expense_date,
            description: form.description.trim().to_string(),
            manager_id: form.manager_id.clone(),
        }),
        _ => Err(HrError::validation(errors)),
    }
}

fn receipt_errors(receipt: &ReceiptFile) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if receipt.bytes.len() > MAX_RECEIPT_BYTES {
        errors.push(FieldError::ReceiptTooLarge {
            size: receipt.bytes.len(),
            max: MAX_RECEIPT_BYTES,
        });
    }
    if !ALLOWED_RECEIPT_TYPES.contains(&receipt.content_type.as_str()) {
        errors.push(FieldError::UnsupportedReceiptType {
            content_type: receipt.content_type.clone(),
        });
    }
    errors
}

pub fn validate_receipt(receipt: &ReceiptFile) -> Result<(), HrError> {
    finish(receipt_errors(receipt))
}

/// Guesses a receipt's MIME type from its extension.
pub fn receipt_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
