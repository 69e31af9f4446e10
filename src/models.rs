// src/models.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// --- Enumerations ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Manager,
    Hr,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Manager => "manager",
            Role::Hr => "hr",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "manager" => Ok(Role::Manager),
            "hr" => Ok(Role::Hr),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// The two outcomes an approver can choose. `Pending` is never sent by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn status(&self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationKind {
    FullDay,
    HalfDay,
    WorkFromHome,
}

impl DurationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurationKind::FullDay => "full_day",
            DurationKind::HalfDay => "half_day",
            DurationKind::WorkFromHome => "work_from_home",
        }
    }
}

impl fmt::Display for DurationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceAction {
    CheckIn,
    CheckOut,
}

impl AttendanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceAction::CheckIn => "check_in",
            AttendanceAction::CheckOut => "check_out",
        }
    }
}

// --- Timestamps ---

/// Backend timestamps come either as RFC 3339 or as naive ISO strings in UTC
/// (`2024-05-02T09:00:00.123456`). Both are read as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{}'", raw)))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_some(&dt.to_rfc3339()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) if !raw.is_empty() => super::parse(&raw).map(Some).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid timestamp '{}'", raw))
                }),
                _ => Ok(None),
            }
        }
    }
}

fn default_true() -> bool {
    true
}

// --- Users & Auth ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "user_id")]
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub employee_id: String,
    pub role: Role,
    #[serde(default, alias = "department")]
    pub department_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    pub user: User,
}

pub const DEFAULT_DEPARTMENT_ID: &str = "dept_001";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub employee_id: String,
    pub email: String,
    pub password: String,
    pub department_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Default for RegisterRequest {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            employee_id: String::new(),
            email: String::new(),
            password: String::new(),
            department_id: DEFAULT_DEPARTMENT_ID.to_string(),
            role: Role::Employee,
            phone: None,
        }
    }
}

/// Body of the `{"message": ..., "<something>_id": ...}` replies returned by create endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(
        default,
        alias = "user_id",
        alias = "request_id",
        alias = "type_id",
        alias = "category_id",
        alias = "dept_id"
    )]
    pub id: Option<String>,
}

/// Result of a create-then-refetch round trip: what the backend said about the new record
/// plus the refreshed list it now appears in.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted<T> {
    pub id: Option<String>,
    pub message: Option<String>,
    pub records: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// --- Leave ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveType {
    #[serde(alias = "type_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub max_days_per_year: u32,
    #[serde(default)]
    pub carry_forward_days: u32,
    #[serde(default = "default_true")]
    pub is_paid: bool,
    #[serde(default = "default_true")]
    pub requires_approval: bool,
    #[serde(default)]
    pub supports_half_day: bool,
    #[serde(default)]
    pub supports_wfh: bool,
}

impl LeaveType {
    pub fn supports(&self, kind: DurationKind) -> bool {
        match kind {
            DurationKind::FullDay => true,
            DurationKind::HalfDay => self.supports_half_day,
            DurationKind::WorkFromHome => self.supports_wfh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveTypeCreate {
    pub name: String,
    pub description: String,
    pub max_days_per_year: u32,
    pub carry_forward_days: u32,
    pub is_paid: bool,
    pub requires_approval: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(alias = "request_id")]
    pub id: String,
    pub user_id: String,
    pub leave_type_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_type: DurationKind,
    #[serde(default)]
    pub reason: String,
    pub status: RequestStatus,
    #[serde(default, with = "timestamp::option")]
    pub applied_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub approved_by: Option<String>,
}

impl LeaveRequest {
    /// Calendar days covered, both ends inclusive.
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

/// Form state for a new leave request. Dates stay optional until validated so that an
/// incomplete form can be kept around and resubmitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveForm {
    pub leave_type_id: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_type: Option<DurationKind>,
    pub reason: String,
    pub manager_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaveRequestCreate {
    pub leave_type_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_type: DurationKind,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
}

// --- Expense ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    #[serde(alias = "category_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub max_amount_per_month: Option<Decimal>,
    #[serde(default)]
    pub requires_receipt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseCategoryCreate {
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_amount_per_month: Option<Decimal>,
    pub requires_receipt: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRequest {
    #[serde(alias = "request_id", alias = "expense_id")]
    pub id: String,
    pub user_id: String,
    pub category_id: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    pub status: RequestStatus,
    #[serde(default, alias = "receipt_path")]
    pub receipt_url: Option<String>,
    #[serde(default, alias = "created_at", with = "timestamp::option")]
    pub submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ReceiptUploadResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "file_url", alias = "receipt_path", alias = "url")]
    pub receipt_url: Option<String>,
}

/// A receipt file staged for upload alongside an expense claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseForm {
    pub category_id: String,
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    pub description: String,
    pub manager_id: Option<String>,
    pub receipt: Option<ReceiptFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseRequestCreate {
    pub category_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager_id: Option<String>,
}

// --- Attendance ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceLog {
    #[serde(default, alias = "log_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub action: AttendanceAction,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    /// Day as reported by the backend. Grouping ignores it and uses `timestamp`.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStatus {
    #[serde(default)]
    pub checked_in: bool,
    #[serde(default)]
    pub checked_out: bool,
    #[serde(default, with = "timestamp::option")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub check_out_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttendanceLogCreate {
    pub action: AttendanceAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

// --- Departments ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    #[serde(alias = "dept_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub manager_id: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentCreate {
    pub name: String,
    pub description: String,
}

// --- Reports ---

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LeaveSummary {
    #[serde(default)]
    pub total_requests: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub approved: u32,
    #[serde(default)]
    pub rejected: u32,
    #[serde(default)]
    pub by_type: BTreeMap<String, u32>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExpenseSummary {
    #[serde(default)]
    pub total_requests: u32,
    #[serde(default)]
    pub total_amount: Decimal,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub approved: u32,
    #[serde(default)]
    pub rejected: u32,
    #[serde(default)]
    pub by_category: BTreeMap<String, Decimal>,
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}
