// src/reports.rs

use std::sync::Arc;
use tracing::warn;

use crate::client::HrClient;
use crate::error::HrError;
use crate::models::{ExpenseRequest, ExpenseSummary, LeaveRequest, LeaveSummary, RequestStatus};

pub const LEAVE_SUMMARY_ENDPOINT: &str = "/api/reports/leave-summary";
pub const EXPENSE_SUMMARY_ENDPOINT: &str = "/api/reports/expense-summary";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl StatusCounts {
    pub fn tally<I: IntoIterator<Item = RequestStatus>>(statuses: I) -> Self {
        statuses.into_iter().fold(Self::default(), |mut counts, status| {
            match status {
                RequestStatus::Pending => counts.pending += 1,
                RequestStatus::Approved => counts.approved += 1,
                RequestStatus::Rejected => counts.rejected += 1,
            }
            counts
        })
    }

    pub fn from_leave(requests: &[LeaveRequest]) -> Self {
        Self::tally(requests.iter().map(|r| r.status))
    }

    pub fn from_expense(requests: &[ExpenseRequest]) -> Self {
        Self::tally(requests.iter().map(|r| r.status))
    }

    pub fn total(&self) -> usize {
        self.pending + self.approved + self.rejected
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub leave: StatusCounts,
    /// `None` when the expense list could not be loaded.
    pub expense: Option<StatusCounts>,
}

pub struct ReportService {
    client: Arc<HrClient>,
}

impl ReportService {
    pub fn new(client: Arc<HrClient>) -> Self {
        Self { client }
    }

    pub async fn leave_summary(&self) -> Result<LeaveSummary, HrError> {
        self.client.require_session()?;
        self.client.get(LEAVE_SUMMARY_ENDPOINT, "leave summary").await
    }

    pub async fn expense_summary(&self) -> Result<ExpenseSummary, HrError> {
        self.client.require_session()?;
        self.client.get(EXPENSE_SUMMARY_ENDPOINT, "expense summary").await
    }

    /// Request counts by status, computed from the lists the session can see.
    ///
    /// Leave counts are required. Expense counts are dropped with a warning when that list
    /// fails to load, so a backend without expense endpoints still yields a dashboard.
    pub async fn dashboard(&self) -> Result<Dashboard, HrError> {
        self.client.require_session()?;
        let leave: Vec<LeaveRequest> = self
            .client
            .get(crate::leave::REQUESTS_ENDPOINT, "leave requests")
            .await?;
        let expense = match self
            .client
            .get::<Vec<ExpenseRequest>>(crate::expense::REQUESTS_ENDPOINT, "expense requests")
            .await
        {
            Ok(expense) => Some(StatusCounts::from_expense(&expense)),
            Err(e) => {
                warn!("Dashboard shown without expense counts: {}", e);
                None
            }
        };
        Ok(Dashboard {
            leave: StatusCounts::from_leave(&leave),
            expense,
        })
    }
}
