// src/leave.rs

use std::sync::Arc;
use tracing::{info, warn};

use crate::client::HrClient;
use crate::error::HrError;
use crate::models::{
    CreatedResponse, Decision, LeaveForm, LeaveRequest, LeaveType, LeaveTypeCreate, Submitted,
};
use crate::navigation::{ADMIN_ROLES, APPROVER_ROLES};
use crate::validation::{validate_leave_form, FieldError};

pub const TYPES_ENDPOINT: &str = "/api/leave/types";
pub const REQUESTS_ENDPOINT: &str = "/api/leave/requests";
pub const ADMIN_TYPES_ENDPOINT: &str = "/api/admin/leave-types";

pub struct LeaveService {
    client: Arc<HrClient>,
}

impl LeaveService {
    pub fn new(client: Arc<HrClient>) -> Self {
        Self { client }
    }

    // --- Reference data ---

    pub async fn types(&self) -> Result<Vec<LeaveType>, HrError> {
        self.client.require_session()?;
        self.client.get(TYPES_ENDPOINT, "leave types").await
    }

    pub async fn find_type(&self, type_id: &str) -> Result<Option<LeaveType>, HrError> {
        Ok(self
            .types()
            .await?
            .into_iter()
            .find(|t| t.id == type_id.trim()))
    }

    pub async fn create_type(&self, new_type: &LeaveTypeCreate) -> Result<Submitted<LeaveType>, HrError> {
        self.client.require_role(&ADMIN_ROLES, "create leave types")?;
        if new_type.name.trim().is_empty() {
            return Err(HrError::validation(vec![FieldError::Required {
                field: "name".to_string(),
            }]));
        }

        let created: CreatedResponse = self
            .client
            .post_json(TYPES_ENDPOINT, new_type, "create leave type")
            .await?;
        info!("Created leave type '{}'", new_type.name);

        Ok(Submitted {
            id: created.id,
            message: created.message,
            records: self.types().await?,
        })
    }

    pub async fn delete_type(&self, type_id: &str) -> Result<Vec<LeaveType>, HrError> {
        self.client.require_role(&ADMIN_ROLES, "delete leave types")?;
        let id = HrClient::path_segment(type_id)?;
        self.client
            .delete(&format!("{}/{}", ADMIN_TYPES_ENDPOINT, id), "delete leave type")
            .await?;
        info!("Deleted leave type {}", id);
        self.types().await
    }

    // --- Requests ---

    /// Every request the backend shows this session. Approvers see their team's.
    pub async fn requests(&self) -> Result<Vec<LeaveRequest>, HrError> {
        self.client.require_session()?;
        self.client.get(REQUESTS_ENDPOINT, "leave requests").await
    }

    pub async fn my_requests(&self) -> Result<Vec<LeaveRequest>, HrError> {
        let user = self.client.require_session()?;
        Ok(self
            .requests()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user.id)
            .collect())
    }

    /// Validates and submits a leave request, then returns the refreshed list of the
    /// requester's own requests.
    ///
    /// Pass the selected `leave_type` to have its half-day and work-from-home flags checked
    /// before sending. On failure nothing is sent and `form` is untouched.
    pub async fn submit(
        &self,
        form: &LeaveForm,
        leave_type: Option<&LeaveType>,
    ) -> Result<Submitted<LeaveRequest>, HrError> {
        self.client.require_session()?;
        let body = validate_leave_form(form, leave_type)?;

        let created: CreatedResponse = self
            .client
            .post_json(REQUESTS_ENDPOINT, &body, "submit leave request")
            .await?;
        info!(
            "Submitted leave request {} ({} to {})",
            created.id.as_deref().unwrap_or("<no id>"),
            body.start_date,
            body.end_date
        );

        Ok(Submitted {
            id: created.id,
            message: created.message,
            records: self.my_requests().await?,
        })
    }

    /// Like `submit`, but looks the leave type up by the form's `leave_type_id` first.
    /// The form is checked before the lookup, so an invalid form sends nothing.
    pub async fn submit_resolving_type(&self, form: &LeaveForm) -> Result<Submitted<LeaveRequest>, HrError> {
        self.client.require_session()?;
        validate_leave_form(form, None)?;
        let leave_type = self.find_type(&form.leave_type_id).await?;
        self.submit(form, leave_type.as_ref()).await
    }

    /// Approves or rejects a request. A second decision on the same request is left for
    /// the backend to refuse.
    pub async fn decide(&self, request_id: &str, decision: Decision) -> Result<Vec<LeaveRequest>, HrError> {
        self.client.require_role(&APPROVER_ROLES, "approve or reject leave")?;
        let id = HrClient::path_segment(request_id)?;
        let status = decision.status();

        self.client
            .put_status(&format!("{}/{}", REQUESTS_ENDPOINT, id), status.as_str(), "decide leave request")
            .await?;
        info!("Leave request {} marked {}", id, status);

        let requests = self.requests().await?;
        if !requests.iter().any(|r| r.id == id && r.status == status) {
            warn!("Leave request {} not shown as {} after refetch", id, status);
        }
        Ok(requests)
    }
}
