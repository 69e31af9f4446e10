// src/expense.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::client::HrClient;
use crate::clock::Clock;
use crate::error::{io_context, HrError};
use crate::models::{
    CreatedResponse, Decision, ExpenseCategory, ExpenseCategoryCreate, ExpenseForm,
    ExpenseRequest, ReceiptFile, ReceiptUploadResponse, Submitted,
};
use crate::navigation::{ADMIN_ROLES, APPROVER_ROLES};
use crate::validation::{
    receipt_content_type, validate_expense_form, validate_receipt, FieldError,
};

pub const CATEGORIES_ENDPOINT: &str = "/api/expense/categories";
pub const REQUESTS_ENDPOINT: &str = "/api/expense/requests";
pub const UPLOAD_RECEIPT_ENDPOINT: &str = "/api/expense/upload-receipt";

/// Reads a receipt from disk, taking its MIME type from the extension.
pub fn load_receipt(path: &Path) -> Result<ReceiptFile, HrError> {
    let content_type = receipt_content_type(path).ok_or_else(|| {
        HrError::validation(vec![FieldError::UnsupportedReceiptType {
            content_type: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        }])
    })?;
    let bytes = fs::read(path)
        .map_err(|e| io_context(e, format!("Failed to read receipt file: {:?}", path)))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("receipt")
        .to_string();

    Ok(ReceiptFile {
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

pub struct ExpenseService {
    client: Arc<HrClient>,
    clock: Arc<dyn Clock>,
}

impl ExpenseService {
    pub fn new(client: Arc<HrClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }

    // --- Reference data ---

    pub async fn categories(&self) -> Result<Vec<ExpenseCategory>, HrError> {
        self.client.require_session()?;
        self.client.get(CATEGORIES_ENDPOINT, "expense categories").await
    }

    pub async fn find_category(&self, category_id: &str) -> Result<Option<ExpenseCategory>, HrError> {
        Ok(self
            .categories()
            .await?
            .into_iter()
            .find(|c| c.id == category_id.trim()))
    }

    pub async fn create_category(
        &self,
        category: &ExpenseCategoryCreate,
    ) -> Result<Submitted<ExpenseCategory>, HrError> {
        self.client.require_role(&ADMIN_ROLES, "create expense categories")?;
        if category.name.trim().is_empty() {
            return Err(HrError::validation(vec![FieldError::Required {
                field: "name".to_string(),
            }]));
        }

        let created: CreatedResponse = self
            .client
            .post_json(CATEGORIES_ENDPOINT, category, "create expense category")
            .await?;
        info!("Created expense category '{}'", category.name);

        Ok(Submitted {
            id: created.id,
            message: created.message,
            records: self.categories().await?,
        })
    }

    // --- Requests ---

    pub async fn requests(&self) -> Result<Vec<ExpenseRequest>, HrError> {
        self.client.require_session()?;
        self.client.get(REQUESTS_ENDPOINT, "expense requests").await
    }

    pub async fn my_requests(&self) -> Result<Vec<ExpenseRequest>, HrError> {
        let user = self.client.require_session()?;
        Ok(self
            .requests()
            .await?
            .into_iter()
            .filter(|r| r.user_id == user.id)
            .collect())
    }

    /// Validates and submits an expense claim, uploads its receipt when one is attached,
    /// then returns the refreshed list of the requester's own claims.
    ///
    /// `category` is the selected category when known; it decides whether a receipt is
    /// mandatory. Nothing is sent if validation fails.
    pub async fn submit(
        &self,
        form: &ExpenseForm,
        category: Option<&ExpenseCategory>,
    ) -> Result<Submitted<ExpenseRequest>, HrError> {
        self.client.require_session()?;
        let body = validate_expense_form(form, category, self.clock.today())?;

        let created: CreatedResponse = self
            .client
            .post_json(REQUESTS_ENDPOINT, &body, "submit expense request")
            .await?;
        info!(
            "Submitted expense request {} for {}",
            created.id.as_deref().unwrap_or("<no id>"),
            body.amount
        );

        if let Some(receipt) = &form.receipt {
            match created.id.as_deref() {
                Some(request_id) => {
                    if let Err(e) = self.upload_receipt(request_id, receipt).await {
                        error!(
                            "Expense request {} was created but its receipt upload failed: {}",
                            request_id, e
                        );
                        return Err(HrError::ReceiptUpload {
                            request_id: request_id.to_string(),
                            source: Box::new(e),
                        });
                    }
                }
                None => warn!("Backend returned no request id; receipt not uploaded"),
            }
        }

        Ok(Submitted {
            id: created.id,
            message: created.message,
            records: self.my_requests().await?,
        })
    }

    /// Like `submit`, but looks the category up by the form's `category_id` first.
    /// The form is checked before the lookup, so an invalid form sends nothing.
    pub async fn submit_resolving_category(
        &self,
        form: &ExpenseForm,
    ) -> Result<Submitted<ExpenseRequest>, HrError> {
        self.client.require_session()?;
        validate_expense_form(form, None, self.clock.today())?;
        let category = self.find_category(&form.category_id).await?;
        self.submit(form, category.as_ref()).await
    }

    pub async fn upload_receipt(
        &self,
        request_id: &str,
        receipt: &ReceiptFile,
    ) -> Result<ReceiptUploadResponse, HrError> {
        self.client.require_session()?;
        validate_receipt(receipt)?;
        let id = HrClient::path_segment(request_id)?;

        let uploaded: ReceiptUploadResponse = self
            .client
            .upload_file(
                &format!("{}/{}", UPLOAD_RECEIPT_ENDPOINT, id),
                &receipt.file_name,
                &receipt.content_type,
                receipt.bytes.clone(),
                "upload receipt",
            )
            .await?;
        info!("Uploaded receipt '{}' for expense request {}", receipt.file_name, id);
        Ok(uploaded)
    }

    pub async fn decide(&self, request_id: &str, decision: Decision) -> Result<Vec<ExpenseRequest>, HrError> {
        self.client.require_role(&APPROVER_ROLES, "approve or reject expenses")?;
        let id = HrClient::path_segment(request_id)?;
        let status = decision.status();

        self.client
            .put_status(&format!("{}/{}", REQUESTS_ENDPOINT, id), status.as_str(), "decide expense request")
            .await?;
        info!("Expense request {} marked {}", id, status);

        self.requests().await
    }
}
