// src/admin.rs

use std::sync::Arc;
use tracing::info;

use crate::client::HrClient;
use crate::error::HrError;
use crate::models::{CreatedResponse, Department, DepartmentCreate, Submitted, User};
use crate::navigation::ADMIN_ROLES;
use crate::validation::FieldError;

pub const DEPARTMENTS_ENDPOINT: &str = "/api/admin/departments";
pub const USERS_ENDPOINT: &str = "/api/admin/users";

pub struct AdminService {
    client: Arc<HrClient>,
}

impl AdminService {
    pub fn new(client: Arc<HrClient>) -> Self {
        Self { client }
    }

    pub async fn departments(&self) -> Result<Vec<Department>, HrError> {
        self.client.require_role(&ADMIN_ROLES, "view departments")?;
        self.client.get(DEPARTMENTS_ENDPOINT, "departments").await
    }

    pub async fn create_department(
        &self,
        department: &DepartmentCreate,
    ) -> Result<Submitted<Department>, HrError> {
        self.client.require_role(&ADMIN_ROLES, "create departments")?;
        if department.name.trim().is_empty() {
            return Err(HrError::validation(vec![FieldError::Required {
                field: "name".to_string(),
            }]));
        }

        let created: CreatedResponse = self
            .client
            .post_json(DEPARTMENTS_ENDPOINT, department, "create department")
            .await?;
        info!("Created department '{}'", department.name);

        Ok(Submitted {
            id: created.id,
            message: created.message,
            records: self.departments().await?,
        })
    }

    pub async fn users(&self) -> Result<Vec<User>, HrError> {
        self.client.require_role(&ADMIN_ROLES, "view users")?;
        self.client.get(USERS_ENDPOINT, "users").await
    }
}
