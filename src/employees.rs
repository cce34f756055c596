//! Employees page.
//!
//! The editing surface assigns a single role, so the form keeps a scalar
//! role id and expands it into the backend's role list on submit. The
//! username is fixed once an employee exists and an empty password on edit
//! means "unchanged".

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use zeroize::Zeroizing;

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Employee, Id, Role};
use crate::pagination::Page;

#[async_trait]
pub trait EmployeeApi: Send + Sync {
    async fn list_employees(&self) -> DashboardResult<Vec<Employee>>;
    async fn list_roles(&self) -> DashboardResult<Vec<Role>>;
    async fn create_employee(&self, payload: &EmployeePayload<'_>) -> DashboardResult<Value>;
    async fn update_employee(&self, id: Id, payload: &EmployeePayload<'_>)
        -> DashboardResult<Value>;
    async fn delete_employee(&self, id: Id) -> DashboardResult<Value>;
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct RoleRef {
    pub id: Id,
}

/// Wire body for create and update. Borrows the password from the form so
/// no extra plain copy outlives the request.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload<'a> {
    pub username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
    pub full_name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub roles: Vec<RoleRef>,
}

#[derive(Clone, Default)]
pub struct EmployeeForm {
    pub username: String,
    pub password: Zeroizing<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub role_id: Option<Id>,
}

impl EmployeeForm {
    pub fn from_employee(e: &Employee) -> Self {
        Self {
            username: e.username.clone(),
            password: Zeroizing::new(String::new()),
            full_name: e.full_name.clone().unwrap_or_default(),
            email: e.email.clone().unwrap_or_default(),
            phone: e.phone.clone().unwrap_or_default(),
            role_id: e.roles.first().map(|r| r.id),
        }
    }

    /// Build the payload. `existing_username` is set when editing.
    pub fn payload<'a>(
        &'a self,
        existing_username: Option<&'a str>,
    ) -> DashboardResult<EmployeePayload<'a>> {
        let username = match existing_username {
            Some(name) => name,
            None => self.username.trim(),
        };
        if username.is_empty() {
            return Err(DashboardError::validation("username required"));
        }
        let password = self.password.as_str();
        let password = if password.is_empty() {
            if existing_username.is_none() {
                return Err(DashboardError::validation("password required"));
            }
            None
        } else {
            Some(password)
        };
        Ok(EmployeePayload {
            username,
            password,
            full_name: self.full_name.trim(),
            email: self.email.trim(),
            phone: self.phone.trim(),
            roles: self.role_id.map(|id| RoleRef { id }).into_iter().collect(),
        })
    }
}

pub struct EmployeesPage {
    pub employees: Vec<Employee>,
    pub roles: Vec<Role>,
    pub form: EmployeeForm,
    pub editing: Option<Id>,
    pub page: usize,
    pub page_size: usize,
    pub error: Option<String>,
}

impl EmployeesPage {
    pub fn new(page_size: usize) -> Self {
        Self {
            employees: Vec::new(),
            roles: Vec::new(),
            form: EmployeeForm::default(),
            editing: None,
            page: 1,
            page_size,
            error: None,
        }
    }

    pub async fn load<A: EmployeeApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        let loaded = async {
            let employees = api.list_employees().await?;
            let roles = api.list_roles().await?;
            Ok::<_, DashboardError>((employees, roles))
        }
        .await;
        match loaded {
            Ok((employees, roles)) => {
                self.employees = employees;
                self.roles = roles;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn edit(&mut self, id: Id) -> DashboardResult<()> {
        let employee = self
            .employees
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| DashboardError::validation("employee not found"))?;
        self.form = EmployeeForm::from_employee(employee);
        self.editing = Some(id);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.form = EmployeeForm::default();
        self.editing = None;
    }

    pub async fn save<A: EmployeeApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        let existing = self.editing.and_then(|id| {
            self.employees
                .iter()
                .find(|e| e.id == id)
                .map(|e| e.username.clone())
        });
        if self.editing.is_some() && existing.is_none() {
            return Err(DashboardError::validation("employee not found"));
        }
        let result = match self.form.payload(existing.as_deref()) {
            Ok(payload) => match self.editing {
                Some(id) => api.update_employee(id, &payload).await,
                None => api.create_employee(&payload).await,
            },
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(username = ?existing.as_deref().unwrap_or(self.form.username.trim()), "employee saved");
        self.cancel();
        self.load(api).await
    }

    pub async fn remove<A: EmployeeApi + ?Sized>(&mut self, api: &A, id: Id) -> DashboardResult<()> {
        if let Err(e) = api.delete_employee(id).await {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(employee_id = id, "employee deleted");
        self.load(api).await
    }

    pub fn current_page(&self) -> Page<Employee> {
        Page::of(&self.employees, self.page, self.page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeStaff {
        bodies: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl EmployeeApi for FakeStaff {
        async fn list_employees(&self) -> DashboardResult<Vec<Employee>> {
            Ok(vec![Employee {
                id: 9,
                username: "waiter1".into(),
                full_name: Some("Tran An".into()),
                email: None,
                phone: Some("0901234567".into()),
                roles: vec![Role {
                    id: 2,
                    name: "ROLE_WAITER".into(),
                }],
            }])
        }
        async fn list_roles(&self) -> DashboardResult<Vec<Role>> {
            Ok(vec![
                Role { id: 1, name: "ROLE_ADMIN".into() },
                Role { id: 2, name: "ROLE_WAITER".into() },
            ])
        }
        async fn create_employee(&self, p: &EmployeePayload<'_>) -> DashboardResult<Value> {
            self.bodies.lock().expect("bodies").push(serde_json::to_value(p).expect("json"));
            Ok(Value::Null)
        }
        async fn update_employee(&self, _id: Id, p: &EmployeePayload<'_>) -> DashboardResult<Value> {
            self.bodies.lock().expect("bodies").push(serde_json::to_value(p).expect("json"));
            Ok(Value::Null)
        }
        async fn delete_employee(&self, _id: Id) -> DashboardResult<Value> {
            Ok(Value::Null)
        }
    }

    #[test]
    fn create_requires_password_and_wraps_role() {
        let mut form = EmployeeForm {
            username: "chef2".into(),
            role_id: Some(3),
            ..Default::default()
        };
        assert!(form.payload(None).is_err());
        form.password = Zeroizing::new("s3cret".into());
        let json = serde_json::to_value(form.payload(None).expect("payload")).expect("json");
        assert_eq!(json["roles"], serde_json::json!([{ "id": 3 }]));
        assert_eq!(json["password"], "s3cret");
    }

    #[tokio::test]
    async fn edit_keeps_username_and_omits_blank_password() {
        let api = FakeStaff::default();
        let mut page = EmployeesPage::new(10);
        page.load(&api).await.expect("load");
        assert_eq!(page.roles.len(), 2);

        page.edit(9).expect("edit");
        assert_eq!(page.form.role_id, Some(2));
        page.form.username = "renamed".into();
        page.form.full_name = "Tran Binh".into();
        page.save(&api).await.expect("update");

        let bodies = api.bodies.lock().expect("bodies");
        assert_eq!(bodies[0]["username"], "waiter1");
        assert_eq!(bodies[0]["fullName"], "Tran Binh");
        assert!(bodies[0].get("password").is_none());
        assert!(page.editing.is_none());
    }
}
