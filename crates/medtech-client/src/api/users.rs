//! Staff user administration calls
//!
//! Unlike the patient list, the users endpoint takes UI paging parameters
//! verbatim; there is no offset translation.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use medtech_auth::Role;

use crate::api::{Page, parse_page, with_query};
use crate::error::{ApiError, Result};
use crate::pipeline::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_param(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temporary_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSort {
    Newest,
    Oldest,
}

impl UserSort {
    fn as_param(&self) -> &'static str {
        match self {
            UserSort::Newest => "newest",
            UserSort::Oldest => "oldest",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListUsers {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub role: Option<Role>,
    pub status: Option<UserStatus>,
    pub sort: Option<UserSort>,
}

impl ListUsers {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        if let Some(role) = self.role {
            pairs.push(("role", role.label().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_param().to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_param().to_string()));
        }
        pairs
    }
}

pub struct UsersApi<'a> {
    pub(crate) client: &'a ApiClient,
}

impl UsersApi<'_> {
    pub async fn list(&self, params: &ListUsers) -> Result<Page<User>> {
        let path = with_query("/users", &params.query());
        let response = self.client.request(Method::GET, &path, None, None).await?;
        parse_page(response.json()?)
    }

    pub async fn get(&self, id: &str) -> Result<User> {
        let response = self
            .client
            .request(Method::GET, &format!("/users/{id}"), None, None)
            .await?;
        response.json()
    }

    pub async fn create(&self, user: &CreateUser) -> Result<User> {
        let body = serde_json::to_value(user).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .client
            .request(Method::POST, "/users", Some(body), None)
            .await?;
        response.json()
    }

    pub async fn set_role(&self, id: &str, role: Role) -> Result<User> {
        let body = serde_json::json!({ "role": role });
        let response = self
            .client
            .request(Method::PATCH, &format!("/users/{id}/role"), Some(body), None)
            .await?;
        response.json()
    }

    pub async fn set_status(&self, id: &str, status: UserStatus) -> Result<User> {
        let body = serde_json::json!({ "status": status });
        let response = self
            .client
            .request(
                Method::PATCH,
                &format!("/users/{id}/status"),
                Some(body),
                None,
            )
            .await?;
        response.json()
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &format!("/users/{id}"), None, None)
            .await?;
        Ok(())
    }
}
