//! Patient resource calls

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{Page, parse_page, with_query};
use crate::error::{ApiError, Result};
use crate::pipeline::ApiClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePatient {
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// List filters. `page`/`limit` are 1-based UI paging; the backend speaks
/// `offset`/`limit`, and free-text search travels as `q`.
#[derive(Debug, Clone, Default)]
pub struct ListPatients {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub gender: Option<String>,
    pub sort: Option<String>,
}

impl ListPatients {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let (Some(page), Some(limit)) = (self.page, self.limit) {
            pairs.push(("offset", (page.saturating_sub(1) * limit).to_string()));
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("q", search.clone()));
        }
        if let Some(gender) = &self.gender {
            pairs.push(("gender", gender.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        pairs
    }
}

pub struct PatientsApi<'a> {
    pub(crate) client: &'a ApiClient,
}

impl PatientsApi<'_> {
    pub async fn list(&self, params: &ListPatients) -> Result<Page<Patient>> {
        let path = with_query("/patients", &params.query());
        let response = self.client.request(Method::GET, &path, None, None).await?;
        parse_page(response.json()?)
    }

    pub async fn get(&self, id: &str) -> Result<Patient> {
        let response = self
            .client
            .request(Method::GET, &format!("/patients/{id}"), None, None)
            .await?;
        response.json()
    }

    pub async fn create(&self, patient: &CreatePatient) -> Result<Patient> {
        let body = serde_json::to_value(patient).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .client
            .request(Method::POST, "/patients", Some(body), None)
            .await?;
        response.json()
    }

    pub async fn update(&self, id: &str, changes: &UpdatePatient) -> Result<Patient> {
        let body = serde_json::to_value(changes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .client
            .request(Method::PATCH, &format!("/patients/{id}"), Some(body), None)
            .await?;
        response.json()
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &format!("/patients/{id}"), None, None)
            .await?;
        Ok(())
    }
}
