//! Medical record calls
//!
//! Records are free-form clinical documents; the backend owns their schema
//! and this client passes them through as raw JSON. Listing is nested under
//! the patient, everything else addresses a record directly.

use reqwest::Method;
use serde_json::Value;

use crate::api::{Page, parse_page, with_query};
use crate::error::Result;
use crate::pipeline::ApiClient;

/// Paging window; the backend always receives an explicit one.
#[derive(Debug, Clone, Default)]
pub struct ListRecords {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl ListRecords {
    fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.limit.unwrap_or(10).to_string()),
            ("offset", self.offset.unwrap_or(0).to_string()),
        ]
    }
}

pub struct RecordsApi<'a> {
    pub(crate) client: &'a ApiClient,
}

impl RecordsApi<'_> {
    pub async fn list(&self, patient_id: &str, params: &ListRecords) -> Result<Page<Value>> {
        let path = with_query(&format!("/patients/{patient_id}/records"), &params.query());
        let response = self.client.request(Method::GET, &path, None, None).await?;
        parse_page(response.json()?)
    }

    pub async fn create(&self, patient_id: &str, record: Value) -> Result<Value> {
        let response = self
            .client
            .request(
                Method::POST,
                &format!("/patients/{patient_id}/records"),
                Some(record),
                None,
            )
            .await?;
        response.json()
    }

    pub async fn get(&self, id: &str) -> Result<Value> {
        let response = self
            .client
            .request(Method::GET, &format!("/records/{id}"), None, None)
            .await?;
        response.json()
    }

    pub async fn update(&self, id: &str, changes: Value) -> Result<Value> {
        let response = self
            .client
            .request(Method::PATCH, &format!("/records/{id}"), Some(changes), None)
            .await?;
        response.json()
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &format!("/records/{id}"), None, None)
            .await?;
        Ok(())
    }
}
