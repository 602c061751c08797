//! Appointment scheduling calls
//!
//! The appointments endpoint always takes `offset`/`limit` (defaulting to
//! the first ten) and spells its date range `from`/`to`. The UI historically
//! used `newest`/`oldest` sort names; the backend only understands
//! `startAsc`/`startDesc`, so both spellings normalize.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::api::{Page, parse_page, with_query};
use crate::error::{ApiError, Result};
use crate::pipeline::ApiClient;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointment {
    pub patient_id: String,
    pub doctor_id: String,
    pub start_at: String,
    pub end_at: String,
    /// Defaults to `scheduled` when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentSort {
    StartAsc,
    StartDesc,
    /// UI alias for `StartDesc`.
    Newest,
    /// UI alias for `StartAsc`.
    Oldest,
}

impl AppointmentSort {
    fn as_param(&self) -> &'static str {
        match self {
            AppointmentSort::StartAsc | AppointmentSort::Oldest => "startAsc",
            AppointmentSort::StartDesc | AppointmentSort::Newest => "startDesc",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListAppointments {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sort: Option<AppointmentSort>,
}

impl ListAppointments {
    fn query(&self) -> Vec<(&'static str, String)> {
        // The backend always gets an explicit window.
        let (offset, limit) = match (self.page, self.limit) {
            (Some(page), Some(limit)) => (page.saturating_sub(1) * limit, limit),
            _ => (0, 10),
        };
        let mut pairs = vec![("offset", offset.to_string()), ("limit", limit.to_string())];
        if let Some(patient_id) = &self.patient_id {
            pairs.push(("patientId", patient_id.clone()));
        }
        if let Some(doctor_id) = &self.doctor_id {
            pairs.push(("doctorId", doctor_id.clone()));
        }
        if let Some(status) = &self.status {
            pairs.push(("status", status.clone()));
        }
        if let Some(start_date) = &self.start_date {
            pairs.push(("from", start_date.clone()));
        }
        if let Some(end_date) = &self.end_date {
            pairs.push(("to", end_date.clone()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_param().to_string()));
        }
        pairs
    }
}

pub struct AppointmentsApi<'a> {
    pub(crate) client: &'a ApiClient,
}

impl AppointmentsApi<'_> {
    pub async fn list(&self, params: &ListAppointments) -> Result<Page<Appointment>> {
        let path = with_query("/appointments", &params.query());
        let response = self.client.request(Method::GET, &path, None, None).await?;
        parse_page(response.json()?)
    }

    pub async fn get(&self, id: &str) -> Result<Appointment> {
        let response = self
            .client
            .request(Method::GET, &format!("/appointments/{id}"), None, None)
            .await?;
        response.json()
    }

    pub async fn create(&self, appointment: &CreateAppointment) -> Result<Appointment> {
        let mut body =
            serde_json::to_value(appointment).map_err(|e| ApiError::Decode(e.to_string()))?;
        if body.get("status").is_none() {
            body["status"] = serde_json::Value::String("scheduled".into());
        }
        let response = self
            .client
            .request(Method::POST, "/appointments", Some(body), None)
            .await?;
        response.json()
    }

    pub async fn update(&self, id: &str, changes: &UpdateAppointment) -> Result<Appointment> {
        let body = serde_json::to_value(changes).map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self
            .client
            .request(
                Method::PATCH,
                &format!("/appointments/{id}"),
                Some(body),
                None,
            )
            .await?;
        response.json()
    }

    pub async fn set_status(&self, id: &str, status: &str) -> Result<Appointment> {
        let body = serde_json::json!({ "status": status });
        let response = self
            .client
            .request(
                Method::PATCH,
                &format!("/appointments/{id}/status"),
                Some(body),
                None,
            )
            .await?;
        response.json()
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.client
            .request(Method::DELETE, &format!("/appointments/{id}"), None, None)
            .await?;
        Ok(())
    }
}
