use crate::api::api_types::{
  ApiCreateEmployee, ApiCreateEmployeeJob, ApiCreateJob, ApiDeleteJob, ApiUpdateEmployee,
  ApiUpdateJob,
};
use crate::api::error::ApiError;
use crate::api::transport::{ApiRequest, HttpTransport, RawResponse, Transport};
use crate::api::types::{
  AssignmentId, Employee, EmployeeDraft, EmployeeForProject, EmployeeId, Job, JobDraft, JobId,
  NewAssignment,
};
use crate::config::ApiConfig;
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Staffing API client
#[derive(Clone)]
pub struct ApiClient {
  base_url: Url,
  api_key: String,
  transport: Arc<dyn Transport>,
}

impl ApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
    let transport = HttpTransport::new()?;
    Ok(Self::with_transport(
      config.base_url.clone(),
      config.api_key.clone(),
      Arc::new(transport),
    ))
  }

  pub fn with_transport(base_url: Url, api_key: String, transport: Arc<dyn Transport>) -> Self {
    Self {
      base_url,
      api_key,
      transport,
    }
  }

  /// Send a request to `endpoint` (relative to the base URL).
  ///
  /// Returns `Ok(None)` for a successful response with an empty body.
  pub async fn request<T, B>(
    &self,
    method: Method,
    endpoint: &str,
    body: Option<&B>,
  ) -> Result<Option<T>, ApiError>
  where
    T: DeserializeOwned,
    B: Serialize + ?Sized,
  {
    let url = self
      .base_url
      .join(endpoint)
      .map_err(|e| ApiError::Network(format!("Invalid endpoint {}: {}", endpoint, e)))?;

    let mut headers = vec![(SUBSCRIPTION_KEY_HEADER, self.api_key.clone())];
    let body = match body {
      Some(b) => {
        headers.push(("Content-Type", "application/json".to_string()));
        Some(serde_json::to_string(b).map_err(|e| ApiError::Parse(e.to_string()))?)
      }
      None => None,
    };

    debug!(%method, endpoint, "sending request");
    let response = self
      .transport
      .send(ApiRequest {
        method: method.clone(),
        url,
        headers,
        body,
      })
      .await
      .inspect_err(|e| warn!(%method, endpoint, error = %e, "request failed"))?;

    decode(response)
  }

  async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Option<T>, ApiError> {
    self.request::<T, ()>(Method::GET, endpoint, None).await
  }

  // Employees

  pub async fn get_employees(&self) -> Result<Vec<Employee>, ApiError> {
    self
      .get("GetEmployees")
      .await
      .map(Option::unwrap_or_default)
      .map_err(|e| e.for_operation("Failed to load employees"))
  }

  pub async fn create_employee(&self, draft: &EmployeeDraft) -> Result<Option<Value>, ApiError> {
    self
      .request(
        Method::POST,
        "CreateEmployee",
        Some(&ApiCreateEmployee::from(draft)),
      )
      .await
      .map_err(|e| e.for_operation("Failed to create employee"))
  }

  pub async fn update_employee(
    &self,
    id: EmployeeId,
    draft: &EmployeeDraft,
  ) -> Result<Option<Value>, ApiError> {
    self
      .request(
        Method::PUT,
        "UpdateEmployee",
        Some(&ApiUpdateEmployee::new(id, draft)),
      )
      .await
      .map_err(|e| e.for_operation("Failed to update employee"))
  }

  pub async fn delete_employee(&self, id: EmployeeId) -> Result<Option<Value>, ApiError> {
    self
      .request::<Value, ()>(Method::DELETE, &format!("DeleteEmployee/{}", id), None)
      .await
      .map_err(|e| e.for_operation("Failed to delete employee"))
  }

  // Projects

  pub async fn get_jobs(&self) -> Result<Vec<Job>, ApiError> {
    self
      .get("GetJobs")
      .await
      .map(Option::unwrap_or_default)
      .map_err(|e| e.for_operation("Failed to load projects"))
  }

  pub async fn get_job(&self, id: JobId) -> Result<Job, ApiError> {
    self
      .get(&format!("GetJob/{}", id))
      .await
      .map_err(|e| e.for_operation("Failed to load project"))?
      .ok_or_else(|| ApiError::Parse(format!("Empty response for project {}", id)))
  }

  pub async fn create_job(&self, draft: &JobDraft) -> Result<Option<Value>, ApiError> {
    self
      .request(Method::POST, "CreateJob", Some(&ApiCreateJob::from(draft)))
      .await
      .map_err(|e| e.for_operation("Failed to create job"))
  }

  pub async fn update_job(&self, id: JobId, draft: &JobDraft) -> Result<Option<Value>, ApiError> {
    self
      .request(Method::PUT, "UpdateJob", Some(&ApiUpdateJob::new(id, draft)))
      .await
      .map_err(|e| e.for_operation("Failed to update job"))
  }

  pub async fn delete_job(&self, id: JobId) -> Result<Option<Value>, ApiError> {
    self
      .request(
        Method::DELETE,
        &format!("DeleteJob/{}", id),
        Some(&ApiDeleteJob { id }),
      )
      .await
      .map_err(|e| e.for_operation("Failed to delete job"))
  }

  // Assignments

  pub async fn get_employees_for_project(
    &self,
    job_id: JobId,
  ) -> Result<Vec<EmployeeForProject>, ApiError> {
    self
      .get(&format!("GetEmployeesWithJobId/{}", job_id))
      .await
      .map(Option::unwrap_or_default)
      .map_err(|e| e.for_operation("Failed to load project employees"))
  }

  pub async fn create_assignment(
    &self,
    assignment: NewAssignment,
  ) -> Result<Option<Value>, ApiError> {
    self
      .request(
        Method::POST,
        "CreateEmployeeJob",
        Some(&ApiCreateEmployeeJob::from(assignment)),
      )
      .await
      .map_err(|e| e.for_operation("Failed to assign employee to project"))
  }

  pub async fn delete_assignment(&self, id: AssignmentId) -> Result<Option<Value>, ApiError> {
    self
      .request::<Value, ()>(Method::DELETE, &format!("DeleteEmployeeJob/{}", id), None)
      .await
      .map_err(|e| e.for_operation("Failed to remove employee from project"))
  }
}

/// Check the status and decode the body, skipping JSON parsing when the body
/// is empty.
fn decode<T: DeserializeOwned>(response: RawResponse) -> Result<Option<T>, ApiError> {
  if !response.is_success() {
    return Err(ApiError::HttpStatus {
      status: response.status,
      message: "Request failed".to_string(),
    });
  }

  if response.body.trim().is_empty() {
    return Ok(None);
  }

  serde_json::from_str(&response.body)
    .map(Some)
    .map_err(|e| ApiError::Parse(e.to_string()))
}
