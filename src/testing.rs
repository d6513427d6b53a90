//! In-memory staffing backend and polling helpers for tests.

use crate::api::transport::{ApiRequest, RawResponse, Transport};
use crate::api::types::{
  AssignmentId, Employee, EmployeeForProject, EmployeeId, EmployeeJob, Job, JobId,
};
use crate::api::{ApiClient, ApiError};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const BASE_URL: &str = "http://fake.test/api/";

#[derive(Default)]
struct FakeState {
  jobs: Vec<Job>,
  employees: Vec<Employee>,
  assignments: Vec<EmployeeJob>,
  next_id: u64,
  failures: Vec<(String, u16)>,
  requests: Vec<ApiRequest>,
}

impl FakeState {
  fn next_id(&mut self) -> u64 {
    self.next_id += 1;
    self.next_id
  }
}

/// Fake server implementing the staffing endpoints over in-memory tables
#[derive(Clone, Default)]
pub struct FakeBackend {
  state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn client(&self) -> ApiClient {
    self.client_with_key("test-key")
  }

  pub fn client_with_key(&self, key: &str) -> ApiClient {
    ApiClient::with_transport(
      Url::parse(BASE_URL).unwrap(),
      key.to_string(),
      Arc::new(self.clone()),
    )
  }

  /// Make every endpoint starting with `prefix` answer with `status`
  pub fn fail(&self, prefix: &str, status: u16) {
    self
      .state
      .lock()
      .unwrap()
      .failures
      .push((prefix.to_string(), status));
  }

  pub fn requests(&self) -> Vec<ApiRequest> {
    self.state.lock().unwrap().requests.clone()
  }

  /// Number of requests sent to endpoints starting with `prefix`
  pub fn count(&self, prefix: &str) -> usize {
    self
      .state
      .lock()
      .unwrap()
      .requests
      .iter()
      .filter(|r| endpoint_of(&r.url).starts_with(prefix))
      .count()
  }

  pub fn seed_job_with_id(&self, id: u64, name: &str, budget: f64) -> JobId {
    let mut state = self.state.lock().unwrap();
    state.next_id = state.next_id.max(id);
    state.jobs.push(Job {
      id: JobId(id),
      name: name.to_string(),
      budget,
      comment: None,
    });
    JobId(id)
  }

  pub fn seed_job(&self, name: &str, budget: f64) -> JobId {
    let id = self.state.lock().unwrap().next_id();
    self.seed_job_with_id(id, name, budget)
  }

  pub fn seed_employee_with_id(
    &self,
    id: u64,
    name: &str,
    salary: f64,
    skill: &str,
  ) -> EmployeeId {
    let mut state = self.state.lock().unwrap();
    state.next_id = state.next_id.max(id);
    state.employees.push(Employee {
      id: EmployeeId(id),
      name: name.to_string(),
      salary,
      skill: skill.to_string(),
      comment: None,
    });
    EmployeeId(id)
  }

  pub fn seed_employee(&self, name: &str, salary: f64, skill: &str) -> EmployeeId {
    let id = self.state.lock().unwrap().next_id();
    self.seed_employee_with_id(id, name, salary, skill)
  }

  pub fn seed_assignment(&self, employee_id: EmployeeId, job_id: JobId) -> AssignmentId {
    let mut state = self.state.lock().unwrap();
    let id = AssignmentId(state.next_id());
    state.assignments.push(EmployeeJob {
      id,
      job_id,
      employee_id,
    });
    id
  }

  fn handle(&self, request: &ApiRequest) -> RawResponse {
    let mut state = self.state.lock().unwrap();
    state.requests.push(request.clone());

    let endpoint = endpoint_of(&request.url);
    if let Some((_, code)) = state
      .failures
      .iter()
      .find(|(prefix, _)| endpoint.starts_with(prefix.as_str()))
    {
      return RawResponse {
        status: *code,
        body: r#"{"error": "internal detail"}"#.to_string(),
      };
    }

    let (name, arg) = match endpoint.split_once('/') {
      Some((name, arg)) => (name.to_string(), arg.parse::<u64>().ok()),
      None => (endpoint.clone(), None),
    };
    let body: Value = request
      .body
      .as_deref()
      .and_then(|b| serde_json::from_str(b).ok())
      .unwrap_or(Value::Null);

    match (request.method.as_str(), name.as_str(), arg) {
      ("GET", "GetEmployees", None) => json(&state.employees),
      ("POST", "CreateEmployee", None) => {
        let id = EmployeeId(state.next_id());
        state.employees.push(Employee {
          id,
          name: text(&body["Name"]),
          salary: body["Salary"].as_f64().unwrap_or_default(),
          skill: text(&body["Skill"]),
          comment: body["Comment"].as_str().map(String::from),
        });
        empty()
      }
      ("PUT", "UpdateEmployee", None) => {
        let id = EmployeeId(body["Id"].as_u64().unwrap_or_default());
        match state.employees.iter_mut().find(|e| e.id == id) {
          Some(employee) => {
            employee.name = text(&body["Name"]);
            employee.salary = body["Salary"].as_f64().unwrap_or_default();
            employee.skill = text(&body["Skill"]);
            employee.comment = body["Comment"].as_str().map(String::from);
            empty()
          }
          None => status(404),
        }
      }
      ("DELETE", "DeleteEmployee", Some(id)) => {
        let id = EmployeeId(id);
        state.employees.retain(|e| e.id != id);
        state.assignments.retain(|a| a.employee_id != id);
        empty()
      }
      ("GET", "GetJobs", None) => json(&state.jobs),
      ("GET", "GetJob", Some(id)) => match state.jobs.iter().find(|j| j.id == JobId(id)) {
        Some(job) => json(job),
        None => status(404),
      },
      ("POST", "CreateJob", None) => {
        let job = Job {
          id: JobId(state.next_id()),
          name: text(&body["name"]),
          budget: body["budget"].as_f64().unwrap_or_default(),
          comment: body["comment"].as_str().map(String::from),
        };
        state.jobs.push(job.clone());
        json(&job)
      }
      ("PUT", "UpdateJob", None) => {
        let id = JobId(body["Id"].as_u64().unwrap_or_default());
        match state.jobs.iter_mut().find(|j| j.id == id) {
          Some(job) => {
            job.name = text(&body["Name"]);
            job.budget = body["Budget"].as_f64().unwrap_or_default();
            job.comment = body["Comment"].as_str().map(String::from);
            empty()
          }
          None => status(404),
        }
      }
      ("DELETE", "DeleteJob", Some(id)) => {
        let id = JobId(id);
        state.jobs.retain(|j| j.id != id);
        state.assignments.retain(|a| a.job_id != id);
        empty()
      }
      ("GET", "GetEmployeesWithJobId", Some(id)) => {
        let rows: Vec<EmployeeForProject> = state
          .assignments
          .iter()
          .filter(|a| a.job_id == JobId(id))
          .filter_map(|a| {
            state
              .employees
              .iter()
              .find(|e| e.id == a.employee_id)
              .map(|e| EmployeeForProject {
                employee_job_id: a.id,
                employee_id: e.id,
                name: e.name.clone(),
                salary: e.salary,
                skill: e.skill.clone(),
                comment: e.comment.clone(),
              })
          })
          .collect();
        json(&rows)
      }
      ("POST", "CreateEmployeeJob", None) => {
        let employee_id = EmployeeId(body["EmployeeId"].as_u64().unwrap_or_default());
        let job_id = JobId(body["JobId"].as_u64().unwrap_or_default());
        if state
          .assignments
          .iter()
          .any(|a| a.employee_id == employee_id && a.job_id == job_id)
        {
          return status(409);
        }
        let id = AssignmentId(state.next_id());
        state.assignments.push(EmployeeJob {
          id,
          job_id,
          employee_id,
        });
        empty()
      }
      ("DELETE", "DeleteEmployeeJob", Some(id)) => {
        state.assignments.retain(|a| a.id != AssignmentId(id));
        empty()
      }
      _ => status(404),
    }
  }
}

impl Transport for FakeBackend {
  fn send(&self, request: ApiRequest) -> BoxFuture<'static, Result<RawResponse, ApiError>> {
    let response = self.handle(&request);
    Box::pin(futures::future::ready(Ok(response)))
  }
}

fn endpoint_of(url: &Url) -> String {
  url.path().trim_start_matches("/api/").to_string()
}

fn text(value: &Value) -> String {
  value.as_str().unwrap_or_default().to_string()
}

fn json<T: Serialize + ?Sized>(value: &T) -> RawResponse {
  RawResponse {
    status: 200,
    body: serde_json::to_string(value).unwrap(),
  }
}

fn empty() -> RawResponse {
  RawResponse {
    status: 200,
    body: String::new(),
  }
}

fn status(status: u16) -> RawResponse {
  RawResponse {
    status,
    body: String::new(),
  }
}

/// Yield to spawned tasks until `done` returns true
pub async fn settle<F: FnMut() -> bool>(mut done: F) {
  for _ in 0..500 {
    if done() {
      return;
    }
    tokio::time::sleep(Duration::from_millis(1)).await;
  }
  panic!("condition not reached in time");
}
