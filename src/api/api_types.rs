//! Request payloads matching what the staffing API expects.
//!
//! Field casing differs between endpoints (create-job is lowercase, the other
//! writes are PascalCase). That is the upstream contract, kept as-is.

use serde::Serialize;

use super::types::{EmployeeDraft, EmployeeId, JobDraft, JobId, NewAssignment};

/// Comments are optional; an empty field is sent as null
fn non_empty(comment: &Option<String>) -> Option<String> {
  comment
    .as_deref()
    .map(str::trim)
    .filter(|c| !c.is_empty())
    .map(String::from)
}

#[derive(Debug, Serialize)]
pub struct ApiCreateJob {
  pub name: String,
  pub budget: f64,
  pub comment: Option<String>,
}

impl From<&JobDraft> for ApiCreateJob {
  fn from(draft: &JobDraft) -> Self {
    Self {
      name: draft.name.clone(),
      budget: draft.budget,
      comment: non_empty(&draft.comment),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiUpdateJob {
  pub id: JobId,
  pub name: String,
  pub budget: f64,
  pub comment: Option<String>,
}

impl ApiUpdateJob {
  pub fn new(id: JobId, draft: &JobDraft) -> Self {
    Self {
      id,
      name: draft.name.clone(),
      budget: draft.budget,
      comment: non_empty(&draft.comment),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiDeleteJob {
  pub id: JobId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiCreateEmployee {
  pub name: String,
  pub salary: f64,
  pub skill: String,
  pub comment: Option<String>,
}

impl From<&EmployeeDraft> for ApiCreateEmployee {
  fn from(draft: &EmployeeDraft) -> Self {
    Self {
      name: draft.name.clone(),
      salary: draft.salary,
      skill: draft.skill.clone(),
      comment: non_empty(&draft.comment),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiUpdateEmployee {
  pub id: EmployeeId,
  pub name: String,
  pub salary: f64,
  pub skill: String,
  pub comment: Option<String>,
}

impl ApiUpdateEmployee {
  pub fn new(id: EmployeeId, draft: &EmployeeDraft) -> Self {
    Self {
      id,
      name: draft.name.clone(),
      salary: draft.salary,
      skill: draft.skill.clone(),
      comment: non_empty(&draft.comment),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiCreateEmployeeJob {
  pub employee_id: EmployeeId,
  pub job_id: JobId,
}

impl From<NewAssignment> for ApiCreateEmployeeJob {
  fn from(assignment: NewAssignment) -> Self {
    Self {
      employee_id: assignment.employee_id,
      job_id: assignment.job_id,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_create_job_is_lowercase() {
    let draft = JobDraft {
      name: "Bridge".to_string(),
      budget: 1000.0,
      comment: Some("  ".to_string()),
    };
    let value = serde_json::to_value(ApiCreateJob::from(&draft)).unwrap();
    assert_eq!(
      value,
      json!({"name": "Bridge", "budget": 1000.0, "comment": null})
    );
  }

  #[test]
  fn test_update_job_is_pascal_case() {
    let draft = JobDraft {
      name: "Bridge".to_string(),
      budget: 1000.0,
      comment: Some("phase 2".to_string()),
    };
    let value = serde_json::to_value(ApiUpdateJob::new(JobId(4), &draft)).unwrap();
    assert_eq!(
      value,
      json!({"Id": 4, "Name": "Bridge", "Budget": 1000.0, "Comment": "phase 2"})
    );
  }

  #[test]
  fn test_create_employee_job_payload() {
    let payload = ApiCreateEmployeeJob::from(NewAssignment {
      employee_id: EmployeeId(3),
      job_id: JobId(5),
    });
    assert_eq!(
      serde_json::to_value(payload).unwrap(),
      json!({"EmployeeId": 3, "JobId": 5})
    );
  }
}
