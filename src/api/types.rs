use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub u64);

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }
  };
}

id_type!(
  /// Server-assigned project id
  JobId
);
id_type!(
  /// Server-assigned employee id
  EmployeeId
);
id_type!(
  /// Server-assigned employee/project assignment id
  AssignmentId
);

/// A project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  pub id: JobId,
  pub name: String,
  pub budget: f64,
  #[serde(default)]
  pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id: EmployeeId,
  pub name: String,
  pub salary: f64,
  pub skill: String,
  #[serde(default)]
  pub comment: Option<String>,
}

/// Join row between a project and an employee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeJob {
  pub id: AssignmentId,
  pub job_id: JobId,
  pub employee_id: EmployeeId,
}

/// An assignment with the employee's fields denormalised onto it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeForProject {
  pub employee_job_id: AssignmentId,
  pub employee_id: EmployeeId,
  pub name: String,
  pub salary: f64,
  pub skill: String,
  #[serde(default)]
  pub comment: Option<String>,
}

/// Fields the user fills in to create or edit a project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobDraft {
  pub name: String,
  pub budget: f64,
  pub comment: Option<String>,
}

/// Fields the user fills in to create or edit an employee
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeDraft {
  pub name: String,
  pub salary: f64,
  pub skill: String,
  pub comment: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewAssignment {
  pub employee_id: EmployeeId,
  pub job_id: JobId,
}

impl From<&Job> for JobDraft {
  fn from(job: &Job) -> Self {
    Self {
      name: job.name.clone(),
      budget: job.budget,
      comment: job.comment.clone(),
    }
  }
}

impl From<&Employee> for EmployeeDraft {
  fn from(employee: &Employee) -> Self {
    Self {
      name: employee.name.clone(),
      salary: employee.salary,
      skill: employee.skill.clone(),
      comment: employee.comment.clone(),
    }
  }
}
