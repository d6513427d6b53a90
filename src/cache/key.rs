//! Logical query identities used as cache keys.

use std::fmt;

use crate::api::types::JobId;

/// Identity of one cached query result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
  /// All employees
  Employees,
  /// All projects
  Projects,
  /// A single project
  Project(JobId),
  /// Employees assigned to one project
  EmployeesForProject(JobId),
}

/// Family a key belongs to, ignoring its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryScope {
  Employees,
  Projects,
  Project,
  EmployeesForProject,
}

/// Selects the keys an invalidation applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyFilter {
  /// Exactly this key
  Key(QueryKey),
  /// Every key in this scope, whatever its parameters
  Scope(QueryScope),
}

impl QueryKey {
  pub fn scope(&self) -> QueryScope {
    match self {
      Self::Employees => QueryScope::Employees,
      Self::Projects => QueryScope::Projects,
      Self::Project(_) => QueryScope::Project,
      Self::EmployeesForProject(_) => QueryScope::EmployeesForProject,
    }
  }

  pub fn description(&self) -> String {
    match self {
      Self::Employees => "employees".to_string(),
      Self::Projects => "projects".to_string(),
      Self::Project(id) => format!("project {}", id),
      Self::EmployeesForProject(id) => format!("employees for project {}", id),
    }
  }
}

impl fmt::Display for QueryKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.description())
  }
}

impl KeyFilter {
  pub fn matches(&self, key: &QueryKey) -> bool {
    match self {
      Self::Key(k) => k == key,
      Self::Scope(scope) => key.scope() == *scope,
    }
  }
}

impl From<QueryKey> for KeyFilter {
  fn from(key: QueryKey) -> Self {
    KeyFilter::Key(key)
  }
}

impl From<QueryScope> for KeyFilter {
  fn from(scope: QueryScope) -> Self {
    KeyFilter::Scope(scope)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_exact_filter_distinguishes_projects() {
    let filter = KeyFilter::from(QueryKey::EmployeesForProject(JobId(5)));
    assert!(filter.matches(&QueryKey::EmployeesForProject(JobId(5))));
    assert!(!filter.matches(&QueryKey::EmployeesForProject(JobId(6))));
  }

  #[test]
  fn test_scope_filter_ignores_parameters() {
    let filter = KeyFilter::from(QueryScope::EmployeesForProject);
    assert!(filter.matches(&QueryKey::EmployeesForProject(JobId(5))));
    assert!(filter.matches(&QueryKey::EmployeesForProject(JobId(6))));
    assert!(!filter.matches(&QueryKey::Employees));
  }

  #[test]
  fn test_description() {
    assert_eq!(QueryKey::Project(JobId(7)).to_string(), "project 7");
  }
}
