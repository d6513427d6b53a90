mod employee_list;
mod project_detail;
mod project_list;

pub use employee_list::EmployeeListView;
pub use project_detail::ProjectDetailView;
pub use project_list::ProjectListView;
