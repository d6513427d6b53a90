use crate::api::types::{
  AssignmentId, Employee, EmployeeForProject, EmployeeId, Job, JobId, NewAssignment,
};
use crate::app::AppContext;
use crate::cache::QueryKey;
use crate::mutation::{Mutation, MutationOutcome};
use crate::query::Query;
use crate::ui::components::{ConfirmDialog, ConfirmEvent, KeyResult, Picker, PickerEvent};
use crate::ui::renderfns::{format_money, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::{ensure_valid_selection, list_block, render_error_line, render_placeholder};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use serde_json::Value;
use tracing::{debug, info};

/// One project with the employees assigned to it
pub struct ProjectDetailView {
  ctx: AppContext,
  job_id: JobId,
  /// Name from the list, shown until the project itself loads
  name: String,
  project: Query<Job>,
  assigned: Query<Vec<EmployeeForProject>>,
  employees: Query<Vec<Employee>>,
  list_state: ListState,
  picker: Picker<EmployeeId>,
  confirm: ConfirmDialog,
  removing: Option<AssignmentId>,
  /// Dialog generation the pending removal was confirmed from
  remove_dialog: Option<u64>,
  assign: Mutation<NewAssignment, Value>,
  unassign: Mutation<AssignmentId, Value>,
}

impl ProjectDetailView {
  pub fn new(ctx: AppContext, job_id: JobId, name: String) -> Self {
    let api = ctx.api.clone();
    let project = Query::bind(&ctx.cache, QueryKey::Project(job_id), move || {
      let api = api.clone();
      async move { api.get_job(job_id).await }
    });

    let api = ctx.api.clone();
    let assigned = Query::bind(&ctx.cache, QueryKey::EmployeesForProject(job_id), move || {
      let api = api.clone();
      async move { api.get_employees_for_project(job_id).await }
    });

    let api = ctx.api.clone();
    let employees = Query::bind(&ctx.cache, QueryKey::Employees, move || {
      let api = api.clone();
      async move { api.get_employees().await }
    });

    let api = ctx.api.clone();
    let assign = Mutation::new(&ctx.cache, move |assignment: NewAssignment| {
      let api = api.clone();
      async move { api.create_assignment(assignment).await }
    })
    .named("assign employee")
    .invalidates(QueryKey::EmployeesForProject(job_id));

    let api = ctx.api.clone();
    let unassign = Mutation::new(&ctx.cache, move |id: AssignmentId| {
      let api = api.clone();
      async move { api.delete_assignment(id).await }
    })
    .named("unassign employee")
    .invalidates(QueryKey::EmployeesForProject(job_id));

    Self {
      ctx,
      job_id,
      name,
      project,
      assigned,
      employees,
      list_state: ListState::default(),
      picker: Picker::new(),
      confirm: ConfirmDialog::new(),
      removing: None,
      remove_dialog: None,
      assign,
      unassign,
    }
  }

  fn selected_assignment(&self) -> Option<EmployeeForProject> {
    let rows = self.assigned.data()?;
    rows.get(self.list_state.selected()?).cloned()
  }

  /// Employees not yet on this project, labelled "name (skill)"
  fn unassigned_choices(&self) -> Vec<(EmployeeId, String)> {
    let Some(employees) = self.employees.data() else {
      return Vec::new();
    };
    let assigned = self.assigned.data();
    employees
      .iter()
      .filter(|e| {
        !assigned
          .as_ref()
          .is_some_and(|rows| rows.iter().any(|row| row.employee_id == e.id))
      })
      .map(|e| (e.id, format!("{} ({})", e.name, e.skill)))
      .collect()
  }

  /// What the picker says when it has nothing to offer
  fn empty_picker_message(&self) -> &'static str {
    let state = self.employees.state();
    match state.data {
      Some(employees) if employees.is_empty() => "No employees yet. Add some first.",
      Some(_) => "Every employee is already assigned.",
      None if state.error.is_some() && !state.is_fetching => "Error loading employees.",
      None => "Loading...",
    }
  }

  fn start_assign(&mut self, employee_id: EmployeeId) {
    let job_id = self.job_id;
    self.assign.mutate_with(
      NewAssignment {
        employee_id,
        job_id,
      },
      move |_| info!(%employee_id, %job_id, "employee assigned"),
    );
  }

  fn render_header(&self, frame: &mut Frame, area: Rect) {
    let state = self.project.state();
    let label = Style::default().fg(Color::Cyan);

    let mut lines = match &state.data {
      Some(job) => vec![
        Line::from(vec![
          Span::styled("Name:    ", label),
          Span::styled(job.name.clone(), Style::default().bold()),
        ]),
        Line::from(vec![
          Span::styled("Budget:  ", label),
          Span::styled(
            format_money(job.budget, &self.ctx.currency),
            Style::default().fg(Color::Green),
          ),
        ]),
        Line::from(vec![
          Span::styled("Comment: ", label),
          Span::raw(job.comment.clone().unwrap_or_else(|| "-".to_string())),
        ]),
      ],
      None if state.is_loading => vec![Line::styled(
        "Loading project...",
        Style::default().fg(Color::DarkGray),
      )],
      None => Vec::new(),
    };

    if let Some(error) = &state.error {
      lines.push(Line::styled(error.to_string(), Style::default().fg(Color::Red)));
    }
    if let Some(updated) = self.assigned.updated_at() {
      let suffix = if self.assigned.is_stale() { " (outdated)" } else { "" };
      lines.push(Line::styled(
        format!(
          "Staff refreshed at {}{}",
          updated.with_timezone(&Local).format("%H:%M:%S"),
          suffix
        ),
        Style::default().fg(Color::DarkGray),
      ));
    }

    let block = Block::default()
      .title(format!(" Project {} ", self.job_id))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));
    frame.render_widget(
      Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
      area,
    );
  }

  fn render_assigned(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.assigned.state();

    let mut area = render_error_line(frame, area, state.error.as_ref());
    if let Some(error) = self.assign.error() {
      let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
      frame.render_widget(
        Paragraph::new(Line::styled(
          format!(" {}", error),
          Style::default().fg(Color::Red),
        )),
        chunks[1],
      );
      area = chunks[0];
    }

    let title = if self.assign.is_pending() {
      "Assigned employees - assigning..."
    } else {
      "Assigned employees"
    };
    let block = list_block(title, state.data.as_ref().map(|d| d.len()), state.is_fetching);

    let Some(rows) = state.data else {
      let message = if state.is_loading {
        "Loading..."
      } else {
        "Failed to load project employees."
      };
      render_placeholder(frame, area, block, message);
      return;
    };

    ensure_valid_selection(&mut self.list_state, rows.len());
    if rows.is_empty() {
      render_placeholder(
        frame,
        area,
        block,
        "No employees assigned. Press 'a' to assign one.",
      );
      return;
    }

    let items: Vec<ListItem> = rows
      .iter()
      .map(|row| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:<24}", truncate(&row.name, 24)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<18}", truncate(&row.skill, 18)),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            format!("{:>14}", format_money(row.salary, &self.ctx.currency)),
            Style::default().fg(Color::Green),
          ),
          Span::raw("  "),
          Span::raw(truncate(row.comment.as_deref().unwrap_or(""), 40)),
        ]))
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for ProjectDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.picker.handle_key(key) {
      KeyResult::Event(PickerEvent::Selected(employee_id)) => {
        if !self.assign.is_pending() {
          self.start_assign(employee_id);
        }
        return ViewAction::None;
      }
      KeyResult::Event(PickerEvent::Cancelled) | KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some(id) = self.removing {
          self.unassign.mutate(id);
          self.remove_dialog = Some(self.confirm.generation());
          self.confirm.set_pending(true);
        }
        return ViewAction::None;
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.removing = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('r') => {
        self.project.refetch();
        self.assigned.refetch();
        self.employees.refetch();
      }
      KeyCode::Char('a') => {
        if self.assign.is_error() {
          self.assign.reset();
        }
        let choices = self.unassigned_choices();
        let empty_message = self.empty_picker_message();
        self.picker.set_empty_message(empty_message);
        self.picker.show("Assign employee", choices);
      }
      KeyCode::Char('d') => {
        if let Some(row) = self.selected_assignment() {
          self.removing = Some(row.employee_job_id);
          self.confirm.open(
            "Remove employee",
            format!("Remove {} from this project?", row.name),
            "Removing...",
          );
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(7), Constraint::Min(3)])
      .split(area);

    self.render_header(frame, chunks[0]);
    self.render_assigned(frame, chunks[1]);
    self.picker.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.project.data() {
      Some(job) => job.name.clone(),
      None => self.name.clone(),
    }
  }

  fn tick(&mut self) {
    self.project.poll();
    self.employees.poll();
    if self.assigned.poll() {
      let len = self.assigned.data().map(|rows| rows.len()).unwrap_or(0);
      ensure_valid_selection(&mut self.list_state, len);
    }

    // Success callback already logged; errors stay on the mutation for render
    self.assign.poll();

    if let Some(outcome) = self.unassign.poll() {
      let origin = self.remove_dialog.take();
      if !self.confirm.is_active() || origin != Some(self.confirm.generation()) {
        debug!("removal settled after its dialog closed");
        return;
      }
      match outcome {
        MutationOutcome::Success(_) => {
          self.confirm.close();
          self.removing = None;
        }
        MutationOutcome::Error(message) => self.confirm.set_error(message),
      }
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.picker.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "assign").with_priority(20),
      ShortcutInfo::new("d", "remove").with_priority(22),
      ShortcutInfo::new("r", "refresh").with_priority(40),
      ShortcutInfo::new("q", "back").with_priority(90),
    ]
  }
}
