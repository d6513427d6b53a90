use crate::api::types::{Employee, EmployeeDraft, EmployeeId};
use crate::app::AppContext;
use crate::cache::{QueryKey, QueryScope};
use crate::mutation::{Mutation, MutationOutcome};
use crate::query::Query;
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FormEvent, FormField, FormModal, FormValues, KeyResult,
};
use crate::ui::renderfns::{format_money, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::project_list::LOADING_MESSAGE;
use crate::ui::{ensure_valid_selection, list_block, render_error_line, render_placeholder};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState};
use serde_json::Value;
use tracing::debug;

/// Root view listing all employees
pub struct EmployeeListView {
  ctx: AppContext,
  query: Query<Vec<Employee>>,
  list_state: ListState,
  form: FormModal,
  confirm: ConfirmDialog,
  editing: Option<EmployeeId>,
  deleting: Option<EmployeeId>,
  /// Form or dialog generation each write was started from
  create_form: Option<u64>,
  update_form: Option<u64>,
  delete_dialog: Option<u64>,
  create: Mutation<EmployeeDraft, Value>,
  update: Mutation<(EmployeeId, EmployeeDraft), Value>,
  delete: Mutation<EmployeeId, Value>,
}

impl EmployeeListView {
  pub fn new(ctx: AppContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::bind(&ctx.cache, QueryKey::Employees, move || {
      let api = api.clone();
      async move { api.get_employees().await }
    });

    // Assigned-employee rows copy employee fields, so every write refreshes them too
    let api = ctx.api.clone();
    let create = Mutation::new(&ctx.cache, move |draft: EmployeeDraft| {
      let api = api.clone();
      async move { api.create_employee(&draft).await }
    })
    .named("create employee")
    .invalidates(QueryKey::Employees)
    .invalidates(QueryScope::EmployeesForProject);

    let api = ctx.api.clone();
    let update = Mutation::new(&ctx.cache, move |(id, draft): (EmployeeId, EmployeeDraft)| {
      let api = api.clone();
      async move { api.update_employee(id, &draft).await }
    })
    .named("update employee")
    .invalidates(QueryKey::Employees)
    .invalidates(QueryScope::EmployeesForProject);

    let api = ctx.api.clone();
    let delete = Mutation::new(&ctx.cache, move |id: EmployeeId| {
      let api = api.clone();
      async move { api.delete_employee(id).await }
    })
    .named("delete employee")
    .invalidates(QueryKey::Employees)
    .invalidates(QueryScope::EmployeesForProject);

    Self {
      ctx,
      query,
      list_state: ListState::default(),
      form: FormModal::new(),
      confirm: ConfirmDialog::new(),
      editing: None,
      deleting: None,
      create_form: None,
      update_form: None,
      delete_dialog: None,
      create,
      update,
      delete,
    }
  }

  fn selected_employee(&self) -> Option<Employee> {
    let employees = self.query.data()?;
    employees.get(self.list_state.selected()?).cloned()
  }

  fn open_form(&mut self, employee: Option<&Employee>) {
    let draft = employee.map(EmployeeDraft::from).unwrap_or_default();
    let salary = match employee {
      Some(_) => draft.salary.to_string(),
      None => String::new(),
    };
    let title = match employee {
      Some(e) => format!("Edit employee {}", e.id),
      None => "Add employee".to_string(),
    };

    self.editing = employee.map(|e| e.id);
    self.form.open(
      title,
      vec![
        FormField::text("Name").with_value(&draft.name),
        FormField::money("Salary").with_value(&salary),
        FormField::text("Skill").with_value(&draft.skill),
        FormField::optional("Comment").with_value(draft.comment.as_deref().unwrap_or("")),
      ],
    );
  }

  fn submit(&mut self, values: FormValues) {
    let draft = EmployeeDraft {
      name: values.text(0),
      salary: values.money(1),
      skill: values.text(2),
      comment: values.optional_text(3),
    };
    match self.editing {
      Some(id) => {
        self.update.mutate((id, draft));
        self.update_form = Some(self.form.generation());
      }
      None => {
        self.create.mutate(draft);
        self.create_form = Some(self.form.generation());
      }
    }
    self.form.set_pending(true);
  }

  /// Apply a save outcome, unless the form it came from was closed since
  fn finish_form(&mut self, origin: Option<u64>, outcome: MutationOutcome<Value>) {
    if !self.form.is_active() || origin != Some(self.form.generation()) {
      debug!("save settled after its form closed");
      return;
    }
    match outcome {
      MutationOutcome::Success(_) => {
        self.form.close();
        self.editing = None;
      }
      MutationOutcome::Error(message) => self.form.set_error(message),
    }
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let state = self.query.state();
    let area = render_error_line(frame, area, state.error.as_ref());
    let block = list_block(
      "Employees",
      state.data.as_ref().map(|d| d.len()),
      state.is_fetching,
    );

    let Some(employees) = state.data else {
      let message = if state.is_loading {
        LOADING_MESSAGE
      } else {
        "Failed to load employees."
      };
      render_placeholder(frame, area, block, message);
      return;
    };

    ensure_valid_selection(&mut self.list_state, employees.len());
    if employees.is_empty() {
      render_placeholder(frame, area, block, "No employees found.");
      return;
    }

    let items: Vec<ListItem> = employees
      .iter()
      .map(|employee| {
        ListItem::new(Line::from(vec![
          Span::styled(
            format!("{:>6}", employee.id),
            Style::default().fg(Color::DarkGray),
          ),
          Span::raw("  "),
          Span::styled(
            format!("{:<24}", truncate(&employee.name, 24)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:<18}", truncate(&employee.skill, 18)),
            Style::default().fg(Color::Yellow),
          ),
          Span::styled(
            format!("{:>14}", format_money(employee.salary, &self.ctx.currency)),
            Style::default().fg(Color::Green),
          ),
          Span::raw("  "),
          Span::raw(truncate(employee.comment.as_deref().unwrap_or(""), 40)),
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

impl View for EmployeeListView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        if let Some(id) = self.deleting {
          self.delete.mutate(id);
          self.delete_dialog = Some(self.confirm.generation());
          self.confirm.set_pending(true);
        }
        return ViewAction::None;
      }
      KeyResult::Event(ConfirmEvent::Cancelled) => {
        self.deleting = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match self.form.handle_key(key) {
      KeyResult::Event(FormEvent::Submitted(values)) => {
        self.submit(values);
        return ViewAction::None;
      }
      KeyResult::Event(FormEvent::Cancelled) => {
        self.editing = None;
        return ViewAction::None;
      }
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('g') | KeyCode::Home => self.list_state.select_first(),
      KeyCode::Char('G') | KeyCode::End => self.list_state.select_last(),
      KeyCode::Char('r') => self.query.refetch(),
      KeyCode::Char('a') => self.open_form(None),
      KeyCode::Char('e') => {
        if let Some(employee) = self.selected_employee() {
          self.open_form(Some(&employee));
        }
      }
      KeyCode::Char('d') => {
        if let Some(employee) = self.selected_employee() {
          self.deleting = Some(employee.id);
          self.confirm.open(
            "Delete employee",
            format!("Delete employee \"{}\"?", employee.name),
            "Deleting...",
          );
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_list(frame, area);
    self.form.render_overlay(frame, area);
    self.confirm.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Employees".to_string()
  }

  fn tick(&mut self) {
    if self.query.poll() {
      let len = self.query.data().map(|e| e.len()).unwrap_or(0);
      ensure_valid_selection(&mut self.list_state, len);
    }

    if let Some(outcome) = self.create.poll() {
      let origin = self.create_form.take();
      self.finish_form(origin, outcome);
    }
    if let Some(outcome) = self.update.poll() {
      let origin = self.update_form.take();
      self.finish_form(origin, outcome);
    }
    if let Some(outcome) = self.delete.poll() {
      let origin = self.delete_dialog.take();
      if !self.confirm.is_active() || origin != Some(self.confirm.generation()) {
        debug!("delete settled after its dialog closed");
        return;
      }
      match outcome {
        MutationOutcome::Success(_) => {
          self.confirm.close();
          self.deleting = None;
        }
        MutationOutcome::Error(message) => self.confirm.set_error(message),
      }
    }
  }

  fn is_capturing_input(&self) -> bool {
    self.form.is_active() || self.confirm.is_active()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("a", "add").with_priority(20),
      ShortcutInfo::new("e", "edit").with_priority(21),
      ShortcutInfo::new("d", "delete").with_priority(22),
      ShortcutInfo::new("r", "refresh").with_priority(40),
    ]
  }
}
