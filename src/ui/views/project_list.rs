use crate::api::types::{Job, JobDraft, JobId};
use crate::app::AppContext;
use crate::cache::{QueryKey, QueryScope};
use crate::mutation::{Mutation, MutationOutcome};
use crate::query::Query;
use crate::ui::components::{
  ConfirmDialog, ConfirmEvent, FormEvent, FormField, FormModal, FormValues, KeyResult,
};
use crate::ui::renderfns::{format_money, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::ProjectDetailView;
use crate::ui::{ensure_valid_selection, list_block, render_error_line, render_placeholder};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{List, ListItem, ListState};
use serde_json::Value;
use tracing::debug;

pub const LOADING_MESSAGE: &str = "Loading... Might take a second for the database to spin up.";

/// Root view listing all projects
pub struct ProjectListView {
  ctx: AppContext,
  query: Query<Vec<Job>>,
  list_state: ListState,
  form: FormModal,
  confirm: ConfirmDialog,
  /// Project being edited; `None` while the form adds a new one
  editing: Option<JobId>,
  deleting: Option<JobId>,
  /// Form or dialog generation each write was started from
  create_form: Option<u64>,
  update_form: Option<u64>,
  delete_dialog: Option<u64>,
  create: Mutation<JobDraft, Value>,
  update: Mutation<(JobId, JobDraft), Value>,
  delete: Mutation<JobId, Value>,
}

impl ProjectListView {
  pub fn new(ctx: AppContext) -> Self {
    let api = ctx.api.clone();
    let query = Query::bind(&ctx.cache, QueryKey::Projects, move || {
      let api = api.clone();
      async move { api.get_jobs().await }
    });

    let api = ctx.api.clone();
    let create = Mutation::new(&ctx.cache, move |draft: JobDraft| {
      let api = api.clone();
      async move { api.create_job(&draft).await }
    })
    .named("create project")
    .invalidates(QueryKey::Projects);

    let api = ctx.api.clone();
    let update = Mutation::new(&ctx.cache, move |(id, draft): (JobId, JobDraft)| {
      let api = api.clone();
      async move { api.update_job(id, &draft).await }
    })
    .named("update project")
    .invalidates(QueryKey::Projects)
    .invalidates(QueryScope::Project);

    let api = ctx.api.clone();
    let delete = Mutation::new(&ctx.cache, move |id: JobId| {
      let api = api.clone();
      async move { api.delete_job(id).await }
    })
    .named("delete project")
    .invalidates(QueryKey::Projects)
    .invalidates(QueryScope::Project)
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

  fn selected_job(&self) -> Option<Job> {
    let jobs = self.query.data()?;
    let idx = self.list_state.selected()?;
    jobs.get(idx).cloned()
  }

  fn open_form(&mut self, job: Option<&Job>) {
    let draft = job.map(JobDraft::from).unwrap_or_default();
    let (title, budget) = match job {
      Some(job) => (format!("Edit project {}", job.id), draft.budget.to_string()),
      None => ("Add project".to_string(), String::new()),
    };

    self.editing = job.map(|j| j.id);
    self.form.open(
      title,
      vec![
        FormField::text("Name").with_value(&draft.name),
        FormField::money("Budget").with_value(&budget),
        FormField::optional("Comment").with_value(draft.comment.as_deref().unwrap_or("")),
      ],
    );
  }

  fn submit(&mut self, values: FormValues) {
    let draft = JobDraft {
      name: values.text(0),
      budget: values.money(1),
      comment: values.optional_text(2),
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
    let block = list_block("Projects", state.data.as_ref().map(|d| d.len()), state.is_fetching);

    let Some(jobs) = state.data else {
      let message = if state.is_loading {
        LOADING_MESSAGE
      } else {
        "Failed to load projects."
      };
      render_placeholder(frame, area, block, message);
      return;
    };

    ensure_valid_selection(&mut self.list_state, jobs.len());
    if jobs.is_empty() {
      render_placeholder(frame, area, block, "No projects found.");
      return;
    }

    let items: Vec<ListItem> = jobs
      .iter()
      .map(|job| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:>6}", job.id), Style::default().fg(Color::DarkGray)),
          Span::raw("  "),
          Span::styled(
            format!("{:<30}", truncate(&job.name, 30)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw(" "),
          Span::styled(
            format!("{:>16}", format_money(job.budget, &self.ctx.currency)),
            Style::default().fg(Color::Green),
          ),
          Span::raw("  "),
          Span::raw(truncate(job.comment.as_deref().unwrap_or(""), 50)),
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

impl View for ProjectListView {
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
        if let Some(job) = self.selected_job() {
          self.open_form(Some(&job));
        }
      }
      KeyCode::Char('d') => {
        if let Some(job) = self.selected_job() {
          self.deleting = Some(job.id);
          self.confirm.open(
            "Delete project",
            format!("Delete project \"{}\" and its assignments?", job.name),
            "Deleting...",
          );
        }
      }
      KeyCode::Enter => {
        if let Some(job) = self.selected_job() {
          return ViewAction::Push(Box::new(ProjectDetailView::new(
            self.ctx.clone(),
            job.id,
            job.name,
          )));
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
    "Projects".to_string()
  }

  fn tick(&mut self) {
    if self.query.poll() {
      let len = self.query.data().map(|jobs| jobs.len()).unwrap_or(0);
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
      ShortcutInfo::new("enter", "staff").with_priority(30),
      ShortcutInfo::new("r", "refresh").with_priority(40),
    ]
  }
}
