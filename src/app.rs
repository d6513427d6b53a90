use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{EmployeeListView, ProjectListView};
use clap::ValueEnum;
use color_eyre::{eyre::eyre, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{debug, info, warn};

const TICK_RATE: Duration = Duration::from_millis(100);
const DEFAULT_TITLE: &str = "crewdesk";

/// Handles shared by every view
#[derive(Clone)]
pub struct AppContext {
  pub api: ApiClient,
  pub cache: QueryCache,
  /// Currency symbol for budgets and salaries
  pub currency: String,
}

/// Screen at the bottom of the view stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RootView {
  #[default]
  Projects,
  Employees,
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,
  command_input: CommandInput,
  ctx: AppContext,
  title: String,
  api_host: String,
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, root: RootView) -> Result<Self> {
    let api =
      ApiClient::new(&config.api).map_err(|e| eyre!("Failed to create API client: {}", e))?;
    let ctx = AppContext {
      api,
      cache: QueryCache::new(),
      currency: config.currency.clone(),
    };
    let title = config
      .title
      .clone()
      .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Ok(Self::with_context(ctx, title, config.api_host().to_string(), root))
  }

  pub fn with_context(ctx: AppContext, title: String, api_host: String, root: RootView) -> Self {
    let mut app = Self {
      view_stack: Vec::new(),
      command_input: CommandInput::new(),
      ctx,
      title,
      api_host,
      should_quit: false,
    };
    app.set_root(root);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
  ) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    info!(host = %self.api_host, "started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => self.tick(),
        Some(Event::Resize) => {}
        None => break,
      }
    }

    info!("shutting down");
    Ok(())
  }

  /// Apply settled fetches, then let every view on the stack poll its
  /// queries and mutations.
  pub fn tick(&mut self) {
    self.ctx.cache.poll();
    for view in &mut self.view_stack {
      view.tick();
    }
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // Open modals keep ':' as a typed character
    let capturing = self
      .current_view()
      .is_some_and(|view| view.is_capturing_input());
    if !capturing {
      match self.command_input.handle_key(key) {
        KeyResult::Event(CommandEvent::Submitted(cmd)) => {
          self.execute_command(&cmd);
          return;
        }
        KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
        KeyResult::NotHandled => {}
      }
    }

    let Some(view) = self.view_stack.last_mut() else {
      return;
    };
    match view.handle_key(key) {
      ViewAction::Push(view) => {
        debug!(view = %view.breadcrumb_label(), "push view");
        self.view_stack.push(view);
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::None => {}
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "projects" => self.set_root(RootView::Projects),
      "employees" => self.set_root(RootView::Employees),
      "quit" => self.should_quit = true,
      other => warn!(command = other, "unknown command"),
    }
  }

  /// Replace the whole stack with a fresh root view
  fn set_root(&mut self, root: RootView) {
    let view: Box<dyn View> = match root {
      RootView::Projects => Box::new(ProjectListView::new(self.ctx.clone())),
      RootView::Employees => Box::new(EmployeeListView::new(self.ctx.clone())),
    };
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  pub fn should_quit(&self) -> bool {
    self.should_quit
  }

  pub fn current_view(&self) -> Option<&dyn View> {
    self.view_stack.last().map(|v| v.as_ref())
  }

  pub fn current_view_mut(&mut self) -> Option<&mut (dyn View + 'static)> {
    self.view_stack.last_mut().map(|v| v.as_mut())
  }

  pub fn command_input(&self) -> &CommandInput {
    &self.command_input
  }

  pub fn title(&self) -> &str {
    &self.title
  }

  pub fn api_host(&self) -> &str {
    &self.api_host
  }

  pub fn breadcrumb(&self) -> Vec<String> {
    self
      .view_stack
      .iter()
      .map(|view| view.breadcrumb_label())
      .collect()
  }
}

#[cfg(test)]
impl AppContext {
  pub fn for_tests(backend: &crate::testing::FakeBackend) -> Self {
    Self {
      api: backend.client(),
      cache: QueryCache::new(),
      currency: "A$".to_string(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::Job;
  use crate::cache::QueryKey;
  use crate::testing::{settle, FakeBackend};

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn app(backend: &FakeBackend, root: RootView) -> App {
    App::with_context(
      AppContext::for_tests(backend),
      "crewdesk".to_string(),
      "fake.test".to_string(),
      root,
    )
  }

  fn command(app: &mut App, text: &str) {
    app.handle_key(key(KeyCode::Char(':')));
    for c in text.chars() {
      app.handle_key(key(KeyCode::Char(c)));
    }
    app.handle_key(key(KeyCode::Enter));
  }

  #[tokio::test]
  async fn test_command_switches_root() {
    let backend = FakeBackend::new();
    let mut app = app(&backend, RootView::Projects);
    assert_eq!(app.breadcrumb(), vec!["Projects"]);

    command(&mut app, "employees");
    assert_eq!(app.breadcrumb(), vec!["Employees"]);
    assert!(!app.command_input().is_active());

    command(&mut app, "q");
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_ctrl_c_quits() {
    let backend = FakeBackend::new();
    let mut app = app(&backend, RootView::Employees);

    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_enter_pushes_detail_and_q_pops() {
    let backend = FakeBackend::new();
    backend.seed_job("Bridge", 1000.0);
    let mut app = app(&backend, RootView::Projects);
    settle(|| {
      app.tick();
      app.ctx.cache.get::<Vec<Job>>(&QueryKey::Projects).is_some()
    })
    .await;
    app.tick();

    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.breadcrumb(), vec!["Projects", "Bridge"]);

    app.handle_key(key(KeyCode::Char('q')));
    assert_eq!(app.breadcrumb(), vec!["Projects"]);
    assert!(!app.should_quit());

    app.handle_key(key(KeyCode::Char('q')));
    assert!(app.should_quit());
  }

  #[tokio::test]
  async fn test_colon_goes_to_open_form() {
    let backend = FakeBackend::new();
    let mut app = app(&backend, RootView::Projects);

    app.handle_key(key(KeyCode::Char('a')));
    app.handle_key(key(KeyCode::Char(':')));

    assert!(!app.command_input().is_active());
    assert!(app.current_view().is_some_and(|v| v.is_capturing_input()));
  }
}
