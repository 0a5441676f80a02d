use crate::backend::Session;
use crate::components::main::MainComponent;
use crate::components::Component;
use crate::config::{Config, Key};
use crate::share::{AppStatus, Lifecycle};
use crate::tui::{io, Tui};
use crate::types::{Action, Event};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::widgets::{Block, List};
use ratatui::{Frame, Terminal};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

const DEV_HISTORY: usize = 50;

pub struct App {
    config: Config,
    session: Session,
    lifecycle: Arc<Lifecycle>,
    history: VecDeque<String>,
}

impl App {
    pub fn new(config: Config, session: Session, lifecycle: Arc<Lifecycle>) -> Self {
        log::debug!("App::new({config:?})");
        Self {
            config,
            session,
            lifecycle,
            history: VecDeque::new(),
        }
    }
    pub async fn run(&mut self) -> Result<()> {
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        let terminal = Terminal::new(CrosstermBackend::new(io()))?;
        log::debug!("terminal size: {}", terminal.size()?);
        let mut tui = Tui::new(terminal);
        tui.start()?;

        let mut main_component = MainComponent::new(self.session.clone(), action_tx.clone());
        main_component.init()?;

        // from here on, shares arrive as live events
        if let Some(data) = self.lifecycle.ready(action_tx.clone()) {
            log::info!("opening pending share");
            action_tx.send(Action::ShareReceived(Box::new(data)))?;
        }
        action_tx.send(Action::Render)?;

        let mut should_quit = false;
        loop {
            if let Some(e) = tui.next_event().await {
                match e {
                    Event::Key(key_event) => {
                        if let Some(action) = self.handle_key_events(key_event) {
                            action_tx.send(action)?;
                        } else if let Some(action) = main_component.handle_key_events(key_event)? {
                            action_tx.send(action)?;
                        }
                    }
                    Event::Tick(i) => action_tx.send(Action::Tick(i))?,
                    Event::Focus(focused) => {
                        self.lifecycle.set_status(if focused {
                            AppStatus::Foreground
                        } else {
                            AppStatus::Background
                        });
                        if self.config.dev {
                            action_tx.send(Action::Render)?;
                        }
                    }
                    Event::Resize => action_tx.send(Action::Render)?,
                    Event::Error(message) => action_tx.send(Action::Error(message))?,
                }
            }
            while let Ok(action) = action_rx.try_recv() {
                if !matches!(action, Action::Tick(_) | Action::Render) {
                    log::info!("Action {action:?}");
                    if self.config.dev {
                        self.record(&action);
                    }
                }
                match action {
                    Action::Quit => should_quit = true,
                    Action::Error(message) => log::error!("{message}"),
                    Action::Render => {
                        tui.draw(|f| {
                            let area = if self.config.dev {
                                let [main, dev] = Layout::horizontal([
                                    Constraint::Fill(1),
                                    Constraint::Length(60),
                                ])
                                .areas(f.area());
                                self.draw_dev(f, dev);
                                main
                            } else {
                                f.area()
                            };
                            if let Err(e) = main_component.draw(f, area) {
                                if let Err(e) =
                                    action_tx.send(Action::Error(format!("failed to draw: {e:?}")))
                                {
                                    log::error!("failed to send error: {e}");
                                }
                            }
                        })?;
                    }
                    _ => {
                        if let Some(action) = main_component.update(action)? {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            if should_quit {
                break;
            }
        }
        self.lifecycle.shutdown();
        tui.end()?;
        Ok(())
    }
    fn handle_key_events(&self, key_event: KeyEvent) -> Option<Action> {
        let key = Key::from(key_event);
        if let Some(action) = self.config.keybindings.global.get(&key) {
            return Some(action.into());
        }
        self.config
            .keybindings
            .composer
            .get(&key)
            .map(Action::from)
    }
    fn record(&mut self, action: &Action) {
        if self.history.len() == DEV_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(format!("{action:?}"));
    }
    fn draw_dev(&self, f: &mut Frame<'_>, area: Rect) {
        let [status, history] =
            Layout::vertical([Constraint::Length(3), Constraint::Fill(1)]).areas(area);
        f.render_widget(
            Line::from(format!("{:?}", self.lifecycle.status()))
                .yellow()
                .centered(),
            Block::bordered().title("status").inner(status),
        );
        f.render_widget(Block::bordered().title("status"), status);
        f.render_widget(
            List::new(
                self.history
                    .iter()
                    .rev()
                    .map(|s| Line::from(s.as_str()).gray()),
            )
            .block(Block::bordered().title("actions")),
            history,
        );
    }
}
