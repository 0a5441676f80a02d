use super::views::types::{Action as ViewAction, Transition, View, ViewId};
use super::views::{
    ConversationViewComponent, HomeViewComponent, ShareViewComponent, ViewComponent,
};
use super::Component;
use crate::backend::Session;
use crate::types::Action;
use color_eyre::Result;
use crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Stylize;
use ratatui::text::Line;
use ratatui::Frame;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::mpsc::{self, UnboundedSender};

static COUNTER: AtomicU32 = AtomicU32::new(0);

// in ticks
const TOAST_DURATION: usize = 6;

/// Stack of views; the last one is shown and receives input.
pub struct MainComponent {
    views: Vec<(ViewId, Box<dyn ViewComponent>)>,
    session: Session,
    view_tx: UnboundedSender<ViewAction>,
    toast: Option<(String, usize)>,
}

impl MainComponent {
    pub fn new(session: Session, action_tx: UnboundedSender<Action>) -> Self {
        let (view_tx, mut view_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(action) = view_rx.recv().await {
                if let Err(e) = action_tx.send(Action::View(action)) {
                    log::error!("failed to send view action: {e}");
                    break;
                }
            }
        });
        let mut main = Self {
            views: Vec::new(),
            session,
            view_tx,
            toast: None,
        };
        let home = main.view(&View::Home);
        main.views.push(home);
        main
    }
    pub fn current_view(&self) -> Option<View> {
        self.views.last().map(|(_, view)| view.view())
    }
    pub fn toast(&self) -> Option<&str> {
        self.toast.as_ref().map(|(message, _)| message.as_str())
    }
    fn view(&self, view: &View) -> (ViewId, Box<dyn ViewComponent>) {
        let id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let component: Box<dyn ViewComponent> = match view {
            View::Home => Box::new(HomeViewComponent::new(self.session.clone())),
            View::Share(data) => Box::new(ShareViewComponent::new(
                id,
                self.view_tx.clone(),
                self.session.clone(),
                data.as_ref().clone(),
            )),
            View::Conversation(narrow) => Box::new(ConversationViewComponent::new(
                narrow.as_ref().clone(),
                &self.session,
            )),
        };
        (id, component)
    }
    fn transition(&mut self, index: usize, transition: &Transition) -> Option<Action> {
        log::debug!("transition at {index}: {transition:?}");
        match transition {
            Transition::Push(view) => {
                let next = self.view(view);
                self.views.push(next);
            }
            // the root view stays
            Transition::Pop if index == 0 => return None,
            Transition::Pop => {
                if index < self.views.len() {
                    self.views.remove(index);
                }
            }
            Transition::Replace(view) => {
                let next = self.view(view);
                if let Some(slot) = self.views.get_mut(index) {
                    *slot = next;
                }
            }
        }
        Some(Action::Render)
    }
    fn set_toast(&mut self, message: String) -> Option<Action> {
        self.toast = Some((message, TOAST_DURATION));
        Some(Action::Render)
    }
    /// Apply what a view returned, relative to the view's position.
    fn handle_view_result(&mut self, index: usize, action: Option<ViewAction>) -> Option<Action> {
        match action? {
            ViewAction::Transition(transition) => self.transition(index, &transition),
            ViewAction::Toast(message) => self.set_toast(message),
            _ => Some(Action::Render),
        }
    }
    fn update_view(&mut self, index: usize, action: ViewAction) -> Result<Option<Action>> {
        let Some((_, view)) = self.views.get_mut(index) else {
            return Ok(None);
        };
        let result = view.update(action)?;
        Ok(self.handle_view_result(index, result))
    }
    fn top(&self) -> usize {
        self.views.len().saturating_sub(1)
    }
}

impl Component for MainComponent {
    fn init(&mut self) -> Result<()> {
        let (session, tx) = (self.session.clone(), self.view_tx.clone());
        tokio::spawn(async move {
            session.load_directory().await;
            if let Err(e) = tx.send(ViewAction::Render) {
                log::error!("failed to send render action: {e}");
            }
        });
        Ok(())
    }
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let Some((_, view)) = self.views.last_mut() else {
            return Ok(None);
        };
        Ok(match view.handle_key_events(key)? {
            Some(ViewAction::Render) => Some(Action::Render),
            Some(action) => Some(Action::View(action)),
            None => None,
        })
    }
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        let top = self.top();
        match action {
            Action::ShareReceived(data) => {
                Ok(self.transition(top, &Transition::Push(Box::new(View::Share(data)))))
            }
            Action::Toast(message) => Ok(self.set_toast(message)),
            Action::Tick(_) => {
                if let Some((_, remaining)) = self.toast.as_mut() {
                    *remaining = remaining.saturating_sub(1);
                    if *remaining == 0 {
                        self.toast = None;
                        return Ok(Some(Action::Render));
                    }
                }
                Ok(None)
            }
            Action::NextItem => self.update_view(top, ViewAction::NextItem),
            Action::PrevItem => self.update_view(top, ViewAction::PrevItem),
            Action::Back => self.update_view(top, ViewAction::Back),
            Action::View(ViewAction::Render) => Ok(Some(Action::Render)),
            Action::View(ViewAction::Toast(message)) => Ok(self.set_toast(message)),
            Action::View(ViewAction::Transition(transition)) => {
                Ok(self.transition(top, &transition))
            }
            Action::View(ViewAction::Sent { id, ok }) => {
                // the composer may no longer be on top
                match self.views.iter().position(|(view_id, _)| *view_id == id) {
                    Some(index) => self.update_view(index, ViewAction::Sent { id, ok }),
                    None => {
                        log::debug!("view {id} is gone");
                        Ok(None)
                    }
                }
            }
            Action::View(action) => self.update_view(top, action),
            _ => Ok(None),
        }
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [main, status] =
            Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        if let Some((_, view)) = self.views.last_mut() {
            view.draw(f, main)?;
        }
        if let Some((message, _)) = &self.toast {
            f.render_widget(Line::from(message.as_str()).centered().reversed(), status);
        }
        Ok(())
    }
}
