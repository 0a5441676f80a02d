use super::super::views::types::Action as ViewsAction;
use super::types::{Action, Data};
use super::ModalComponent;
use crate::api::{User, UserId};
use color_eyre::Result;
use crossterm::event::KeyEvent;
use indexmap::IndexSet;
use ratatui::layout::{Constraint, Layout, Margin, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Clear, List, ListState};
use ratatui::Frame;
use tui_textarea::TextArea;

pub struct RecipientsModalComponent {
    users: Vec<User>,
    selected: IndexSet<UserId>,
    filter: TextArea<'static>,
    state: ListState,
}

impl RecipientsModalComponent {
    pub fn new(users: Vec<User>, selected: &IndexSet<UserId>) -> Self {
        let mut filter = TextArea::default();
        filter.set_block(Block::bordered().title("Filter"));
        filter.set_cursor_line_style(Style::default());
        Self {
            users,
            selected: selected.clone(),
            filter,
            state: ListState::default().with_selected(Some(0)),
        }
    }
    fn filtered(&self) -> Vec<&User> {
        let query = self.filter.lines().join("").trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| {
                query.is_empty()
                    || u.full_name.to_lowercase().contains(&query)
                    || u.email.to_lowercase().contains(&query)
            })
            .collect()
    }
    // the last row is "OK"
    fn len(&self) -> usize {
        self.filtered().len() + 1
    }
}

impl ModalComponent for RecipientsModalComponent {
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let cursor = self.filter.cursor();
        Ok(if self.filter.input(key) {
            self.state.select(Some(0));
            Some(Action::Render)
        } else if self.filter.cursor() != cursor {
            Some(Action::Render)
        } else {
            None
        })
    }
    fn update(&mut self, action: ViewsAction) -> Result<Option<Action>> {
        Ok(match action {
            ViewsAction::NextItem => {
                let last = self.len() - 1;
                self.state.select(Some(
                    self.state.selected().map_or(0, |s| (s + 1).min(last)),
                ));
                Some(Action::Render)
            }
            ViewsAction::PrevItem => {
                self.state
                    .select(Some(self.state.selected().map_or(0, |s| s.max(1) - 1)));
                Some(Action::Render)
            }
            ViewsAction::Enter => {
                let user_id = self
                    .state
                    .selected()
                    .and_then(|i| self.filtered().get(i).map(|u| u.user_id));
                match (user_id, self.state.selected()) {
                    (Some(id), _) => {
                        if !self.selected.shift_remove(&id) {
                            self.selected.insert(id);
                        }
                        Some(Action::Render)
                    }
                    (None, Some(_)) => Some(Action::Ok(Data::Recipients(
                        self.selected.iter().copied().collect(),
                    ))),
                    (None, None) => None,
                }
            }
            ViewsAction::Back => Some(Action::Cancel),
            _ => None,
        })
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let area = area.inner(Margin {
            horizontal: 2,
            vertical: 1,
        });
        let block = Block::bordered().title("Choose recipients");
        let inner = block.inner(area);
        f.render_widget(Clear, area);
        f.render_widget(block, area);

        let [filter, count, users] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Fill(1),
        ])
        .areas(inner);
        let mut items = self
            .filtered()
            .into_iter()
            .map(|user| {
                let checked = self.selected.contains(&user.user_id);
                Line::from(vec![
                    Span::from(if checked { "[x] " } else { "[ ] " }),
                    Span::from(user.full_name.clone()).bold(),
                    Span::from(format!(" <{}>", user.email)).dim(),
                ])
            })
            .collect::<Vec<_>>();
        items.push(Line::from("OK").centered().blue());
        f.render_widget(&self.filter, filter);
        f.render_widget(
            Line::from(format!("{} selected", self.selected.len()))
                .right_aligned()
                .gray(),
            count,
        );
        f.render_stateful_widget(
            List::new(items)
                .block(
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .border_style(Color::Yellow),
                )
                .highlight_style(Style::reset().reversed()),
            users,
            &mut self.state,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn users() -> Vec<User> {
        [(2, "Bob"), (3, "Carol"), (4, "Dave")]
            .into_iter()
            .map(|(id, name)| User {
                user_id: UserId(id),
                full_name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                is_bot: false,
                is_active: true,
            })
            .collect()
    }

    fn ok(modal: &mut RecipientsModalComponent) -> Option<Action> {
        for _ in 0..modal.len() {
            modal.update(ViewsAction::NextItem).expect("update failed");
        }
        modal.update(ViewsAction::Enter).expect("update failed")
    }

    #[test]
    fn toggle_and_confirm() {
        let mut modal = RecipientsModalComponent::new(users(), &IndexSet::from([UserId(3)]));
        // Bob
        modal.update(ViewsAction::Enter).expect("update failed");
        // Carol
        modal.update(ViewsAction::NextItem).expect("update failed");
        modal.update(ViewsAction::Enter).expect("update failed");
        // Dave
        modal.update(ViewsAction::NextItem).expect("update failed");
        modal.update(ViewsAction::Enter).expect("update failed");
        assert_eq!(
            ok(&mut modal),
            Some(Action::Ok(Data::Recipients(vec![UserId(2), UserId(4)])))
        );
    }

    #[test]
    fn filter() {
        let mut modal = RecipientsModalComponent::new(users(), &IndexSet::new());
        for c in "car".chars() {
            modal
                .handle_key_events(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                .expect("key event failed");
        }
        assert_eq!(modal.len(), 2);
        modal.update(ViewsAction::Enter).expect("update failed");
        assert_eq!(
            ok(&mut modal),
            Some(Action::Ok(Data::Recipients(vec![UserId(3)])))
        );
    }

    #[test]
    fn cancel() {
        let mut modal = RecipientsModalComponent::new(users(), &IndexSet::new());
        assert_eq!(
            modal.update(ViewsAction::Back).expect("update failed"),
            Some(Action::Cancel)
        );
    }
}
