use super::types::{Action, Transition, View};
use super::ViewComponent;
use crate::backend::Session;
use crate::composer::Narrow;
use color_eyre::Result;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListState, Padding, Paragraph, Wrap};
use ratatui::Frame;

/// Shown after a successful share: where the message went.
pub struct ConversationViewComponent {
    narrow: Narrow,
    title: String,
    url: String,
    state: ListState,
}

impl ConversationViewComponent {
    pub fn new(narrow: Narrow, session: &Session) -> Self {
        let title = match &narrow {
            Narrow::Private(ids) => {
                let directory = session.directory();
                ids.iter()
                    .map(|id| directory.display_name(*id))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
            Narrow::Stream { stream, topic } => format!("#{stream} > {topic}"),
        };
        let url = narrow.url(session.auth.realm());
        Self {
            narrow,
            title,
            url,
            state: ListState::default().with_selected(Some(0)),
        }
    }
}

impl ViewComponent for ConversationViewComponent {
    fn view(&self) -> View {
        View::Conversation(Box::new(self.narrow.clone()))
    }
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        Ok(match action {
            Action::NextItem | Action::PrevItem => {
                self.state
                    .select(Some(1 - self.state.selected().unwrap_or_default().min(1)));
                Some(Action::Render)
            }
            Action::Enter if self.state.selected() == Some(0) => {
                if let Err(e) = open::that(&self.url) {
                    log::error!("failed to open {}: {e}", self.url);
                }
                None
            }
            Action::Enter | Action::Back => Some(Action::Transition(Transition::Pop)),
            _ => None,
        })
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [title, url, actions] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .areas(area);
        f.render_widget(
            Paragraph::new(Line::from(vec![
                Span::from("Sent to ").bold(),
                Span::from(self.title.as_str()).bold().yellow(),
            ]))
            .block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Color::Gray)
                    .padding(Padding::horizontal(1)),
            ),
            title,
        );
        f.render_widget(
            Paragraph::new(self.url.as_str())
                .underlined()
                .wrap(Wrap::default())
                .block(Block::default().padding(Padding::uniform(1))),
            url,
        );
        f.render_stateful_widget(
            List::new([Line::from("Open in browser"), Line::from("Done")])
                .block(Block::default().padding(Padding::horizontal(1)))
                .highlight_style(Style::default().reversed()),
            actions,
            &mut self.state,
        );
        Ok(())
    }
}
