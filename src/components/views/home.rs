use super::types::View;
use super::ViewComponent;
use crate::backend::Session;
use color_eyre::Result;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Stylize};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::Frame;

pub struct HomeViewComponent {
    session: Session,
}

impl HomeViewComponent {
    pub fn new(session: Session) -> Self {
        Self { session }
    }
}

impl ViewComponent for HomeViewComponent {
    fn view(&self) -> View {
        View::Home
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [title, body] =
            Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
        f.render_widget(
            Paragraph::new("Share to Zulip").bold().block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Color::Gray)
                    .padding(Padding::horizontal(1)),
            ),
            title,
        );
        let directory = self.session.directory();
        let status = if directory.loaded {
            Line::from(format!("{} users available", directory.users.len())).green()
        } else {
            Line::from("Loading users...").dim()
        };
        let text = Text::from(vec![
            Line::from(format!(
                "Signed in as {} on {}",
                self.session.auth.email,
                self.session.auth.realm()
            )),
            status,
            Line::default(),
            Line::from("Waiting for something to share."),
            Line::from("From another terminal, run one of:").dim(),
            Line::from("  zulip-share --text 'some text'").dim(),
            Line::from("  zulip-share --stream photo.png --stream notes.pdf").dim(),
        ]);
        f.render_widget(
            Paragraph::new(text)
                .wrap(Wrap::default())
                .block(Block::default().padding(Padding::uniform(1))),
            body,
        );
        Ok(())
    }
}
