use super::super::modals::types::{Action as ModalAction, Data};
use super::super::modals::{ModalComponent, RecipientsModalComponent};
use super::types::{Action, Transition, View, ViewId};
use super::ViewComponent;
use crate::backend::Session;
use crate::composer::{ComposerState, Destination, Narrow, Phase};
use crate::share::SharedData;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Padding, Paragraph, Wrap};
use ratatui::Frame;
use tokio::sync::mpsc::UnboundedSender;
use tui_textarea::TextArea;

const PRIVATE_ORDER: [Focus; 5] = [
    Focus::Destination,
    Focus::Recipients,
    Focus::Message,
    Focus::Send,
    Focus::Cancel,
];
const STREAM_ORDER: [Focus; 6] = [
    Focus::Destination,
    Focus::Stream,
    Focus::Topic,
    Focus::Message,
    Focus::Send,
    Focus::Cancel,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Destination,
    Recipients,
    Stream,
    Topic,
    Message,
    Send,
    Cancel,
}

fn textarea(title: &'static str, text: &str) -> TextArea<'static> {
    let mut textarea = TextArea::from(text.lines());
    textarea.set_block(Block::bordered().title(title).dim());
    textarea.set_cursor_line_style(Style::default());
    textarea.set_cursor_style(Style::default());
    textarea
}

/// Lets the user pick where shared content goes and add a message.
pub struct ShareViewComponent {
    id: ViewId,
    action_tx: UnboundedSender<Action>,
    session: Session,
    state: ComposerState,
    message: TextArea<'static>,
    stream: TextArea<'static>,
    topic: TextArea<'static>,
    focus: Focus,
    modal: Option<Box<dyn ModalComponent>>,
    narrow: Option<Narrow>,
}

impl ShareViewComponent {
    pub fn new(
        id: ViewId,
        action_tx: UnboundedSender<Action>,
        session: Session,
        shared_data: SharedData,
    ) -> Self {
        let state = ComposerState::new(shared_data);
        let message = textarea("Message", &state.message);
        Self {
            id,
            action_tx,
            session,
            state,
            message,
            stream: textarea("Stream", ""),
            topic: textarea("Topic", ""),
            focus: Focus::Destination,
            modal: None,
            narrow: None,
        }
    }
    fn order(&self) -> &'static [Focus] {
        match self.state.destination {
            Destination::Private => &PRIVATE_ORDER,
            Destination::Stream { .. } => &STREAM_ORDER,
        }
    }
    fn current_textarea(&mut self) -> Option<&mut TextArea<'static>> {
        match self.focus {
            Focus::Message => Some(&mut self.message),
            Focus::Stream => Some(&mut self.stream),
            Focus::Topic => Some(&mut self.topic),
            _ => None,
        }
    }
    fn update_focus(&mut self, focus: Focus) {
        if let Some(curr) = self.current_textarea() {
            curr.set_cursor_style(Style::default());
            if let Some(block) = curr.block() {
                curr.set_block(block.clone().dim());
            }
        }
        self.focus = focus;
        if let Some(curr) = self.current_textarea() {
            curr.set_cursor_style(Style::default().reversed());
            if let Some(block) = curr.block() {
                curr.set_block(block.clone().reset());
            }
        }
    }
    fn step_focus(&mut self, forward: bool) {
        let order = self.order();
        let len = order.len();
        let i = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.update_focus(order[next]);
    }
    fn sync_fields(&mut self) {
        self.state.message = self.message.lines().join("\n");
        if let Destination::Stream { stream, topic } = &mut self.state.destination {
            *stream = self.stream.lines().join("");
            *topic = self.topic.lines().join("");
        }
    }
    fn toggle_destination(&mut self) {
        self.state.destination = match self.state.destination {
            Destination::Private => Destination::Stream {
                stream: String::new(),
                topic: String::new(),
            },
            Destination::Stream { .. } => Destination::Private,
        };
        self.sync_fields();
    }
    fn open_picker(&mut self) {
        self.state.open_picker();
        if self.state.choosing_recipients() {
            self.modal = Some(Box::new(RecipientsModalComponent::new(
                self.session.directory().candidates(),
                &self.state.selected_recipients,
            )));
        }
    }
    fn submit(&mut self) {
        let Some(request) = self.state.begin_send() else {
            log::debug!("send is not enabled");
            return;
        };
        self.narrow = Some(Narrow::from_request(
            &request,
            self.session.directory().own_user_id,
        ));
        let (id, tx, session) = (self.id, self.action_tx.clone(), self.session.clone());
        tokio::spawn(async move {
            let ok = session.send(&request, &tx).await.is_ok();
            if let Err(e) = tx.send(Action::Sent { id, ok }) {
                log::error!("failed to send result: {e}");
            }
        });
    }
    fn sent(&mut self, ok: bool) -> Option<Action> {
        if !self.state.sending() {
            return None;
        }
        if ok {
            self.state.send_succeeded();
            self.narrow.take().map(|narrow| {
                Action::Transition(Transition::Replace(Box::new(View::Conversation(
                    Box::new(narrow),
                ))))
            })
        } else {
            self.state.send_failed();
            Some(Action::Transition(Transition::Pop))
        }
    }
    fn recipients_line(&self) -> Line<'_> {
        if self.state.selected_recipients.is_empty() {
            return Line::from("Please choose recipients to share with").dim();
        }
        let directory = self.session.directory();
        Line::from(
            self.state
                .selected_recipients
                .iter()
                .map(|id| directory.display_name(*id))
                .collect::<Vec<_>>()
                .join(", "),
        )
        .yellow()
    }
    fn content_text(&self) -> Text<'_> {
        Text::from(
            self.state
                .shared_data()
                .content()
                .iter()
                .enumerate()
                .map(|(i, content)| {
                    Line::from(vec![
                        Span::from(if content.is_image() { "image " } else { "file  " })
                            .style(Style::default().fg(if content.is_image() {
                                Color::Magenta
                            } else {
                                Color::Cyan
                            })),
                        Span::from(format!("{}. {}", i + 1, content.url)),
                        Span::from(format!(" ({})", content.mime_type)).dim(),
                    ])
                })
                .collect::<Vec<_>>(),
        )
    }
    fn button(&self, label: &str, focus: Focus, enabled: bool) -> Line<'static> {
        let mut line = Line::from(label.to_string()).centered();
        line = if enabled { line.blue() } else { line.dim() };
        if self.focus == focus {
            line = line.reversed();
        }
        line
    }
}

impl ViewComponent for ShareViewComponent {
    fn view(&self) -> View {
        View::Share(Box::new(self.state.shared_data().clone()))
    }
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let enter = matches!(
            (key.code, key.modifiers),
            (KeyCode::Enter, _) | (KeyCode::Char('m'), KeyModifiers::CONTROL)
        );
        if let Some(modal) = self.modal.as_mut() {
            if enter {
                return Ok(Some(Action::Enter));
            }
            return Ok(match modal.handle_key_events(key)? {
                Some(ModalAction::Render) => Some(Action::Render),
                _ => None,
            });
        }
        if self.state.sending() {
            return Ok(None);
        }
        let focus = self.focus;
        if let Some(textarea) = self.current_textarea() {
            if enter && focus != Focus::Message {
                return Ok(Some(Action::Enter));
            }
            let cursor = textarea.cursor();
            let changed = textarea.input(key);
            let moved = textarea.cursor() != cursor;
            if changed {
                self.sync_fields();
            }
            return Ok((changed || moved).then_some(Action::Render));
        }
        Ok(enter.then_some(Action::Enter))
    }
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if let Some(modal) = self.modal.as_mut() {
            return Ok(match modal.update(action)? {
                Some(ModalAction::Ok(Data::Recipients(recipients))) => {
                    self.state.complete_picker(recipients);
                    self.modal = None;
                    Some(Action::Render)
                }
                Some(ModalAction::Cancel) => {
                    self.state.close_picker();
                    self.modal = None;
                    Some(Action::Render)
                }
                Some(ModalAction::Render) => Some(Action::Render),
                None => None,
            });
        }
        match action {
            Action::Sent { id, ok } if id == self.id => Ok(self.sent(ok)),
            _ if self.state.sending() => Ok(None),
            Action::NextItem => {
                self.step_focus(true);
                Ok(Some(Action::Render))
            }
            Action::PrevItem => {
                self.step_focus(false);
                Ok(Some(Action::Render))
            }
            Action::Enter => {
                match self.focus {
                    Focus::Destination => self.toggle_destination(),
                    Focus::Recipients => self.open_picker(),
                    Focus::Stream | Focus::Topic | Focus::Message => self.step_focus(true),
                    Focus::Send => self.submit(),
                    Focus::Cancel => return self.update(Action::Back),
                }
                Ok(Some(Action::Render))
            }
            Action::Back => {
                self.state.cancel();
                Ok(Some(Action::Transition(Transition::Pop)))
            }
            _ => Ok(None),
        }
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let content_len = self.state.shared_data().content().len() as u16;
        let is_stream = matches!(self.state.destination, Destination::Stream { .. });
        let [title, content, destination, recipients, message, actions] = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(content_len.min(5) + u16::from(content_len > 0)),
            Constraint::Length(1),
            Constraint::Length(if is_stream { 6 } else { 2 }),
            Constraint::Length(8),
            Constraint::Length(1),
        ])
        .areas(area);
        f.render_widget(
            Paragraph::new("Share to Zulip").bold().block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Color::Gray)
                    .padding(Padding::horizontal(1)),
            ),
            title,
        );
        f.render_widget(
            Paragraph::new(self.content_text())
                .wrap(Wrap { trim: false })
                .block(Block::default().padding(Padding::horizontal(1))),
            content,
        );
        let mut destination_line = Line::from(match self.state.destination {
            Destination::Private => "To: Direct message",
            Destination::Stream { .. } => "To: Stream",
        });
        if self.focus == Focus::Destination {
            destination_line = destination_line.reversed();
        }
        f.render_widget(destination_line, destination);
        if is_stream {
            let [stream, topic] =
                Layout::vertical([Constraint::Length(3), Constraint::Length(3)]).areas(recipients);
            f.render_widget(&self.stream, stream);
            f.render_widget(&self.topic, topic);
        } else {
            let [preview, choose] =
                Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(recipients);
            f.render_widget(self.recipients_line(), preview);
            let mut choose_line = Line::from("Choose recipients").right_aligned();
            if self.focus == Focus::Recipients {
                choose_line = choose_line.reversed();
            }
            f.render_widget(choose_line, choose);
        }
        f.render_widget(&self.message, message);

        let [cancel, send] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Fill(1)]).areas(actions);
        f.render_widget(self.button("Cancel", Focus::Cancel, true), cancel);
        let label = if self.state.phase() == Phase::Sending {
            "Sending..."
        } else {
            "Send"
        };
        f.render_widget(
            self.button(label, Focus::Send, self.state.is_send_enabled()),
            send,
        );

        if let Some(modal) = self.modal.as_mut() {
            modal.draw(f, area)?;
        }
        Ok(())
    }
}
