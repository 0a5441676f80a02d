mod conversation;
mod home;
mod share;
pub mod types;

use self::types::{Action, View};
pub use self::{
    conversation::ConversationViewComponent, home::HomeViewComponent, share::ShareViewComponent,
};
use {
    color_eyre::Result,
    crossterm::event::KeyEvent,
    ratatui::{layout::Rect, Frame},
};

pub trait ViewComponent {
    fn view(&self) -> View;
    #[allow(unused_variables)]
    fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        Ok(None)
    }
    #[allow(unused_variables)]
    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        Ok(None)
    }
    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()>;
}
