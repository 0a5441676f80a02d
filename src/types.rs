use crate::components::views::types::Action as ViewAction;
use crate::share::SharedData;
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub enum Action {
    Error(String),
    Quit,
    Tick(usize),
    Render,
    NextItem,
    PrevItem,
    Back,
    ShareReceived(Box<SharedData>),
    Toast(String),
    View(ViewAction),
}

#[derive(Debug, Clone)]
pub enum Event {
    Tick(usize),
    Key(KeyEvent),
    Focus(bool),
    Resize,
    Error(String),
}
