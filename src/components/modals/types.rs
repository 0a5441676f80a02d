use crate::api::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Data {
    Recipients(Vec<UserId>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ok(Data),
    Cancel,
    Render,
}
