use crate::api::Auth;
use crate::types::Action;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    pub server: Option<Auth>,
    #[serde(default)]
    pub keybindings: Keybindings,
    #[serde(default)]
    pub dev: bool,
}

impl Config {
    pub fn set_default_keybindings(&mut self) {
        if self.keybindings.global.is_empty() {
            self.keybindings.global = HashMap::from_iter([
                (
                    Key(KeyCode::Char('c'), Some(KeyModifiers::CONTROL)),
                    GlobalAction::Quit,
                ),
                (
                    Key(KeyCode::Char('q'), Some(KeyModifiers::CONTROL)),
                    GlobalAction::Quit,
                ),
            ]);
        }
        if self.keybindings.composer.is_empty() {
            self.keybindings.composer = HashMap::from_iter([
                (Key(KeyCode::Tab, None), ComposerAction::NextItem),
                (Key(KeyCode::BackTab, None), ComposerAction::PrevItem),
                (
                    Key(KeyCode::Char('n'), Some(KeyModifiers::CONTROL)),
                    ComposerAction::NextItem,
                ),
                (
                    Key(KeyCode::Char('p'), Some(KeyModifiers::CONTROL)),
                    ComposerAction::PrevItem,
                ),
                (Key(KeyCode::Esc, None), ComposerAction::Back),
            ]);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Keybindings {
    #[serde(default)]
    pub global: HashMap<Key, GlobalAction>,
    #[serde(default)]
    pub composer: HashMap<Key, ComposerAction>,
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Key(KeyCode, Option<KeyModifiers>);

impl From<KeyEvent> for Key {
    fn from(event: KeyEvent) -> Self {
        Self(
            event.code,
            match (event.code, event.modifiers) {
                (KeyCode::BackTab, _) => None,
                (_, KeyModifiers::CONTROL | KeyModifiers::SHIFT) => Some(event.modifiers),
                _ => None,
            },
        )
    }
}

const NAMED_KEYS: [(&str, KeyCode); 4] = [
    ("Tab", KeyCode::Tab),
    ("BackTab", KeyCode::BackTab),
    ("Esc", KeyCode::Esc),
    ("Enter", KeyCode::Enter),
];

fn parse_code(s: &str) -> Option<KeyCode> {
    if let Some((_, code)) = NAMED_KEYS.iter().find(|(name, _)| *name == s) {
        return Some(*code);
    }
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeyCode::Char(c)),
        _ => None,
    }
}

impl Serialize for Key {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let code = match self.0 {
            KeyCode::Char(c) => c.to_string(),
            code => match NAMED_KEYS.iter().find(|(_, named)| *named == code) {
                Some((name, _)) => name.to_string(),
                None => return Err(serde::ser::Error::custom("invalid key code")),
            },
        };
        match self.1 {
            Some(modifier) => {
                let modifier = match modifier {
                    KeyModifiers::CONTROL => "Ctrl",
                    KeyModifiers::SHIFT => "Shift",
                    _ => return Err(serde::ser::Error::custom("invalid key modifier")),
                };
                format!("{modifier}-{code}").serialize(serializer)
            }
            None => code.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let (modifier, code) = match s.split_once('-') {
            Some((modifier, code)) if !code.is_empty() => (
                Some(match modifier {
                    "Ctrl" => KeyModifiers::CONTROL,
                    "Shift" => KeyModifiers::SHIFT,
                    _ => return Err(serde::de::Error::custom("invalid key modifier")),
                }),
                code,
            ),
            _ => (None, s.as_str()),
        };
        parse_code(code)
            .map(|code| Self(code, modifier))
            .ok_or_else(|| serde::de::Error::custom("invalid key"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GlobalAction {
    Quit,
}

impl From<&GlobalAction> for Action {
    fn from(action: &GlobalAction) -> Self {
        match action {
            GlobalAction::Quit => Action::Quit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ComposerAction {
    NextItem,
    PrevItem,
    Back,
}

impl From<&ComposerAction> for Action {
    fn from(action: &ComposerAction) -> Self {
        match action {
            ComposerAction::NextItem => Action::NextItem,
            ComposerAction::PrevItem => Action::PrevItem,
            ComposerAction::Back => Action::Back,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let config = toml::from_str::<Config>("").expect("failed to deserialize config");
        assert_eq!(config, Config::default());
    }

    #[test]
    fn deserialize() {
        let input = r#"
dev = true

[server]
realm = "https://chat.example.com"
email = "me@example.com"
api_key = "abcdef"

[keybindings.global]
Ctrl-c = "Quit"

[keybindings.composer]
Ctrl-n = "NextItem"
Tab = "NextItem"
Esc = "Back"
"-" = "PrevItem"
"#;
        let config = toml::from_str::<Config>(input).expect("failed to deserialize config");
        assert_eq!(
            config,
            Config {
                server: Some(Auth {
                    realm: String::from("https://chat.example.com"),
                    email: String::from("me@example.com"),
                    api_key: String::from("abcdef"),
                }),
                keybindings: Keybindings {
                    global: HashMap::from_iter([(
                        Key(KeyCode::Char('c'), Some(KeyModifiers::CONTROL)),
                        GlobalAction::Quit
                    )]),
                    composer: HashMap::from_iter([
                        (
                            Key(KeyCode::Char('n'), Some(KeyModifiers::CONTROL)),
                            ComposerAction::NextItem
                        ),
                        (Key(KeyCode::Tab, None), ComposerAction::NextItem),
                        (Key(KeyCode::Esc, None), ComposerAction::Back),
                        (Key(KeyCode::Char('-'), None), ComposerAction::PrevItem),
                    ]),
                },
                dev: true,
            }
        )
    }

    #[test]
    fn invalid_key() {
        let input = r#"
[keybindings.global]
Alt-x = "Quit"
"#;
        assert!(toml::from_str::<Config>(input).is_err());
        let input = r#"
[keybindings.global]
Home = "Quit"
"#;
        assert!(toml::from_str::<Config>(input).is_err());
    }

    #[test]
    fn serialize() {
        let mut config = Config {
            server: None,
            keybindings: Keybindings::default(),
            dev: false,
        };
        config.set_default_keybindings();
        let s = toml::to_string(&config).expect("failed to serialize config");
        let deserialized = toml::from_str::<Config>(&s).expect("failed to deserialize config");
        assert_eq!(deserialized, config);
    }

    #[test]
    fn backtab_ignores_shift() {
        let event = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        assert_eq!(Key::from(event), Key(KeyCode::BackTab, None));
        let event = KeyEvent::new(KeyCode::Char('n'), KeyModifiers::CONTROL);
        assert_eq!(
            Key::from(event),
            Key(KeyCode::Char('n'), Some(KeyModifiers::CONTROL))
        );
    }
}
