//! Heads-up display state: message log, money and mission countdown.
//!
//! Layout and text rendering belong to the host; this module only keeps the
//! state a renderer needs and formats message templates.

use serde::{Deserialize, Serialize};

/// How long a message stays in the log, in seconds.
pub const MESSAGE_TIME: f32 = 10.0;

/// Message colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colour {
    #[default]
    Cyan,
    Gold,
    Green,
    White,
    Red,
    Yellow,
    Grey,
}

impl Colour {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Colour::Cyan => (24, 100, 97),
            Colour::Gold => (212, 170, 0),
            Colour::Green => (0, 128, 0),
            Colour::White => (255, 255, 255),
            Colour::Red => (128, 0, 0),
            Colour::Yellow => (255, 255, 0),
            Colour::Grey => (128, 128, 128),
        }
    }
}

/// One line in the message log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub colour: Colour,
    /// Seconds since the message was posted.
    pub age: f32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Hud {
    messages: Vec<Message>,
    money: i64,
    countdown: Option<i32>,
}

impl Hud {
    pub fn append_message(&mut self, text: impl Into<String>, colour: Colour) {
        self.messages.push(Message {
            text: text.into(),
            colour,
            age: 0.0,
        });
    }

    pub fn clear_messages(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Age messages and drop the expired ones.
    pub fn update(&mut self, dt: f32) {
        for m in &mut self.messages {
            m.age += dt;
        }
        self.messages.retain(|m| m.age < MESSAGE_TIME);
    }

    pub fn set_money(&mut self, money: i64) {
        self.money = money;
    }

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn set_countdown(&mut self, seconds: i32) {
        self.countdown = Some(seconds);
    }

    pub fn clear_countdown(&mut self) {
        self.countdown = None;
    }

    pub fn countdown(&self) -> Option<i32> {
        self.countdown
    }

    /// Countdown as `m:ss`.
    pub fn countdown_text(&self) -> Option<String> {
        self.countdown
            .map(|s| format!("{}:{:02}", s.max(0) / 60, s.max(0) % 60))
    }
}

/// Expand `{key}` placeholders in `template`.
///
/// Keys the lookup does not know are left in place, braces included.
pub fn format_message<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match lookup(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(key: &str) -> Option<String> {
        match key {
            "name" => Some("Cutter 1".to_string()),
            "control" => Some("Moonbase Apollo".to_string()),
            "astronaut.name" => Some("Sally".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_format_placeholders() {
        assert_eq!(
            format_message("{control}: Stand by {name}.", lookup),
            "Moonbase Apollo: Stand by Cutter 1."
        );
        assert_eq!(format_message("This is {astronaut.name}.", lookup), "This is Sally.");
    }

    #[test]
    fn test_format_unknown_and_unterminated() {
        assert_eq!(format_message("{nobody} waves", lookup), "{nobody} waves");
        assert_eq!(format_message("open { brace", lookup), "open { brace");
        assert_eq!(format_message("no placeholders", lookup), "no placeholders");
    }

    #[test]
    fn test_messages_expire() {
        let mut hud = Hud::default();
        hud.append_message("first", Colour::Cyan);
        hud.update(6.0);
        hud.append_message("second", Colour::Red);
        hud.update(5.0);
        assert_eq!(hud.messages().len(), 1);
        assert_eq!(hud.messages()[0].text, "second");
    }

    #[test]
    fn test_countdown_text() {
        let mut hud = Hud::default();
        assert_eq!(hud.countdown_text(), None);
        hud.set_countdown(125);
        assert_eq!(hud.countdown_text().as_deref(), Some("2:05"));
        hud.clear_countdown();
        assert_eq!(hud.countdown(), None);
    }
}
