#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
    Other(i16),
}

impl PointerButton {
    /// Maps a DOM `MouseEvent.button` code.
    pub fn from_dom(code: i16) -> Self {
        match code {
            0 => PointerButton::Primary,
            1 => PointerButton::Auxiliary,
            2 => PointerButton::Secondary,
            other => PointerButton::Other(other),
        }
    }
}

/// Click delivered by the host page, consumed once.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerEvent {
    pub x: f64,
    pub y: f64,
    /// Option on macOS, Alt elsewhere.
    pub alt_key: bool,
    pub button: PointerButton,
}

impl TriggerEvent {
    pub fn new(x: f64, y: f64, alt_key: bool, button: PointerButton) -> Self {
        Self {
            x,
            y,
            alt_key,
            button,
        }
    }

    pub fn qualifies(&self) -> bool {
        self.alt_key && self.button == PointerButton::Primary
    }

    /// Whether the host adapter must prevent the page's default action and
    /// stop propagation for this click.
    pub fn suppresses_default(&self) -> bool {
        self.qualifies()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other,
}

impl Key {
    /// Maps a DOM `KeyboardEvent.key` value.
    pub fn from_dom(key: &str) -> Self {
        if key == "Escape" {
            Key::Escape
        } else {
            Key::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_alt_primary_click_qualifies() {
        let cases = [
            (true, PointerButton::Primary, true),
            (false, PointerButton::Primary, false),
            (true, PointerButton::Secondary, false),
            (true, PointerButton::Auxiliary, false),
            (true, PointerButton::Other(4), false),
        ];
        for (alt, button, expected) in cases {
            let event = TriggerEvent::new(10.0, 10.0, alt, button);
            assert_eq!(event.qualifies(), expected, "{event:?}");
            assert_eq!(event.suppresses_default(), expected);
        }
    }

    #[test]
    fn dom_codes_map_to_buttons_and_keys() {
        assert_eq!(PointerButton::from_dom(0), PointerButton::Primary);
        assert_eq!(PointerButton::from_dom(2), PointerButton::Secondary);
        assert_eq!(PointerButton::from_dom(3), PointerButton::Other(3));
        assert_eq!(Key::from_dom("Escape"), Key::Escape);
        assert_eq!(Key::from_dom("Esc"), Key::Other);
    }
}
