use crossterm::event::KeyCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Flip one category by its position in the panel (0-based).
    ToggleIndex(usize),
    ToggleSelected,
    ShowAll,
    NextToggle,
    PreviousToggle,
    ScrollDown,
    ScrollUp,
    /// Append copies of the first items, as a "load more" would.
    Paginate,
    /// Remove the timeline and bring a fresh copy back.
    Navigate,
    Quit,
}

impl Action {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char(c @ '1'..='7') => Some(Action::ToggleIndex(c as usize - '1' as usize)),
            KeyCode::Char(' ') | KeyCode::Enter => Some(Action::ToggleSelected),
            KeyCode::Tab | KeyCode::Char('l') => Some(Action::NextToggle),
            KeyCode::BackTab | KeyCode::Char('h') => Some(Action::PreviousToggle),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::ScrollDown),
            KeyCode::Up | KeyCode::Char('k') => Some(Action::ScrollUp),
            KeyCode::Char('p') => Some(Action::Paginate),
            KeyCode::Char('n') => Some(Action::Navigate),
            KeyCode::Char('a') => Some(Action::ShowAll),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_map_to_panel_positions() {
        assert_eq!(Action::from_key(KeyCode::Char('1')), Some(Action::ToggleIndex(0)));
        assert_eq!(Action::from_key(KeyCode::Char('7')), Some(Action::ToggleIndex(6)));
        assert_eq!(Action::from_key(KeyCode::Char('8')), None);
    }
}
