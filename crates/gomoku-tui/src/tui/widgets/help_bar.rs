// Help bar widget: key hints for the active screen.

use ratatui::layout::Rect;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::protocol::Screen;
use crate::tui::ViewState;

pub fn render(frame: &mut Frame, area: Rect, state: &ViewState) {
    let text = hint_text(state);
    let paragraph = Paragraph::new(text).style(state.palette().bar());
    frame.render_widget(paragraph, area);
}

/// Key hints for whatever currently has the keyboard.
pub fn hint_text(state: &ViewState) -> &'static str {
    if state.confirm_quit {
        return " y:Quit | n:Cancel";
    }
    if state.alert.is_some() {
        return " Enter:Dismiss";
    }
    if state.prompt.is_some() {
        return " Enter:Submit | Esc:Cancel";
    }
    match state.screen {
        Screen::Login => " Tab:Switch field | Enter:Log in | Ctrl+T:Theme | Esc:Quit",
        Screen::Lobby => " ↑↓:Select | Enter:Join | c:Create | r:Refresh | g:Gallery | t:Theme | q:Quit",
        Screen::Game => {
            " ←↑↓→:Move | Enter:Place | Click:Place | i:Chat | s:Start | x:Exit | PgUp/PgDn:Scroll | t:Theme | q:Quit"
        }
        Screen::Gallery => " ↑↓:Select | Enter:Use skin | s:Star | d:Delete | u:Upload | l:Link | r:Refresh | t:Theme | Esc:Back",
    }
}
