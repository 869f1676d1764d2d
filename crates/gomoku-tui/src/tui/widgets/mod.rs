// TUI widget modules for each screen and overlay.

pub mod board;
pub mod celebration;
pub mod chat;
pub mod gallery;
pub mod game_info;
pub mod help_bar;
pub mod lobby;
pub mod login;
pub mod modal;
pub mod status_bar;

/// Flatten a test terminal's buffer into newline-separated rows.
#[cfg(test)]
pub(crate) fn buffer_text(terminal: &ratatui::Terminal<ratatui::backend::TestBackend>) -> String {
    let buffer = terminal.backend().buffer();
    let mut out = String::new();
    for y in 0..buffer.area.height {
        for x in 0..buffer.area.width {
            out.push_str(buffer[(x, y)].symbol());
        }
        out.push('\n');
    }
    out
}
