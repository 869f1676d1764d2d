// Keyboard and mouse input handling.
//
// Translates crossterm events into UserCommand messages for the app
// orchestrator, or into local ViewState mutations (cursor movement, form
// editing, selection).

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use gomoku_core::board::{Cell, BOARD_SIZE};

use super::layout::build_layout;
use super::widgets::board;
use super::{LoginField, Prompt, PromptKind, ViewState};
use crate::protocol::{Screen, UserCommand};

/// Chat lines moved per PageUp/PageDown.
const CHAT_PAGE: usize = 5;

/// Handle a keyboard event.
///
/// Returns `Some(UserCommand)` when the key press should be forwarded to the
/// app orchestrator. Returns `None` when it was handled locally.
pub fn handle_key(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    // Only process key press events. On Windows, crossterm emits both
    // Press and Release events for each physical keypress.
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    // Ctrl+C always quits immediately regardless of mode
    if key_event.modifiers.contains(KeyModifiers::CONTROL) && key_event.code == KeyCode::Char('c') {
        return Some(UserCommand::Quit);
    }

    if view_state.confirm_quit {
        return handle_confirm_quit(key_event, view_state);
    }

    // An open alert swallows everything until dismissed.
    if view_state.alert.is_some() {
        if matches!(key_event.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            view_state.alert = None;
        }
        return None;
    }

    if view_state.prompt.is_some() {
        return handle_prompt(key_event, view_state);
    }

    match view_state.screen {
        Screen::Login => handle_login(key_event, view_state),
        Screen::Lobby => handle_lobby(key_event, view_state),
        Screen::Game => handle_game(key_event, view_state),
        Screen::Gallery => handle_gallery(key_event, view_state),
    }
}

/// Handle a mouse event. Only left clicks on the game board do anything.
///
/// `area` is the whole terminal, used to find where the board was drawn.
pub fn handle_mouse(mouse_event: MouseEvent, view_state: &mut ViewState, area: Rect) -> Option<UserCommand> {
    if mouse_event.kind != MouseEventKind::Down(MouseButton::Left) {
        return None;
    }
    if view_state.screen != Screen::Game || view_state.alert.is_some() || view_state.confirm_quit {
        return None;
    }

    let inner = board::inner(build_layout(area).board);
    if !inner.contains(Position::new(mouse_event.column, mouse_event.row)) {
        return None;
    }
    let cell = board::cell_at(inner, mouse_event.column, mouse_event.row);
    if let Some(cell) = cell {
        view_state.cursor = cell;
    }
    Some(UserCommand::PlaceStone(cell))
}

/// y/q confirm, n/Esc cancel, everything else is blocked.
fn handle_confirm_quit(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Char('q') | KeyCode::Char('Q') => Some(UserCommand::Quit),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            view_state.confirm_quit = false;
            None
        }
        _ => None,
    }
}

fn handle_prompt(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let prompt = view_state.prompt.as_mut()?;
    match key_event.code {
        KeyCode::Esc => {
            view_state.prompt = None;
            None
        }
        KeyCode::Backspace => {
            prompt.text.pop();
            None
        }
        KeyCode::Char(c) => {
            prompt.text.push(c);
            None
        }
        KeyCode::Enter => {
            let text = std::mem::take(&mut prompt.text);
            let kind = prompt.kind;
            // The chat prompt stays open for the next line.
            if kind != PromptKind::Chat {
                view_state.prompt = None;
            }
            Some(match kind {
                PromptKind::RoomName => UserCommand::CreateRoom(text),
                PromptKind::Chat => UserCommand::SendChat(text),
                PromptKind::UploadPath => UserCommand::UploadImage(PathBuf::from(text.trim())),
                PromptKind::LinkUrl => UserCommand::LinkImage(text),
            })
        }
        _ => None,
    }
}

fn handle_login(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    let field = match view_state.login_focus {
        LoginField::Nickname => &mut view_state.login_nickname,
        LoginField::SkinPath => &mut view_state.login_skin,
    };
    match key_event.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            view_state.login_focus = match view_state.login_focus {
                LoginField::Nickname => LoginField::SkinPath,
                LoginField::SkinPath => LoginField::Nickname,
            };
            None
        }
        KeyCode::Backspace => {
            field.pop();
            None
        }
        KeyCode::Char('t') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(UserCommand::ToggleTheme)
        }
        KeyCode::Char(c) => {
            field.push(c);
            None
        }
        // One login at a time; the app answers with a screen change or an alert.
        KeyCode::Enter if view_state.login_pending => None,
        KeyCode::Enter => {
            view_state.login_pending = true;
            let skin = view_state.login_skin.trim();
            Some(UserCommand::Login {
                nickname: view_state.login_nickname.clone(),
                skin_path: (!skin.is_empty()).then(|| PathBuf::from(skin)),
            })
        }
        KeyCode::Esc => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_lobby(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.selected_room = view_state.selected_room.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view_state.selected_room + 1 < view_state.rooms.len() {
                view_state.selected_room += 1;
            }
            None
        }
        KeyCode::Enter => view_state.selected_room().map(|room| UserCommand::JoinRoom {
            room_id: room.room_id.clone(),
            room_name: room.room_name.clone(),
        }),
        KeyCode::Char('r') => Some(UserCommand::RefreshRooms),
        KeyCode::Char('c') => {
            view_state.prompt = Some(Prompt::new(PromptKind::RoomName));
            None
        }
        KeyCode::Char('g') => Some(UserCommand::OpenGallery),
        KeyCode::Char('t') => Some(UserCommand::ToggleTheme),
        KeyCode::Char('q') | KeyCode::Esc => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_game(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => move_cursor(view_state, -1, 0),
        KeyCode::Down | KeyCode::Char('j') => move_cursor(view_state, 1, 0),
        KeyCode::Left | KeyCode::Char('h') => move_cursor(view_state, 0, -1),
        KeyCode::Right | KeyCode::Char('l') => move_cursor(view_state, 0, 1),
        KeyCode::Enter | KeyCode::Char(' ') => Some(UserCommand::PlaceStone(Some(view_state.cursor))),
        KeyCode::Char('i') | KeyCode::Char('/') => {
            view_state.prompt = Some(Prompt::new(PromptKind::Chat));
            None
        }
        KeyCode::PageUp => {
            let max = view_state.chat.len().saturating_sub(1);
            view_state.chat_scroll = (view_state.chat_scroll + CHAT_PAGE).min(max);
            None
        }
        KeyCode::PageDown => {
            view_state.chat_scroll = view_state.chat_scroll.saturating_sub(CHAT_PAGE);
            None
        }
        KeyCode::Char('s') => Some(UserCommand::StartGame),
        KeyCode::Char('x') => Some(UserCommand::ExitRoom),
        KeyCode::Char('t') => Some(UserCommand::ToggleTheme),
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

fn handle_gallery(key_event: KeyEvent, view_state: &mut ViewState) -> Option<UserCommand> {
    match key_event.code {
        KeyCode::Up | KeyCode::Char('k') => {
            view_state.selected_image = view_state.selected_image.saturating_sub(1);
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if view_state.selected_image + 1 < view_state.images.len() {
                view_state.selected_image += 1;
            }
            None
        }
        KeyCode::Enter => view_state
            .selected_image()
            .map(|image| UserCommand::UseSkin(image.url.clone())),
        KeyCode::Char('s') => view_state.selected_image().map(|image| UserCommand::StarImage(image.id)),
        KeyCode::Char('d') => view_state.selected_image().map(|image| UserCommand::DeleteImage(image.id)),
        KeyCode::Char('u') => {
            view_state.prompt = Some(Prompt::new(PromptKind::UploadPath));
            None
        }
        KeyCode::Char('l') => {
            view_state.prompt = Some(Prompt::new(PromptKind::LinkUrl));
            None
        }
        KeyCode::Char('r') => Some(UserCommand::OpenGallery),
        KeyCode::Char('t') => Some(UserCommand::ToggleTheme),
        KeyCode::Esc | KeyCode::Char('b') => Some(UserCommand::CloseGallery),
        KeyCode::Char('q') => {
            view_state.confirm_quit = true;
            None
        }
        _ => None,
    }
}

/// Move the board cursor, stopping at the edges.
fn move_cursor(view_state: &mut ViewState, d_row: i64, d_col: i64) -> Option<UserCommand> {
    let Cell { row, col } = view_state.cursor;
    let last = BOARD_SIZE as i64 - 1;
    let row = (row as i64 + d_row).clamp(0, last);
    let col = (col as i64 + d_col).clamp(0, last);
    if let Some(cell) = Cell::checked(row, col) {
        view_state.cursor = cell;
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use gomoku_core::message::{ImageInfo, RoomSummary};

    use crate::protocol::UiUpdate;
    use crate::tui::apply_ui_update;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn ctrl_key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::CONTROL,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    fn click(column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn type_text(state: &mut ViewState, text: &str) {
        for c in text.chars() {
            handle_key(key(KeyCode::Char(c)), state);
        }
    }

    fn on(screen: Screen) -> ViewState {
        ViewState {
            screen,
            ..ViewState::default()
        }
    }

    fn area() -> Rect {
        Rect::new(0, 0, 120, 30)
    }

    // -- Global --

    #[test]
    fn ctrl_c_always_quits() {
        let mut state = on(Screen::Login);
        state.alert = Some("x".into());
        assert_eq!(handle_key(ctrl_key(KeyCode::Char('c')), &mut state), Some(UserCommand::Quit));
    }

    #[test]
    fn release_events_ignored() {
        let mut state = on(Screen::Lobby);
        let mut ev = key(KeyCode::Char('r'));
        ev.kind = KeyEventKind::Release;
        assert_eq!(handle_key(ev, &mut state), None);
    }

    #[test]
    fn alert_blocks_until_dismissed() {
        let mut state = on(Screen::Lobby);
        state.alert = Some("Enter a room name.".into());
        assert_eq!(handle_key(key(KeyCode::Char('r')), &mut state), None);
        assert!(state.alert.is_some());
        handle_key(key(KeyCode::Enter), &mut state);
        assert!(state.alert.is_none());
    }

    #[test]
    fn quit_needs_confirmation() {
        let mut state = on(Screen::Lobby);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), None);
        assert!(state.confirm_quit);
        assert_eq!(handle_key(key(KeyCode::Char('n')), &mut state), None);
        assert!(!state.confirm_quit);

        handle_key(key(KeyCode::Char('q')), &mut state);
        assert_eq!(handle_key(key(KeyCode::Char('y')), &mut state), Some(UserCommand::Quit));
    }

    // -- Login --

    #[test]
    fn login_form_submits_both_fields() {
        let mut state = on(Screen::Login);
        type_text(&mut state, "alice");
        handle_key(key(KeyCode::Tab), &mut state);
        type_text(&mut state, " me.png ");

        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::Login {
                nickname: "alice".into(),
                skin_path: Some(PathBuf::from("me.png")),
            })
        );
    }

    #[test]
    fn login_without_skin_sends_none() {
        let mut state = on(Screen::Login);
        type_text(&mut state, "bob");
        handle_key(key(KeyCode::Backspace), &mut state);
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::Login {
                nickname: "bo".into(),
                skin_path: None,
            })
        );
    }

    #[test]
    fn login_typing_q_does_not_quit() {
        let mut state = on(Screen::Login);
        assert_eq!(handle_key(key(KeyCode::Char('q')), &mut state), None);
        assert!(!state.confirm_quit);
        assert_eq!(state.login_nickname, "q");
    }

    #[test]
    fn login_ctrl_t_toggles_theme_but_t_types() {
        let mut state = on(Screen::Login);
        assert_eq!(handle_key(key(KeyCode::Char('t')), &mut state), None);
        assert_eq!(state.login_nickname, "t");
        assert_eq!(
            handle_key(ctrl_key(KeyCode::Char('t')), &mut state),
            Some(UserCommand::ToggleTheme)
        );
        assert_eq!(state.login_nickname, "t");
    }

    #[test]
    fn login_enter_ignored_until_app_answers() {
        let mut state = on(Screen::Login);
        type_text(&mut state, "alice");
        handle_key(key(KeyCode::Tab), &mut state);
        type_text(&mut state, "me.png");

        assert!(matches!(handle_key(key(KeyCode::Enter), &mut state), Some(UserCommand::Login { .. })));
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), None);

        // A failed login comes back as an alert, which re-arms the form.
        apply_ui_update(&mut state, UiUpdate::Alert("Enter a nickname.".into()));
        handle_key(key(KeyCode::Enter), &mut state);
        assert!(matches!(handle_key(key(KeyCode::Enter), &mut state), Some(UserCommand::Login { .. })));
    }

    // -- Lobby --

    #[test]
    fn lobby_join_selected_room() {
        let mut state = on(Screen::Lobby);
        state.rooms = vec![
            RoomSummary {
                room_id: "a".into(),
                room_name: "First".into(),
                playing: false,
                users: vec![],
            },
            RoomSummary {
                room_id: "b".into(),
                room_name: "Second".into(),
                playing: true,
                users: vec![],
            },
        ];
        handle_key(key(KeyCode::Down), &mut state);
        handle_key(key(KeyCode::Down), &mut state);
        assert_eq!(state.selected_room, 1);
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::JoinRoom {
                room_id: "b".into(),
                room_name: "Second".into(),
            })
        );
    }

    #[test]
    fn lobby_enter_without_rooms_does_nothing() {
        let mut state = on(Screen::Lobby);
        assert_eq!(handle_key(key(KeyCode::Enter), &mut state), None);
    }

    #[test]
    fn create_room_prompt() {
        let mut state = on(Screen::Lobby);
        handle_key(key(KeyCode::Char('c')), &mut state);
        type_text(&mut state, "Duel");
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::CreateRoom("Duel".into()))
        );
        assert!(state.prompt.is_none());
    }

    // -- Game --

    #[test]
    fn cursor_moves_and_clamps() {
        let mut state = on(Screen::Game);
        state.cursor = Cell::new(0, 14);
        handle_key(key(KeyCode::Up), &mut state);
        handle_key(key(KeyCode::Right), &mut state);
        assert_eq!(state.cursor, Cell::new(0, 14));
        handle_key(key(KeyCode::Char('h')), &mut state);
        handle_key(key(KeyCode::Char('j')), &mut state);
        assert_eq!(state.cursor, Cell::new(1, 13));
    }

    #[test]
    fn enter_places_at_cursor() {
        let mut state = on(Screen::Game);
        state.cursor = Cell::new(3, 4);
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::PlaceStone(Some(Cell::new(3, 4))))
        );
    }

    #[test]
    fn chat_prompt_stays_open() {
        let mut state = on(Screen::Game);
        handle_key(key(KeyCode::Char('i')), &mut state);
        type_text(&mut state, "gg");
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::SendChat("gg".into()))
        );
        assert_eq!(state.prompt, Some(Prompt::new(PromptKind::Chat)));
        handle_key(key(KeyCode::Esc), &mut state);
        assert!(state.prompt.is_none());
    }

    #[test]
    fn game_shortcuts() {
        let mut state = on(Screen::Game);
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut state), Some(UserCommand::StartGame));
        assert_eq!(handle_key(key(KeyCode::Char('x')), &mut state), Some(UserCommand::ExitRoom));
        assert_eq!(handle_key(key(KeyCode::Char('t')), &mut state), Some(UserCommand::ToggleTheme));
    }

    #[test]
    fn click_on_intersection_places_stone() {
        let mut state = on(Screen::Game);
        let inner = board::inner(build_layout(area()).board);
        // Row 2, column 4: x = 1 + 4 * 3
        let cmd = handle_mouse(click(inner.x + 13, inner.y + 2), &mut state, area());
        assert_eq!(cmd, Some(UserCommand::PlaceStone(Some(Cell::new(2, 4)))));
        assert_eq!(state.cursor, Cell::new(2, 4));
    }

    #[test]
    fn click_between_intersections_snaps_to_nearest() {
        let mut state = on(Screen::Game);
        let inner = board::inner(build_layout(area()).board);
        // x offset 2 is 1/3 of the way from column 0 to column 1.
        let cmd = handle_mouse(click(inner.x + 2, inner.y), &mut state, area());
        assert_eq!(cmd, Some(UserCommand::PlaceStone(Some(Cell::new(0, 0)))));
        // x offset 3 is 2/3 of the way, which rounds to column 1.
        let cmd = handle_mouse(click(inner.x + 3, inner.y), &mut state, area());
        assert_eq!(cmd, Some(UserCommand::PlaceStone(Some(Cell::new(0, 1)))));
    }

    #[test]
    fn click_outside_board_ignored() {
        let mut state = on(Screen::Game);
        assert_eq!(handle_mouse(click(110, 5), &mut state, area()), None);
        assert_eq!(handle_mouse(click(0, 0), &mut state, area()), None);
    }

    #[test]
    fn click_ignored_off_game_screen() {
        let mut state = on(Screen::Lobby);
        let inner = board::inner(build_layout(area()).board);
        assert_eq!(handle_mouse(click(inner.x + 1, inner.y), &mut state, area()), None);
    }

    // -- Gallery --

    #[test]
    fn gallery_actions_use_selected_image() {
        let mut state = on(Screen::Gallery);
        state.images = vec![ImageInfo {
            id: 42,
            url: "/img/cat.png".into(),
            username: Some("alice".into()),
            starred: false,
            original_name: Some("cat.png".into()),
        }];
        assert_eq!(handle_key(key(KeyCode::Char('s')), &mut state), Some(UserCommand::StarImage(42)));
        assert_eq!(handle_key(key(KeyCode::Char('d')), &mut state), Some(UserCommand::DeleteImage(42)));
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::UseSkin("/img/cat.png".into()))
        );
        assert_eq!(handle_key(key(KeyCode::Esc), &mut state), Some(UserCommand::CloseGallery));
    }

    #[test]
    fn gallery_link_prompt() {
        let mut state = on(Screen::Gallery);
        handle_key(key(KeyCode::Char('l')), &mut state);
        type_text(&mut state, "https://x.test/a.png");
        assert_eq!(
            handle_key(key(KeyCode::Enter), &mut state),
            Some(UserCommand::LinkImage("https://x.test/a.png".into()))
        );
    }
}
