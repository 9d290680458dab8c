//! Application screen state management
//!
//! Handles transitions between the client's screens:
//! - Lobby (create or join a room)
//! - Waiting for an opponent
//! - Playing a round
//! - Leave confirmation
//! - Game over
//! - Connection error
//!
//! The coordinator owns the session; screens carry only UI-local state such
//! as the room-id input or the grid cursor. Phase changes always come from
//! the session, which in turn only moves on server pushes.

use crate::board::CellPos;
use crate::session::{ClientSession, Phase};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::time::Instant;

/// Smallest selectable round count.
pub const MIN_ROUNDS: u32 = 1;

/// Largest selectable round count.
pub const MAX_ROUNDS: u32 = 10;

/// Preselected round count in the lobby.
pub const DEFAULT_ROUNDS: u32 = 5;

/// Maximum length of the room-id input.
const ROOM_INPUT_MAX: usize = 12;

/// Action on the lobby screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyAction {
    CreateRoom,
    JoinRoom,
}

impl LobbyAction {
    /// Get all lobby actions in order
    pub fn all() -> &'static [LobbyAction] {
        &[LobbyAction::CreateRoom, LobbyAction::JoinRoom]
    }

    /// Get the display label for this action
    pub fn label(&self) -> &'static str {
        match self {
            LobbyAction::CreateRoom => "Create Room",
            LobbyAction::JoinRoom => "Join Room",
        }
    }
}

/// The current application screen
pub enum Screen {
    /// Create/join form
    Lobby {
        selected: usize,
        room_input: String,
        editing_room: bool,
        rounds: u32,
    },
    /// Room created, waiting for an opponent to join
    Waiting,
    /// In a round
    Playing {
        cursor: CellPos,
        /// Last cell a mouse drag passed through, so holding still does not
        /// re-toggle it
        last_drag: Option<CellPos>,
    },
    /// Confirmation before leaving (ends the match for everyone)
    ConfirmLeave,
    /// Match finished
    GameOver,
    /// Connection failure
    Error { message: String },
}

/// Main application coordinator
pub struct AppCoordinator {
    /// The client session (phase machine + board + selection)
    pub session: ClientSession,
    /// Current screen
    pub screen: Screen,
    /// Whether the application should quit
    pub should_quit: bool,
}

impl AppCoordinator {
    /// Create a new app coordinator starting at the lobby
    pub fn new(session: ClientSession) -> Self {
        Self {
            session,
            screen: lobby_screen(),
            should_quit: false,
        }
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Apply one server push and reconcile the screen with the new phase.
    pub fn on_server_message(&mut self, msg: crate::network::ServerMessage) {
        self.session.handle_message(msg);
        self.sync_screen();
    }

    /// Advance session timers (rejoin delay, selection idle timeout).
    pub fn tick(&mut self, now: Instant) {
        self.session.tick(now);
        self.sync_screen();
    }

    /// Show the connection-error screen (terminal state for this process).
    pub fn set_error(&mut self, message: String) {
        if !matches!(self.screen, Screen::Error { .. }) {
            self.screen = Screen::Error { message };
        }
    }

    /// Bring the screen in line with the session phase. UI-only screens
    /// (the leave confirmation) survive as long as their phase does; the
    /// error screen always survives.
    fn sync_screen(&mut self) {
        if matches!(self.screen, Screen::Error { .. }) {
            return;
        }
        match self.session.phase() {
            Phase::Lobby => {
                if !matches!(self.screen, Screen::Lobby { .. }) {
                    self.screen = lobby_screen();
                }
            }
            Phase::Waiting => {
                if matches!(self.screen, Screen::Lobby { .. } | Screen::GameOver) {
                    self.screen = Screen::Waiting;
                }
            }
            Phase::Playing => {
                if !matches!(self.screen, Screen::Playing { .. } | Screen::ConfirmLeave) {
                    self.screen = playing_screen();
                }
            }
            Phase::GameOver => {
                if !matches!(self.screen, Screen::GameOver) {
                    self.screen = Screen::GameOver;
                }
            }
        }
    }

    // --- Lobby input ---

    /// Lobby navigation (up)
    pub fn lobby_up(&mut self) {
        if let Screen::Lobby {
            selected,
            editing_room,
            ..
        } = &mut self.screen
        {
            if !*editing_room && *selected > 0 {
                *selected -= 1;
            }
        }
    }

    /// Lobby navigation (down)
    pub fn lobby_down(&mut self) {
        if let Screen::Lobby {
            selected,
            editing_room,
            ..
        } = &mut self.screen
        {
            if !*editing_room && *selected < LobbyAction::all().len() - 1 {
                *selected += 1;
            }
        }
    }

    /// Decrease the requested round count
    pub fn lobby_left(&mut self) {
        if let Screen::Lobby { rounds, .. } = &mut self.screen {
            if *rounds > MIN_ROUNDS {
                *rounds -= 1;
            }
        }
    }

    /// Increase the requested round count
    pub fn lobby_right(&mut self) {
        if let Screen::Lobby { rounds, .. } = &mut self.screen {
            if *rounds < MAX_ROUNDS {
                *rounds += 1;
            }
        }
    }

    /// Handle Tab key to toggle room-id editing
    pub fn lobby_tab(&mut self) {
        if let Screen::Lobby { editing_room, .. } = &mut self.screen {
            *editing_room = !*editing_room;
        }
    }

    /// Handle character input (for the room-id field)
    pub fn lobby_char(&mut self, c: char) {
        if let Screen::Lobby {
            room_input,
            editing_room,
            ..
        } = &mut self.screen
        {
            if *editing_room && room_input.len() < ROOM_INPUT_MAX {
                room_input.push(c);
            }
        }
    }

    /// Handle backspace (for the room-id field)
    pub fn lobby_backspace(&mut self) {
        if let Screen::Lobby {
            room_input,
            editing_room,
            ..
        } = &mut self.screen
        {
            if *editing_room {
                room_input.pop();
            }
        }
    }

    /// Handle lobby selection (Enter)
    pub fn lobby_select(&mut self) {
        let (selected, room_input, rounds) = match &mut self.screen {
            Screen::Lobby {
                selected,
                room_input,
                editing_room,
                rounds,
            } => {
                if *editing_room {
                    // Finish editing the room id
                    *editing_room = false;
                    return;
                }
                (*selected, room_input.clone(), *rounds)
            }
            _ => return,
        };

        match LobbyAction::all()[selected] {
            LobbyAction::CreateRoom => self.session.create_room(rounds),
            LobbyAction::JoinRoom => self.session.join_room(&room_input, false),
        }
        // Phase changes arrive with the server's answer; nothing to do here.
    }

    // --- Playing input ---

    /// Move the grid cursor, clamped to the board.
    pub fn move_cursor(&mut self, dr: isize, dc: isize) {
        let (rows, cols) = match self.session.board() {
            Some(board) => (board.rows(), board.cols()),
            None => return,
        };
        if let Screen::Playing { cursor, .. } = &mut self.screen {
            let r = cursor.r as isize + dr;
            let c = cursor.c as isize + dc;
            if r >= 0 && (r as usize) < rows && c >= 0 && (c as usize) < cols {
                cursor.r = r as usize;
                cursor.c = c as usize;
            }
        }
    }

    /// Toggle the cell under the cursor (keyboard selection).
    pub fn select_at_cursor(&mut self, now: Instant) {
        if let Screen::Playing { cursor, .. } = &self.screen {
            let pos = *cursor;
            self.session.handle_select(pos, now);
        }
    }

    /// Primary pointer pressed on a cell.
    pub fn mouse_down(&mut self, pos: CellPos, now: Instant) {
        if let Screen::Playing { last_drag, cursor } = &mut self.screen {
            *last_drag = Some(pos);
            *cursor = pos;
            self.session.handle_select(pos, now);
        }
    }

    /// Pointer dragged while pressed; toggles only on entering a new cell.
    pub fn mouse_drag(&mut self, pos: CellPos, now: Instant) {
        if let Screen::Playing { last_drag, cursor } = &mut self.screen {
            if *last_drag == Some(pos) {
                return;
            }
            *last_drag = Some(pos);
            *cursor = pos;
            self.session.handle_select(pos, now);
        }
    }

    /// Pointer released; the next press starts a new drag.
    pub fn mouse_up(&mut self) {
        if let Screen::Playing { last_drag, .. } = &mut self.screen {
            *last_drag = None;
        }
    }

    // --- Leave flow ---

    /// Ask for confirmation before leaving the room.
    pub fn request_leave(&mut self) {
        if matches!(self.screen, Screen::Waiting | Screen::Playing { .. }) {
            self.screen = Screen::ConfirmLeave;
        }
    }

    /// Confirmed: notify the server. The session resets when the server's
    /// `player_left` push comes back.
    pub fn confirm_leave(&mut self) {
        self.session.leave_game();
        self.restore_phase_screen();
    }

    /// Declined: back to where we were.
    pub fn cancel_leave(&mut self) {
        self.restore_phase_screen();
    }

    fn restore_phase_screen(&mut self) {
        self.screen = match self.session.phase() {
            Phase::Waiting => Screen::Waiting,
            Phase::Playing => playing_screen(),
            Phase::GameOver => Screen::GameOver,
            Phase::Lobby => lobby_screen(),
        };
    }

    // --- Game over ---

    /// Any key on the game-over screen returns to a clean lobby.
    pub fn dismiss_game_over(&mut self) {
        self.session.return_to_lobby();
        self.screen = lobby_screen();
    }
}

fn lobby_screen() -> Screen {
    Screen::Lobby {
        selected: 0,
        room_input: String::new(),
        editing_room: false,
        rounds: DEFAULT_ROUNDS,
    }
}

fn playing_screen() -> Screen {
    Screen::Playing {
        cursor: CellPos { r: 0, c: 0 },
        last_drag: None,
    }
}

static THEME_ICONS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("animals", "🦁"),
        ("space", "🚀"),
        ("tech", "💻"),
        ("food", "🍔"),
        ("sports", "⚽"),
        ("music", "🎸"),
        ("movies", "🎬"),
        ("travel", "✈️"),
        ("school", "📚"),
        ("nature", "🌲"),
        ("colors", "🎨"),
        ("countries", "🌍"),
        ("jobs", "💼"),
        ("weather", "☀️"),
        ("house", "🏠"),
        ("clothes", "👕"),
        ("body", "👀"),
        ("fruit", "🍎"),
        ("pirate", "🏴‍☠️"),
        ("cars", "🚗"),
    ])
});

/// Icon shown next to the round theme. Unknown themes get a box, a missing
/// theme gets the die.
pub fn theme_icon(theme: Option<&str>) -> &'static str {
    match theme {
        None => "🎲",
        Some(t) => THEME_ICONS
            .get(t.to_lowercase().as_str())
            .copied()
            .unwrap_or("📦"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::protocol::ServerMessage;
    use crate::network::ClientMessage;
    use crate::storage::Storage;

    fn coordinator() -> AppCoordinator {
        AppCoordinator::new(ClientSession::new(Storage::open_in_memory().unwrap()))
    }

    fn pos(r: usize, c: usize) -> CellPos {
        CellPos { r, c }
    }

    fn start_playing(app: &mut AppCoordinator) {
        app.session.join_room("4217", false);
        app.session.take_outbox();
        app.on_server_message(ServerMessage::GameStart {
            grid: vec![
                vec!['C', 'A', 'T'],
                vec!['X', 'X', 'X'],
                vec!['X', 'X', 'X'],
            ],
            words: vec!["CAT".to_string()],
            scores: vec![],
            theme: None,
            current_round: 1,
            total_rounds: 5,
            found_history: vec![],
        });
    }

    #[test]
    fn test_lobby_create_emits_with_selected_rounds() {
        let mut app = coordinator();
        app.lobby_right(); // 6
        app.lobby_right(); // 7
        app.lobby_select();
        let outbox = app.session.take_outbox();
        assert!(matches!(
            &outbox[0],
            ClientMessage::CreateRoom { rounds: 7, .. }
        ));
    }

    #[test]
    fn test_lobby_rounds_stay_in_range() {
        let mut app = coordinator();
        for _ in 0..20 {
            app.lobby_left();
        }
        if let Screen::Lobby { rounds, .. } = &app.screen {
            assert_eq!(*rounds, MIN_ROUNDS);
        } else {
            panic!("expected lobby screen");
        }
        for _ in 0..20 {
            app.lobby_right();
        }
        if let Screen::Lobby { rounds, .. } = &app.screen {
            assert_eq!(*rounds, MAX_ROUNDS);
        } else {
            panic!("expected lobby screen");
        }
    }

    #[test]
    fn test_lobby_join_uses_typed_room_id() {
        let mut app = coordinator();
        app.lobby_down(); // Join Room
        app.lobby_tab();
        for c in "4217".chars() {
            app.lobby_char(c);
        }
        app.lobby_tab();
        app.lobby_select();
        let outbox = app.session.take_outbox();
        assert!(matches!(
            &outbox[0],
            ClientMessage::JoinRoom { room_id, .. } if room_id == "4217"
        ));
    }

    #[test]
    fn test_typing_only_lands_in_input_while_editing() {
        let mut app = coordinator();
        app.lobby_char('7');
        if let Screen::Lobby { room_input, .. } = &app.screen {
            assert!(room_input.is_empty());
        }
        app.lobby_tab();
        app.lobby_char('7');
        if let Screen::Lobby { room_input, .. } = &app.screen {
            assert_eq!(room_input, "7");
        }
    }

    #[test]
    fn test_screen_follows_phase_transitions() {
        let mut app = coordinator();
        app.session.create_room(5);
        app.on_server_message(ServerMessage::RoomCreated {
            room_id: "4217".to_string(),
            theme: None,
        });
        assert!(matches!(app.screen, Screen::Waiting));

        start_playing(&mut app);
        assert!(matches!(app.screen, Screen::Playing { .. }));

        app.on_server_message(ServerMessage::GameOver {
            winner: "draw".to_string(),
        });
        assert!(matches!(app.screen, Screen::GameOver));

        app.dismiss_game_over();
        assert!(matches!(app.screen, Screen::Lobby { .. }));
    }

    #[test]
    fn test_player_left_returns_to_lobby() {
        let mut app = coordinator();
        start_playing(&mut app);
        app.on_server_message(ServerMessage::PlayerLeft {
            msg: "Room closed.".to_string(),
        });
        assert!(matches!(app.screen, Screen::Lobby { .. }));
        assert_eq!(app.session.status(), "Room closed.");
    }

    #[test]
    fn test_cursor_clamped_to_board() {
        let mut app = coordinator();
        start_playing(&mut app);
        app.move_cursor(-1, 0);
        app.move_cursor(0, -1);
        if let Screen::Playing { cursor, .. } = &app.screen {
            assert_eq!(*cursor, pos(0, 0));
        }
        for _ in 0..10 {
            app.move_cursor(1, 1);
        }
        if let Screen::Playing { cursor, .. } = &app.screen {
            assert_eq!(*cursor, pos(2, 2));
        }
    }

    #[test]
    fn test_drag_does_not_retoggle_same_cell() {
        let mut app = coordinator();
        let now = Instant::now();
        start_playing(&mut app);

        app.mouse_down(pos(0, 0), now);
        app.mouse_drag(pos(0, 0), now); // still in the same cell
        assert_eq!(app.session.selection().len(), 1);

        app.mouse_drag(pos(0, 1), now);
        assert_eq!(app.session.selection().len(), 2);

        // Dragging back re-enters the first cell and deselects it.
        app.mouse_drag(pos(0, 0), now);
        assert_eq!(app.session.selection().len(), 1);
    }

    #[test]
    fn test_new_press_after_release_toggles_again() {
        let mut app = coordinator();
        let now = Instant::now();
        start_playing(&mut app);

        app.mouse_down(pos(0, 0), now);
        app.mouse_up();
        app.mouse_down(pos(0, 0), now);
        assert!(app.session.selection().is_empty());
    }

    #[test]
    fn test_leave_flow_requires_confirmation() {
        let mut app = coordinator();
        start_playing(&mut app);
        app.session.take_outbox();

        app.request_leave();
        assert!(matches!(app.screen, Screen::ConfirmLeave));

        app.cancel_leave();
        assert!(matches!(app.screen, Screen::Playing { .. }));
        assert!(app.session.take_outbox().is_empty());

        app.request_leave();
        app.confirm_leave();
        let outbox = app.session.take_outbox();
        assert!(matches!(&outbox[0], ClientMessage::LeaveGame { .. }));
    }

    #[test]
    fn test_error_screen_sticks() {
        let mut app = coordinator();
        app.set_error("Connection to server lost".to_string());
        start_playing(&mut app);
        assert!(matches!(app.screen, Screen::Error { .. }));
    }

    #[test]
    fn test_theme_icons() {
        assert_eq!(theme_icon(Some("animals")), "🦁");
        assert_eq!(theme_icon(Some("ANIMALS")), "🦁");
        assert_eq!(theme_icon(Some("quantum")), "📦");
        assert_eq!(theme_icon(None), "🎲");
    }
}
