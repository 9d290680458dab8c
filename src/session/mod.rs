//! Client session: room lifecycle and server-push reconciliation
//!
//! The session is the only authority on the client's phase, but it has no
//! authority over the room itself: every transition that matters is driven
//! by a server push, never by the act of sending a request. Outbound
//! requests are queued on an outbox the shell drains into the connection,
//! which keeps every transition testable without a live socket.

use crate::board::selection::Selection;
use crate::board::{Board, CellPos, FoundEvent};
use crate::network::protocol::{ClientMessage, ServerMessage};
use crate::storage::{PlayerId, Storage};
use std::time::{Duration, Instant};

/// Delay before the rejoin request on startup, giving the transport time to
/// finish connecting.
pub const REJOIN_DELAY: Duration = Duration::from_millis(500);

/// Coarse lifecycle stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Waiting,
    Playing,
    GameOver,
}

/// Match result from the local player's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

/// Display metadata for the current round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInfo {
    pub theme: Option<String>,
    pub current_round: u32,
    pub total_rounds: u32,
}

/// The client's session state machine.
pub struct ClientSession {
    storage: Storage,
    player_id: PlayerId,
    phase: Phase,
    room_id: Option<String>,
    board: Option<Board>,
    selection: Selection,
    round: Option<RoundInfo>,
    waiting_theme: Option<String>,
    outcome: Option<Outcome>,
    status: String,
    outbox: Vec<ClientMessage>,
    /// Scheduled rejoin: fire time plus the room id that was saved when the
    /// schedule was made. Cancellation is a guard at fire time.
    rejoin: Option<(Instant, String)>,
}

impl ClientSession {
    pub fn new(storage: Storage) -> Self {
        let player_id = storage.player_id().clone();
        Self {
            storage,
            player_id,
            phase: Phase::Lobby,
            room_id: None,
            board: None,
            selection: Selection::new(),
            round: None,
            waiting_theme: None,
            outcome: None,
            status: String::new(),
            outbox: Vec::new(),
            rejoin: None,
        }
    }

    /// Schedule a rejoin if a previous room survived the last shutdown.
    /// Called once, at startup.
    pub fn on_start(&mut self, now: Instant) {
        if let Ok(Some(room)) = self.storage.load_room() {
            self.status = "Rejoining previous game...".to_string();
            self.rejoin = Some((now + REJOIN_DELAY, room));
        }
    }

    /// Advance the session's timers: the pending rejoin and the selection's
    /// idle deadline.
    pub fn tick(&mut self, now: Instant) {
        if let Some((at, room)) = &self.rejoin {
            if now >= *at {
                let room = room.clone();
                self.rejoin = None;
                // The saved id may have been cleared since the schedule was
                // made (a new create, a game over); a stale rejoin would
                // resurrect a dead room, so re-check before firing.
                let still_saved =
                    self.storage.load_room().ok().flatten().as_deref() == Some(room.as_str());
                if still_saved {
                    self.join_room(&room, true);
                }
            }
        }
        self.selection.poll_expired(now);
    }

    /// Request a fresh room. Always starts clean: any previously saved room
    /// id is cleared before the request goes out.
    pub fn create_room(&mut self, rounds: u32) {
        let _ = self.storage.clear_room();
        self.status = "Creating Room...".to_string();
        self.outbox.push(ClientMessage::CreateRoom {
            user_id: self.player_id.as_str().to_string(),
            rounds,
        });
    }

    /// Request to join (or rejoin) a room. Empty input is declined locally;
    /// nothing is sent.
    pub fn join_room(&mut self, room_id: &str, rejoin: bool) {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            return;
        }
        if !rejoin {
            // A failed fresh join must not leave a stale id behind.
            let _ = self.storage.clear_room();
        }
        let _ = self.storage.save_room(room_id);
        self.room_id = Some(room_id.to_string());
        self.status = "Joining...".to_string();
        self.outbox.push(ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            user_id: self.player_id.as_str().to_string(),
        });
    }

    /// Notify the server we are leaving. Ends the match for everyone, so the
    /// UI asks for confirmation before calling this. The session itself
    /// resets when the server's `player_left` push comes back.
    pub fn leave_game(&mut self) {
        if let Some(room_id) = &self.room_id {
            self.outbox.push(ClientMessage::LeaveGame {
                room_id: room_id.clone(),
            });
        }
    }

    /// Route a grid interaction through the selection machine, submitting
    /// the path as a candidate word whenever it grows past one cell. The
    /// server decides validity; the client submits eagerly.
    pub fn handle_select(&mut self, pos: CellPos, now: Instant) {
        if self.phase != Phase::Playing {
            return;
        }
        let Some(board) = &self.board else {
            return;
        };
        // Claimed cells reject selection input entirely: no path change and
        // no idle-timer reset.
        if board.is_terminal(pos) {
            return;
        }
        let Some(ch) = board.char_at(pos) else {
            return;
        };
        self.selection.toggle(pos, ch, now);

        if self.selection.len() > 1 {
            if let Some(room_id) = &self.room_id {
                self.outbox.push(ClientMessage::WordFound {
                    room_id: room_id.clone(),
                    word: self.selection.word(),
                    user_id: self.player_id.as_str().to_string(),
                });
            }
        }
    }

    /// The inbound reducer: apply one server push to the session.
    pub fn handle_message(&mut self, msg: ServerMessage) {
        match msg {
            ServerMessage::RoomCreated { room_id, theme } => {
                self.phase = Phase::Waiting;
                let _ = self.storage.save_room(&room_id);
                self.status = format!("Room ID: {}", room_id);
                self.room_id = Some(room_id);
                self.waiting_theme = theme;
            }
            ServerMessage::Error { message } => {
                // "not found" and "full" mean the saved id is known-invalid;
                // anything else is surfaced without touching the session.
                if message.contains("not found") || message.contains("full") {
                    self.reset_session(format!("Error: {}", message));
                } else {
                    self.status = format!("Error: {}", message);
                }
            }
            ServerMessage::GameStart {
                grid,
                words,
                scores,
                theme,
                current_round,
                total_rounds,
                found_history,
            } => {
                self.phase = Phase::Playing;
                self.selection.clear();
                self.outcome = None;
                let mut board = Board::new(grid, words, scores);
                for event in &found_history {
                    board.apply_found(event, self.player_id.as_str());
                }
                self.board = Some(board);
                self.round = Some(RoundInfo {
                    theme,
                    current_round,
                    total_rounds,
                });
                self.status.clear();
            }
            ServerMessage::UpdateBoard {
                word,
                finder,
                indices,
                scores,
            } => {
                if let Some(board) = &mut self.board {
                    let event = FoundEvent {
                        word,
                        finder,
                        indices,
                    };
                    let mine = board.apply_found(&event, self.player_id.as_str());
                    board.set_scores(scores);
                    if mine {
                        // Our submission was confirmed; the path served its
                        // purpose.
                        self.selection.clear();
                    } else {
                        // An opponent claimed cells we may be mid-selection
                        // on; the claim wins.
                        self.selection.remove_cells(&event.indices);
                    }
                }
            }
            ServerMessage::GameOver { winner } => {
                self.phase = Phase::GameOver;
                self.outcome = Some(if winner == self.player_id.as_str() {
                    Outcome::Win
                } else if winner == "draw" {
                    Outcome::Draw
                } else {
                    Outcome::Lose
                });
                let _ = self.storage.clear_room();
                self.room_id = None;
                self.rejoin = None;
                self.selection.clear();
            }
            ServerMessage::PlayerLeft { msg } => {
                self.reset_session(msg);
            }
        }
    }

    /// Back to a clean lobby after a finished match.
    pub fn return_to_lobby(&mut self) {
        self.phase = Phase::Lobby;
        self.board = None;
        self.round = None;
        self.outcome = None;
        self.waiting_theme = None;
        self.status.clear();
    }

    /// Drain the queued outbound requests for the connection to send.
    pub fn take_outbox(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.outbox)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn player_id(&self) -> &PlayerId {
        &self.player_id
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn round_info(&self) -> Option<&RoundInfo> {
        self.round.as_ref()
    }

    pub fn waiting_theme(&self) -> Option<&str> {
        self.waiting_theme.as_deref()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// The room id currently persisted, if any. This is what a future
    /// startup would rejoin.
    pub fn saved_room(&self) -> Option<String> {
        self.storage.load_room().ok().flatten()
    }

    fn reset_session(&mut self, notice: String) {
        let _ = self.storage.clear_room();
        self.phase = Phase::Lobby;
        self.room_id = None;
        self.board = None;
        self.round = None;
        self.waiting_theme = None;
        self.rejoin = None;
        self.selection.clear();
        self.status = notice;
    }
}
