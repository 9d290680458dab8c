#![allow(dead_code)]
//! Wire protocol for talking to the game server
//!
//! Simple length-prefixed JSON messages over TCP: a 4-byte big-endian length
//! followed by a JSON object carrying a `"type"` field. The server owns all
//! game rules; the client only ever sends requests and interprets pushes.

use crate::board::{CellPos, FoundEvent};
use std::io::{self, Read, Write};
use std::net::TcpStream;

/// Requests sent from the client to the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Request a new room with the given number of rounds
    CreateRoom { user_id: String, rounds: u32 },
    /// Join (or rejoin) an existing room
    JoinRoom { room_id: String, user_id: String },
    /// Candidate word submission; the server decides validity
    WordFound {
        room_id: String,
        word: String,
        user_id: String,
    },
    /// Voluntary exit; ends the match for everyone in the room
    LeaveGame { room_id: String },
}

/// Pushes received from the game server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// A room was created for us; we are now waiting for an opponent
    RoomCreated {
        room_id: String,
        theme: Option<String>,
    },
    /// Server-reported error, surfaced to the user
    Error { message: String },
    /// A round is starting (first round, a later round, or a rejoin snapshot)
    GameStart {
        grid: Vec<Vec<char>>,
        words: Vec<String>,
        scores: Vec<(String, u32)>,
        theme: Option<String>,
        current_round: u32,
        total_rounds: u32,
        found_history: Vec<FoundEvent>,
    },
    /// Someone found a word; includes the full score snapshot
    UpdateBoard {
        word: String,
        finder: String,
        indices: Vec<CellPos>,
        scores: Vec<(String, u32)>,
    },
    /// Match finished; winner is a player id or the literal "draw"
    GameOver { winner: String },
    /// Another participant left or disconnected; the room is closed
    PlayerLeft { msg: String },
}

/// Round number assumed when the server omits `current_round`.
pub const DEFAULT_CURRENT_ROUND: u32 = 1;

/// Round count assumed when the server omits `total_rounds`.
pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

const MAX_FRAME_LEN: usize = 1024 * 1024;

impl ClientMessage {
    /// Serialize message to bytes (length-prefixed JSON)
    pub fn to_bytes(&self) -> Vec<u8> {
        frame(&self.to_json())
    }

    /// Deserialize message from bytes (length-prefixed JSON)
    pub fn from_bytes(bytes: &[u8]) -> io::Result<(Self, usize)> {
        let (json, consumed) = unframe(bytes)?;
        Ok((Self::from_json(json)?, consumed))
    }

    fn to_json(&self) -> String {
        match self {
            ClientMessage::CreateRoom { user_id, rounds } => {
                format!(
                    r#"{{"type":"create_room","userId":"{}","rounds":{}}}"#,
                    escape_json(user_id),
                    rounds
                )
            }
            ClientMessage::JoinRoom { room_id, user_id } => {
                format!(
                    r#"{{"type":"join_room","roomId":"{}","userId":"{}"}}"#,
                    escape_json(room_id),
                    escape_json(user_id)
                )
            }
            ClientMessage::WordFound {
                room_id,
                word,
                user_id,
            } => {
                format!(
                    r#"{{"type":"word_found","roomId":"{}","word":"{}","userId":"{}"}}"#,
                    escape_json(room_id),
                    escape_json(word),
                    escape_json(user_id)
                )
            }
            ClientMessage::LeaveGame { room_id } => {
                format!(
                    r#"{{"type":"leave_game","roomId":"{}"}}"#,
                    escape_json(room_id)
                )
            }
        }
    }

    fn from_json(json: &str) -> io::Result<Self> {
        let json = json.trim();
        let msg_type = get_str(json, "type")
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing type field"))?;

        match msg_type.as_str() {
            "create_room" => {
                let user_id = require_str(json, "userId")?;
                let rounds = get_u32(json, "rounds")
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing rounds"))?;
                Ok(ClientMessage::CreateRoom { user_id, rounds })
            }
            "join_room" => {
                let room_id = require_str(json, "roomId")?;
                let user_id = require_str(json, "userId")?;
                Ok(ClientMessage::JoinRoom { room_id, user_id })
            }
            "word_found" => {
                let room_id = require_str(json, "roomId")?;
                let word = require_str(json, "word")?;
                let user_id = require_str(json, "userId")?;
                Ok(ClientMessage::WordFound {
                    room_id,
                    word,
                    user_id,
                })
            }
            "leave_game" => {
                let room_id = require_str(json, "roomId")?;
                Ok(ClientMessage::LeaveGame { room_id })
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown message type: {}", msg_type),
            )),
        }
    }

    /// Write message to a TCP stream
    pub fn write_to(&self, stream: &mut TcpStream) -> io::Result<()> {
        stream.write_all(&self.to_bytes())?;
        stream.flush()
    }

    /// Read message from a TCP stream
    pub fn read_from(stream: &mut TcpStream) -> io::Result<Self> {
        Self::from_json(&read_frame(stream)?)
    }
}

impl ServerMessage {
    /// Serialize message to bytes (length-prefixed JSON)
    pub fn to_bytes(&self) -> Vec<u8> {
        frame(&self.to_json())
    }

    /// Deserialize message from bytes (length-prefixed JSON)
    pub fn from_bytes(bytes: &[u8]) -> io::Result<(Self, usize)> {
        let (json, consumed) = unframe(bytes)?;
        Ok((Self::from_json(json)?, consumed))
    }

    fn to_json(&self) -> String {
        match self {
            ServerMessage::RoomCreated { room_id, theme } => match theme {
                Some(theme) => format!(
                    r#"{{"type":"room_created","roomId":"{}","theme":"{}"}}"#,
                    escape_json(room_id),
                    escape_json(theme)
                ),
                None => format!(
                    r#"{{"type":"room_created","roomId":"{}"}}"#,
                    escape_json(room_id)
                ),
            },
            ServerMessage::Error { message } => {
                format!(r#"{{"type":"error","message":"{}"}}"#, escape_json(message))
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
                let theme_json = match theme {
                    Some(t) => format!(r#","theme":"{}""#, escape_json(t)),
                    None => String::new(),
                };
                format!(
                    r#"{{"type":"game_start","grid":{},"words":{},"scores":{}{},"current_round":{},"total_rounds":{},"found_history":{}}}"#,
                    grid_to_json(grid),
                    words_to_json(words),
                    scores_to_json(scores),
                    theme_json,
                    current_round,
                    total_rounds,
                    history_to_json(found_history)
                )
            }
            ServerMessage::UpdateBoard {
                word,
                finder,
                indices,
                scores,
            } => {
                format!(
                    r#"{{"type":"update_board","word":"{}","finder":"{}","indices":{},"scores":{}}}"#,
                    escape_json(word),
                    escape_json(finder),
                    indices_to_json(indices),
                    scores_to_json(scores)
                )
            }
            ServerMessage::GameOver { winner } => {
                format!(
                    r#"{{"type":"game_over","winner":"{}"}}"#,
                    escape_json(winner)
                )
            }
            ServerMessage::PlayerLeft { msg } => {
                format!(r#"{{"type":"player_left","msg":"{}"}}"#, escape_json(msg))
            }
        }
    }

    fn from_json(json: &str) -> io::Result<Self> {
        let json = json.trim();
        let msg_type = get_str(json, "type")
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing type field"))?;

        match msg_type.as_str() {
            "room_created" => {
                let room_id = require_str(json, "roomId")?;
                let theme = get_str(json, "theme");
                Ok(ServerMessage::RoomCreated { room_id, theme })
            }
            "error" => {
                let message = require_str(json, "message")?;
                Ok(ServerMessage::Error { message })
            }
            "game_start" => {
                let grid_src = get_array(json, "grid")
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing grid"))?;
                let grid = parse_grid(grid_src)
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid grid"))?;
                let words_src = get_array(json, "words")
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing words"))?;
                let words = parse_string_array(words_src);
                let scores = get_object(json, "scores")
                    .map(parse_scores)
                    .unwrap_or_default();
                let theme = get_str(json, "theme");
                let current_round = get_u32(json, "current_round").unwrap_or(DEFAULT_CURRENT_ROUND);
                let total_rounds = get_u32(json, "total_rounds").unwrap_or(DEFAULT_TOTAL_ROUNDS);
                let found_history = match get_array(json, "found_history") {
                    Some(src) => parse_history(src).ok_or_else(|| {
                        io::Error::new(io::ErrorKind::InvalidData, "invalid found_history")
                    })?,
                    None => Vec::new(),
                };
                Ok(ServerMessage::GameStart {
                    grid,
                    words,
                    scores,
                    theme,
                    current_round,
                    total_rounds,
                    found_history,
                })
            }
            "update_board" => {
                let word = require_str(json, "word")?;
                let finder = require_str(json, "finder")?;
                let indices_src = get_array(json, "indices")
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing indices"))?;
                let indices = parse_indices(indices_src)
                    .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "invalid indices"))?;
                let scores = get_object(json, "scores")
                    .map(parse_scores)
                    .unwrap_or_default();
                Ok(ServerMessage::UpdateBoard {
                    word,
                    finder,
                    indices,
                    scores,
                })
            }
            "game_over" => {
                let winner = require_str(json, "winner")?;
                Ok(ServerMessage::GameOver { winner })
            }
            "player_left" => {
                let msg = require_str(json, "msg")?;
                Ok(ServerMessage::PlayerLeft { msg })
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unknown message type: {}", msg_type),
            )),
        }
    }

    /// Write message to a TCP stream
    pub fn write_to(&self, stream: &mut TcpStream) -> io::Result<()> {
        stream.write_all(&self.to_bytes())?;
        stream.flush()
    }

    /// Read message from a TCP stream
    pub fn read_from(stream: &mut TcpStream) -> io::Result<Self> {
        Self::from_json(&read_frame(stream)?)
    }
}

// === Framing ===

fn frame(json: &str) -> Vec<u8> {
    let len = json.len() as u32;
    let mut bytes = Vec::with_capacity(4 + json.len());
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.extend_from_slice(json.as_bytes());
    bytes
}

fn unframe(bytes: &[u8]) -> io::Result<(&str, usize)> {
    if bytes.len() < 4 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "need 4 bytes for length",
        ));
    }
    let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    if bytes.len() < 4 + len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete message",
        ));
    }
    let json = std::str::from_utf8(&bytes[4..4 + len])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok((json, 4 + len))
}

fn read_frame(stream: &mut TcpStream) -> io::Result<String> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;

    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "message too large"));
    }

    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;

    String::from_utf8(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

// === Encoding helpers ===

fn grid_to_json(grid: &[Vec<char>]) -> String {
    let rows: Vec<String> = grid
        .iter()
        .map(|row| {
            let cells: Vec<String> = row
                .iter()
                .map(|c| format!(r#""{}""#, escape_json(&c.to_string())))
                .collect();
            format!("[{}]", cells.join(","))
        })
        .collect();
    format!("[{}]", rows.join(","))
}

fn words_to_json(words: &[String]) -> String {
    let items: Vec<String> = words
        .iter()
        .map(|w| format!(r#""{}""#, escape_json(w)))
        .collect();
    format!("[{}]", items.join(","))
}

fn scores_to_json(scores: &[(String, u32)]) -> String {
    let entries: Vec<String> = scores
        .iter()
        .map(|(id, score)| format!(r#""{}":{}"#, escape_json(id), score))
        .collect();
    format!("{{{}}}", entries.join(","))
}

fn indices_to_json(indices: &[CellPos]) -> String {
    let items: Vec<String> = indices
        .iter()
        .map(|p| format!(r#"{{"r":{},"c":{}}}"#, p.r, p.c))
        .collect();
    format!("[{}]", items.join(","))
}

fn history_to_json(history: &[FoundEvent]) -> String {
    let items: Vec<String> = history
        .iter()
        .map(|e| {
            format!(
                r#"{{"word":"{}","finder":"{}","indices":{}}}"#,
                escape_json(&e.word),
                escape_json(&e.finder),
                indices_to_json(&e.indices)
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}

// === Parsing helpers ===

/// Extract a string field: `"key":"value"`.
fn get_str(json: &str, key: &str) -> Option<String> {
    let pattern = format!(r#""{}":""#, key);
    let start = json.find(&pattern)? + pattern.len();
    let rest = &json[start..];
    let end = find_unescaped_quote(rest)?;
    Some(unescape_json(&rest[..end]))
}

fn require_str(json: &str, key: &str) -> io::Result<String> {
    get_str(json, key)
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("missing {}", key)))
}

/// Extract a non-negative integer field: `"key":123`.
fn get_u32(json: &str, key: &str) -> Option<u32> {
    let pattern = format!(r#""{}":"#, key);
    let start = json.find(&pattern)? + pattern.len();
    let rest = &json[start..];
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    rest[..end].parse().ok()
}

fn get_usize(json: &str, key: &str) -> Option<usize> {
    get_u32(json, key).map(|n| n as usize)
}

/// Extract the contents of an array field: `"key":[ ... ]`.
/// Returns the slice between the brackets, not including them.
fn get_array<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!(r#""{}":["#, key);
    let start = json.find(&pattern)? + pattern.len();
    let rest = &json[start..];
    let end = find_balanced_end(rest)?;
    Some(&rest[..end])
}

/// Extract the contents of an object field: `"key":{ ... }`.
fn get_object<'a>(json: &'a str, key: &str) -> Option<&'a str> {
    let pattern = format!(r#""{}":{{"#, key);
    let start = json.find(&pattern)? + pattern.len();
    let rest = &json[start..];
    let end = find_balanced_end(rest)?;
    Some(&rest[..end])
}

/// Find the index of the closer matching an already-consumed opener.
///
/// Counts both bracket kinds together (well-formed JSON keeps them balanced)
/// and ignores anything inside string literals.
fn find_balanced_end(s: &str) -> Option<usize> {
    let mut depth = 1;
    let mut in_string = false;
    let mut prev_char = ' ';
    for (i, c) in s.char_indices() {
        if c == '"' && prev_char != '\\' {
            in_string = !in_string;
        } else if !in_string {
            match c {
                '[' | '{' => depth += 1,
                ']' | '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            }
        }
        prev_char = c;
    }
    None
}

/// Parse `[["C","A"],["T","X"]]` array contents into rows of chars.
fn parse_grid(src: &str) -> Option<Vec<Vec<char>>> {
    let mut rows = Vec::new();
    let mut current = src;
    while let Some(start) = current.find('[') {
        let rest = &current[start + 1..];
        let end = find_balanced_end(rest)?;
        rows.push(parse_char_row(&rest[..end]));
        current = &rest[end + 1..];
    }
    Some(rows)
}

/// Parse `"C","A","T"` into chars, one per quoted cell.
fn parse_char_row(src: &str) -> Vec<char> {
    parse_string_array(src)
        .into_iter()
        .filter_map(|s| s.chars().next())
        .collect()
}

/// Parse `"CAT","DOG"` array contents into strings.
fn parse_string_array(src: &str) -> Vec<String> {
    let mut items = Vec::new();
    let mut rest = src;
    while let Some(start) = rest.find('"') {
        let body = &rest[start + 1..];
        let Some(end) = find_unescaped_quote(body) else {
            break;
        };
        items.push(unescape_json(&body[..end]));
        rest = &body[end + 1..];
    }
    items
}

/// Parse `"user_a":2,"user_b":1` object contents into score pairs.
fn parse_scores(src: &str) -> Vec<(String, u32)> {
    let mut scores = Vec::new();
    let mut rest = src;
    while let Some(start) = rest.find('"') {
        let body = &rest[start + 1..];
        let Some(key_end) = find_unescaped_quote(body) else {
            break;
        };
        let key = unescape_json(&body[..key_end]);
        let after_key = &body[key_end + 1..];
        let Some(colon) = after_key.find(':') else {
            break;
        };
        let value_src = after_key[colon + 1..].trim_start();
        let digits_end = value_src
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(value_src.len());
        if let Ok(score) = value_src[..digits_end].parse() {
            scores.push((key, score));
        }
        rest = &value_src[digits_end..];
    }
    scores
}

/// Parse `{"r":0,"c":1},{"r":0,"c":2}` array contents into cell positions.
fn parse_indices(src: &str) -> Option<Vec<CellPos>> {
    let mut indices = Vec::new();
    let mut current = src;
    while let Some(start) = current.find('{') {
        let rest = &current[start + 1..];
        let end = find_balanced_end(rest)?;
        let obj = &rest[..end];
        indices.push(CellPos {
            r: get_usize(obj, "r")?,
            c: get_usize(obj, "c")?,
        });
        current = &rest[end + 1..];
    }
    Some(indices)
}

/// Parse found-history array contents: objects with word, finder, indices.
fn parse_history(src: &str) -> Option<Vec<FoundEvent>> {
    let mut history = Vec::new();
    let mut current = src;
    while let Some(start) = current.find('{') {
        let rest = &current[start + 1..];
        let end = find_balanced_end(rest)?;
        let obj = &rest[..end];
        let word = get_str(obj, "word")?;
        let finder = get_str(obj, "finder")?;
        let indices = parse_indices(get_array(obj, "indices")?)?;
        history.push(FoundEvent {
            word,
            finder,
            indices,
        });
        current = &rest[end + 1..];
    }
    Some(history)
}

/// Find the position of the first unescaped quote in a string
fn find_unescaped_quote(s: &str) -> Option<usize> {
    let mut i = 0;
    let bytes = s.as_bytes();
    while i < bytes.len() {
        if bytes[i] == b'"' {
            return Some(i);
        } else if bytes[i] == b'\\' && i + 1 < bytes.len() {
            // Skip escaped character
            i += 2;
        } else {
            i += 1;
        }
    }
    None
}

fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

fn unescape_json(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('"') => result.push('"'),
                Some('\\') => result.push('\\'),
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}
