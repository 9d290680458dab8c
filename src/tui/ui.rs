//! UI rendering using ratatui
//!
//! Supports multiple screens:
//! - Lobby: create/join form with round selector
//! - Waiting: room code display while an opponent joins
//! - Playing: grid, word list, scores, theme/round header
//! - ConfirmLeave: y/n prompt before ending the match
//! - GameOver: win/lose/draw result
//! - Error: connection failure

use crate::app::{theme_icon, AppCoordinator, LobbyAction, Screen};
use crate::board::{CellPos, CellState};
use crate::session::{ClientSession, Outcome};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph},
};

/// Width of one rendered grid cell in terminal columns.
pub const CELL_WIDTH: u16 = 3;

/// Render the appropriate screen based on app state
pub fn render(frame: &mut Frame, coordinator: &AppCoordinator) {
    let session = &coordinator.session;
    match &coordinator.screen {
        Screen::Lobby {
            selected,
            room_input,
            editing_room,
            rounds,
        } => {
            render_lobby(frame, *selected, room_input, *editing_room, *rounds, session);
        }
        Screen::Waiting => {
            render_waiting(frame, session);
        }
        Screen::Playing { cursor, .. } => {
            render_playing(frame, session, *cursor);
        }
        Screen::ConfirmLeave => {
            render_confirm_leave(frame);
        }
        Screen::GameOver => {
            render_game_over(frame, session.outcome());
        }
        Screen::Error { message } => {
            render_error(frame, message);
        }
    }
}

/// Render the lobby form
fn render_lobby(
    frame: &mut Frame,
    selected: usize,
    room_input: &str,
    editing_room: bool,
    rounds: u32,
    session: &ClientSession,
) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // Logo
            Constraint::Length(3), // Room input
            Constraint::Length(1), // Spacer
            Constraint::Min(4),    // Actions
            Constraint::Length(1), // Status
            Constraint::Length(2), // Footer
        ])
        .margin(2)
        .split(area);

    let logo = r#"
 __        _____  ____  ____  ____      _    ____ _____
 \ \      / / _ \|  _ \|  _ \|  _ \    / \  / ___| ____|
  \ \ /\ / / | | | |_) | | | | |_) |  / _ \| |   |  _|
   \ V  V /| |_| |  _ <| |_| |  _ <  / ___ \ |___| |___
    \_/\_/  \___/|_| \_\____/|_| \_\/_/   \_\____|_____|
"#;
    let logo_widget = Paragraph::new(logo)
        .style(Style::default().fg(Color::Yellow).bold())
        .alignment(Alignment::Center);
    frame.render_widget(logo_widget, layout[0]);

    // Room input
    let input_display = if editing_room {
        format!("Room ID: [{}]_", room_input)
    } else if room_input.is_empty() {
        "Room ID: (Tab to enter a code)".to_string()
    } else {
        format!("Room ID: {} (Tab to edit)", room_input)
    };
    let input_style = if editing_room {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let input_widget = Paragraph::new(input_display)
        .style(input_style)
        .alignment(Alignment::Center);
    frame.render_widget(input_widget, layout[1]);

    // Actions
    let items: Vec<ListItem> = LobbyAction::all()
        .iter()
        .enumerate()
        .map(|(i, action)| {
            let style = if i == selected {
                Style::default().fg(Color::Yellow).bold()
            } else {
                Style::default().fg(Color::White)
            };
            let prefix = if i == selected { "> " } else { "  " };
            let label = match action {
                LobbyAction::CreateRoom => {
                    format!("{}{}  ‹ {} rounds ›", prefix, action.label(), rounds)
                }
                LobbyAction::JoinRoom => format!("{}{}", prefix, action.label()),
            };
            ListItem::new(label).style(style)
        })
        .collect();
    let actions = List::new(items).block(Block::default());
    frame.render_widget(actions, layout[3]);

    // Status (rejoin notice, server errors, progress)
    let status = Paragraph::new(session.status())
        .style(Style::default().fg(Color::Cyan))
        .alignment(Alignment::Center);
    frame.render_widget(status, layout[4]);

    let footer = Paragraph::new("↑↓ Select  ←→ Rounds  Tab Room ID  Enter Go  Esc Quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[5]);
}

/// Render the waiting-for-opponent screen
fn render_waiting(frame: &mut Frame, session: &ClientSession) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(5),    // Room code card
            Constraint::Length(2), // Footer
        ])
        .margin(1)
        .split(area);

    let header = Paragraph::new("Waiting for an opponent...")
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, layout[0]);

    let room_id = session.room_id().unwrap_or("????");
    let theme_line = match session.waiting_theme() {
        Some(theme) => format!("Theme: {} {}", theme, theme_icon(Some(theme))),
        None => String::new(),
    };
    let card = Paragraph::new(format!(
        "\nRoom ID: {}\n\n{}\n\nShare this code with your opponent.",
        room_id, theme_line
    ))
    .style(Style::default().fg(Color::White))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(card, layout[1]);

    let footer = Paragraph::new("Esc Leave")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[2]);
}

/// Split the playing screen into header, grid, sidebar, and footer areas.
///
/// Also used for mouse hit-testing, so the math must stay in one place.
pub fn playing_layout(area: Rect) -> (Rect, Rect, Rect, Rect) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(2),
        ])
        .split(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(20), Constraint::Length(26)])
        .split(vertical[1]);
    (vertical[0], columns[0], columns[1], vertical[2])
}

/// Map a terminal coordinate to a grid cell, if it lands on one.
/// Accounts for the one-column border of the grid block.
pub fn grid_cell_at(grid_area: Rect, rows: usize, cols: usize, x: u16, y: u16) -> Option<CellPos> {
    let inner_x = grid_area.x + 1;
    let inner_y = grid_area.y + 1;
    if x < inner_x || y < inner_y {
        return None;
    }
    let c = ((x - inner_x) / CELL_WIDTH) as usize;
    let r = (y - inner_y) as usize;
    if r < rows && c < cols {
        Some(CellPos { r, c })
    } else {
        None
    }
}

/// Render the in-game screen
fn render_playing(frame: &mut Frame, session: &ClientSession, cursor: CellPos) {
    let (header_area, grid_area, sidebar_area, footer_area) = playing_layout(frame.area());

    // Header: room, theme, round
    let mut header_text = format!("Room: {}", session.room_id().unwrap_or("????"));
    if let Some(round) = session.round_info() {
        let theme_name = round.theme.as_deref().unwrap_or("Random");
        header_text.push_str(&format!(
            "   Theme: {} {}   Round {}/{}",
            theme_name,
            theme_icon(round.theme.as_deref()),
            round.current_round,
            round.total_rounds
        ));
    }
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(Color::Cyan).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, header_area);

    let Some(board) = session.board() else {
        return;
    };
    let selection = session.selection();

    // Grid
    let grid_lines: Vec<Line> = (0..board.rows())
        .map(|r| {
            let spans: Vec<Span> = (0..board.cols())
                .map(|c| {
                    let pos = CellPos { r, c };
                    let ch = board.char_at(pos).unwrap_or(' ');
                    let mut style = cell_style(board.cell_view(pos, selection));
                    if pos == cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    Span::styled(format!(" {} ", ch), style)
                })
                .collect();
            Line::from(spans)
        })
        .collect();
    let grid = Paragraph::new(grid_lines).block(Block::default().borders(Borders::ALL));
    frame.render_widget(grid, grid_area);

    // Sidebar: word list then scores
    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(4), Constraint::Length(4)])
        .split(sidebar_area);

    let word_items: Vec<ListItem> = board
        .words()
        .iter()
        .map(|entry| {
            let style = if entry.crossed {
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(entry.word.clone()).style(style)
        })
        .collect();
    let words = List::new(word_items).block(Block::default().borders(Borders::ALL).title("Words"));
    frame.render_widget(words, sidebar[0]);

    let (mine, enemy) = board.score_view(session.player_id().as_str());
    let scores = Paragraph::new(format!("You: {}\nEnemy: {}", mine, enemy))
        .style(Style::default().fg(Color::White))
        .block(Block::default().borders(Borders::ALL).title("Score"));
    frame.render_widget(scores, sidebar[1]);

    // Footer: transient status plus key hints
    let footer_text = if session.status().is_empty() {
        "Drag or ↑↓←→ + Space to select  Esc Leave".to_string()
    } else {
        session.status().to_string()
    };
    let footer = Paragraph::new(footer_text)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, footer_area);
}

fn cell_style(state: CellState) -> Style {
    match state {
        CellState::Idle => Style::default().fg(Color::White),
        CellState::Selected => Style::default().fg(Color::Black).bg(Color::Yellow),
        CellState::FoundMe => Style::default().fg(Color::Black).bg(Color::Green),
        CellState::FoundEnemy => Style::default().fg(Color::Black).bg(Color::Red),
    }
}

/// Render the leave confirmation prompt
fn render_confirm_leave(frame: &mut Frame) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Min(1),
        ])
        .split(area);

    let prompt = Paragraph::new("Leave the game?\nThis ends the match for everyone.\n\n[y] Leave   [n] Stay")
        .style(Style::default().fg(Color::Yellow))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(prompt, layout[1]);
}

/// Render the game-over screen
fn render_game_over(frame: &mut Frame, outcome: Option<Outcome>) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
            Constraint::Min(1),
        ])
        .split(area);

    let (message, color) = match outcome {
        Some(Outcome::Win) => ("🏆 YOU WIN! 🏆", Color::Green),
        Some(Outcome::Draw) => ("🤝 DRAW!", Color::Blue),
        Some(Outcome::Lose) | None => ("☠  YOU LOSE! ☠", Color::Red),
    };
    let banner = Paragraph::new(message)
        .style(Style::default().fg(color).bold())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Game Over"));
    frame.render_widget(banner, layout[1]);

    let footer = Paragraph::new("Press any key to return to the lobby")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(footer, layout[2]);
}

/// Render the error screen
fn render_error(frame: &mut Frame, message: &str) {
    let area = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Min(1),
        ])
        .split(area);

    let error = Paragraph::new(format!("{}\n\nPress any key to quit", message))
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Error"));
    frame.render_widget(error, layout[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_cell_at_maps_cells() {
        let area = Rect::new(0, 3, 40, 12);
        // Inner origin is (1, 4); each cell is 3 columns wide, 1 row tall.
        assert_eq!(
            grid_cell_at(area, 10, 10, 1, 4),
            Some(CellPos { r: 0, c: 0 })
        );
        assert_eq!(
            grid_cell_at(area, 10, 10, 3, 4),
            Some(CellPos { r: 0, c: 0 })
        );
        assert_eq!(
            grid_cell_at(area, 10, 10, 4, 4),
            Some(CellPos { r: 0, c: 1 })
        );
        assert_eq!(
            grid_cell_at(area, 10, 10, 1, 6),
            Some(CellPos { r: 2, c: 0 })
        );
    }

    #[test]
    fn test_grid_cell_at_rejects_border_and_outside() {
        let area = Rect::new(0, 3, 40, 12);
        assert_eq!(grid_cell_at(area, 10, 10, 0, 4), None); // left border
        assert_eq!(grid_cell_at(area, 10, 10, 1, 3), None); // top border
        assert_eq!(grid_cell_at(area, 2, 2, 1, 7), None); // below the board
        assert_eq!(grid_cell_at(area, 2, 2, 8, 4), None); // right of the board
    }

    #[test]
    fn test_playing_layout_partitions_area() {
        let area = Rect::new(0, 0, 80, 24);
        let (header, grid, sidebar, footer) = playing_layout(area);
        assert_eq!(header.height, 3);
        assert_eq!(footer.height, 2);
        assert_eq!(grid.y, header.height);
        assert_eq!(sidebar.width, 26);
        assert_eq!(grid.width + sidebar.width, area.width);
    }
}
