//! wordrace - terminal client for a realtime word-search race
//!
//! Create a room, share the code, beat your opponent to every word.

mod app;
mod board;
mod network;
mod session;
mod storage;
mod tui;

use app::{AppCoordinator, Screen};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use network::Connection;
use ratatui::prelude::Rect;
use session::ClientSession;
use std::io;
use std::time::{Duration, Instant};
use storage::Storage;
use tui::Tui;

fn main() -> io::Result<()> {
    // Server address: env override with the localhost fallback
    let server_addr =
        std::env::var("WORDRACE_SERVER").unwrap_or_else(|_| "127.0.0.1:5000".to_string());

    // Storage degrades to in-memory when the data dir is unusable; identity
    // then lives only for this process.
    let storage = Storage::open_or_ephemeral()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;

    let mut connection = match Connection::connect(&server_addr) {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Could not reach the game server at {}: {}", server_addr, e);
            return Err(e);
        }
    };

    let mut session = ClientSession::new(storage);
    session.on_start(Instant::now());
    let mut app = AppCoordinator::new(session);

    // Initialize terminal
    let mut terminal = Tui::new()?;
    terminal.enter()?;

    // Main event loop
    let poll_timeout = Duration::from_millis(50);

    loop {
        // Render
        terminal.draw(|frame| tui::render(frame, &app))?;

        // Poll for input with timeout
        if event::poll(poll_timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    handle_key(&mut app, key);
                }
                Event::Mouse(mouse) => {
                    handle_mouse(&mut app, mouse);
                }
                _ => {}
            }
        }

        // Apply server pushes, then advance timers (rejoin, selection idle)
        let now = Instant::now();
        for msg in connection.poll() {
            app.on_server_message(msg);
        }
        app.tick(now);

        // Flush queued requests to the server
        for msg in app.session.take_outbox() {
            if connection.send(msg).is_err() {
                app.set_error("Connection to server lost".to_string());
            }
        }
        if !connection.is_alive() {
            app.set_error("Connection to server lost".to_string());
        }

        // Check for quit
        if app.should_quit {
            break;
        }
    }

    // Terminal cleanup happens automatically via Tui::drop
    Ok(())
}

/// Route a key press to the current screen's handlers
fn handle_key(app: &mut AppCoordinator, key: KeyEvent) {
    let now = Instant::now();
    match &app.screen {
        Screen::Lobby { .. } => match key.code {
            KeyCode::Esc => app.quit(),
            KeyCode::Tab => app.lobby_tab(),
            KeyCode::Up => app.lobby_up(),
            KeyCode::Down => app.lobby_down(),
            KeyCode::Left => app.lobby_left(),
            KeyCode::Right => app.lobby_right(),
            KeyCode::Enter => app.lobby_select(),
            KeyCode::Backspace => app.lobby_backspace(),
            KeyCode::Char(c) if c.is_ascii_alphanumeric() => app.lobby_char(c),
            _ => {}
        },
        Screen::Waiting => {
            if key.code == KeyCode::Esc {
                app.request_leave();
            }
        }
        Screen::Playing { .. } => match key.code {
            KeyCode::Esc => app.request_leave(),
            KeyCode::Up => app.move_cursor(-1, 0),
            KeyCode::Down => app.move_cursor(1, 0),
            KeyCode::Left => app.move_cursor(0, -1),
            KeyCode::Right => app.move_cursor(0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => app.select_at_cursor(now),
            _ => {}
        },
        Screen::ConfirmLeave => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm_leave(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_leave(),
            _ => {}
        },
        Screen::GameOver => app.dismiss_game_over(),
        Screen::Error { .. } => app.quit(),
    }
}

/// Route a mouse event to grid selection (press toggles, drag toggles each
/// newly-entered cell)
fn handle_mouse(app: &mut AppCoordinator, mouse: MouseEvent) {
    if !matches!(app.screen, Screen::Playing { .. }) {
        return;
    }
    let (rows, cols) = match app.session.board() {
        Some(board) => (board.rows(), board.cols()),
        None => return,
    };
    // Hit-test against the same layout the renderer used
    let (width, height) = crossterm::terminal::size().unwrap_or((0, 0));
    let (_, grid_area, _, _) = tui::ui::playing_layout(Rect::new(0, 0, width, height));
    let now = Instant::now();

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(pos) = tui::ui::grid_cell_at(grid_area, rows, cols, mouse.column, mouse.row)
            {
                app.mouse_down(pos, now);
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            if let Some(pos) = tui::ui::grid_cell_at(grid_area, rows, cols, mouse.column, mouse.row)
            {
                app.mouse_drag(pos, now);
            }
        }
        MouseEventKind::Up(MouseButton::Left) => app.mouse_up(),
        _ => {}
    }
}
