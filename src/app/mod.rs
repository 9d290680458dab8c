pub mod screen;

pub use screen::{theme_icon, AppCoordinator, LobbyAction, Screen};
