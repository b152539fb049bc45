// Core models
pub mod game_event;
pub mod game_state;
pub mod notice;
pub mod player;
pub mod raw_log;
pub mod subscription;
pub mod tournament;

// Re-export commonly used types
pub use game_event::*;
pub use game_state::*;
pub use notice::*;
pub use player::*;
pub use raw_log::*;
pub use subscription::*;
pub use tournament::*;
