pub mod reveal;
pub mod serialization;
pub mod setup;
pub mod state;

pub use reveal::{Reveal, RevealSchedule};
pub use setup::{GameSetup, SetupError};
pub use state::{GameState, GameStatus, MoveError, Side};
