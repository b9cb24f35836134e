pub mod location;
pub mod moves;
pub mod player;
pub mod role;
pub mod tickets;
pub mod transport;
