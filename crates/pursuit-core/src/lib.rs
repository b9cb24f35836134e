pub mod belief;
pub mod game;
pub mod map;
pub mod model;
pub mod path;
