#[macro_use]
mod codec;
mod constants;
mod game;
mod round;

pub use constants::*;
pub use game::*;
pub use round::*;
