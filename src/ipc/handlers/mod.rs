pub mod core;
pub mod feeds;
pub mod roster;
pub mod session;
pub mod tapes;
pub mod worker;

mod helpers;
