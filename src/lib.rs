pub mod audio;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod levels;
pub mod maze;
pub mod serpent;
