pub mod autoplay;
pub mod command_reader;
pub mod config;
pub mod console_display;
pub mod error;
pub mod fretboard;
pub mod game;
pub mod jsonl_writer;
pub mod round;
pub mod types;
