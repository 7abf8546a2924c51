//! Core engine: scan passes, chat commands, and the process loop.

pub mod commands;
pub mod runner;
pub mod scanner;

#[cfg(test)]
pub(crate) mod testing;
