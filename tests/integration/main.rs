//! Integration tests: the real engine wired to in-memory collaborators.

mod fakes;
mod process_loop;
mod scan_cycle;
