// src/application/commands/mod.rs
//
// Command Handlers
//
// ARCHITECTURE:
// - Commands are thin adapters between the command line and services
// - Commands accept plain arguments or DTOs, return DTOs
// - Commands convert errors into ErrorResponse
// - Commands NEVER contain business logic

pub mod build_commands;
pub mod part_commands;

pub use build_commands::*;
pub use part_commands::*;
