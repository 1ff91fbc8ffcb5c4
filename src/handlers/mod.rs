//! Command handlers: execute one CLI command against the service layer and
//! render the structured result for the terminal.

pub mod bucket_handlers;
pub mod object_handlers;
