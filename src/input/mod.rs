//! Line-oriented input for the terminal host

mod command;
mod handler;

pub use handler::handle_line;
