pub mod file;
pub mod parser;

pub use file::write_output;
pub use parser::{parse_key_value, split_command_line};
