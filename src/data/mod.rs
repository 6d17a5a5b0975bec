/// Bounds-checked big-endian byte cursor
pub mod cursor;
/// Field layouts shared by record decode and encode
pub mod layout;
pub mod parser_utils;
