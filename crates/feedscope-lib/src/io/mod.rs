pub mod line;
pub mod serial;

pub use line::{decode_line, parse_line, Unparseable};
pub use serial::{open_serial, LineReader, LineSource, SerialSource};
