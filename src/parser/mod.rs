// nom parsers for colors and palette overrides

pub mod color;
pub mod lexer;

pub use color::{color_list, hex_color, palette_override};
