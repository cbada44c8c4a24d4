// Hex color and palette override parsers

use super::lexer::{identifier, ws};
use crate::palette::Color;
use nom::{
    bytes::complete::{tag, take_while_m_n},
    character::complete::char,
    combinator::{all_consuming, map_res},
    multi::separated_list1,
    sequence::{separated_pair, tuple},
    IResult,
};

fn from_hex(input: &str) -> Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(input, 16)
}

fn hex_primary(input: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), from_hex)(input)
}

/// Parse a color literal
/// Format: #rrggbb
pub fn hex_color(input: &str) -> IResult<&str, Color> {
    let (input, _) = tag("#")(input)?;
    let (input, (r, g, b)) = tuple((hex_primary, hex_primary, hex_primary))(input)?;
    Ok((input, Color::rgb(r, g, b)))
}

/// Parse a comma-separated list of colors
/// Format: #ff8800, #ddff00
pub fn color_list(input: &str) -> IResult<&str, Vec<Color>> {
    separated_list1(ws(char(',')), ws(hex_color))(input)
}

/// Parse a palette override
/// Format: day=#ff8800,#ddff00,#3de800,#00c9ed
pub fn palette_override(input: &str) -> IResult<&str, (String, Vec<Color>)> {
    all_consuming(separated_pair(ws(identifier), char('='), color_list))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color() {
        let (rest, color) = hex_color("#ff3fd8").unwrap();
        assert_eq!(rest, "");
        assert_eq!(color, Color::rgb(0xff, 0x3f, 0xd8));
    }

    #[test]
    fn test_hex_color_uppercase() {
        let (_, color) = hex_color("#4290FF").unwrap();
        assert_eq!(color, Color::rgb(0x42, 0x90, 0xff));
    }

    #[test]
    fn test_hex_color_missing_hash() {
        assert!(hex_color("ff3fd8").is_err());
    }

    #[test]
    fn test_hex_color_short() {
        assert!(hex_color("#fff").is_err());
    }

    #[test]
    fn test_hex_color_bad_digit() {
        assert!(hex_color("#gg0000").is_err());
    }

    #[test]
    fn test_color_list_with_whitespace() {
        let (rest, colors) = color_list(" #0059a3 , #f2e200").unwrap();
        assert_eq!(rest, "");
        assert_eq!(colors.len(), 2);
    }

    #[test]
    fn test_palette_override() {
        let (_, (field, colors)) = palette_override("time=#0059a3,#f2e200").unwrap();
        assert_eq!(field, "time");
        assert_eq!(colors, vec![Color::rgb(0x00, 0x59, 0xa3), Color::rgb(0xf2, 0xe2, 0x00)]);
    }

    #[test]
    fn test_palette_override_trailing_garbage() {
        assert!(palette_override("time=#0059a3,#f2e200;").is_err());
    }

    #[test]
    fn test_palette_override_empty_list() {
        assert!(palette_override("time=").is_err());
    }
}
