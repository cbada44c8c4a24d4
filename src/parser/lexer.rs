// Shared lexical helpers for the palette parsers

use nom::{
    bytes::complete::take_while1,
    character::complete::multispace0,
    combinator::map,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Parse a column identifier: letters, digits and underscores
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
        |s: &str| s.to_string(),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nom::bytes::complete::tag;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("total_bill=rest"), Ok(("=rest", "total_bill".to_string())));
        assert!(identifier("=x").is_err());
    }

    #[test]
    fn test_ws() {
        let result = ws(tag("day"))("  day  =");
        assert_eq!(result, Ok(("=", "day")));
    }
}
