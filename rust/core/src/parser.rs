// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP/IFC Parser using nom
//!
//! Zero-copy tokenization of entity records and a quote-aware entity scanner.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{map, map_res, opt, recognize},
    multi::separated_list0,
    sequence::{delimited, pair, preceded, tuple},
    IResult,
};

use crate::error::{Error, Result};

/// STEP/IFC Token
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Entity reference: #123
    EntityRef(u32),
    /// String literal with `''` escapes still in place: 'text'
    String(&'a str),
    /// Integer: 42
    Integer(i64),
    /// Float: 3.14, 0., 1.E-5
    Float(f64),
    /// Enum: .T., .HORIZONTAL.
    Enum(&'a str),
    /// List: (1, 2, 3)
    List(Vec<Token<'a>>),
    /// Typed value: IFCLENGTHMEASURE(12.5), IFCPARAMETERVALUE(0.)
    TypedValue(&'a str, Vec<Token<'a>>),
    /// Null value: $
    Null,
    /// Asterisk (derived value): *
    Derived,
}

fn entity_ref(input: &str) -> IResult<&str, Token> {
    map(
        preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
        Token::EntityRef,
    )(input)
}

/// Parse string literal: 'text'. A doubled quote is an escaped quote.
fn string_literal(input: &str) -> IResult<&str, Token> {
    fn content(input: &str) -> IResult<&str, &str> {
        let bytes = input.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\'' {
                if bytes.get(i + 1) == Some(&b'\'') {
                    i += 2;
                    continue;
                }
                return Ok((&input[i..], &input[..i]));
            }
            i += 1;
        }
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )))
    }

    map(delimited(char('\''), content, char('\'')), Token::String)(input)
}

fn integer(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(pair(opt(one_of("+-")), digit1)),
        |s: &str| s.parse::<i64>().map(Token::Integer),
    )(input)
}

/// STEP reals always carry a decimal point but may omit the fraction ("0.", "1.E-5")
fn float(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            char('.'),
            opt(digit1),
            opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
        ))),
        |s: &str| s.parse::<f64>().map(Token::Float),
    )(input)
}

fn enum_value(input: &str) -> IResult<&str, Token> {
    map(
        delimited(
            char('.'),
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            char('.'),
        ),
        Token::Enum,
    )(input)
}

fn null(input: &str) -> IResult<&str, Token> {
    map(char('$'), |_| Token::Null)(input)
}

fn derived(input: &str) -> IResult<&str, Token> {
    map(char('*'), |_| Token::Derived)(input)
}

fn typed_value(input: &str) -> IResult<&str, Token> {
    map(
        pair(
            take_while1(|c: char| c.is_alphanumeric() || c == '_'),
            arguments,
        ),
        |(type_name, args)| Token::TypedValue(type_name, args),
    )(input)
}

fn ws(input: &str) -> IResult<&str, ()> {
    map(take_while(|c: char| c.is_whitespace()), |_| ())(input)
}

fn token(input: &str) -> IResult<&str, Token> {
    delimited(
        ws,
        alt((
            float, // before integer, floats share the digit prefix
            integer,
            entity_ref,
            string_literal,
            enum_value,
            list,
            typed_value,
            null,
            derived,
        )),
        ws,
    )(input)
}

fn arguments(input: &str) -> IResult<&str, Vec<Token>> {
    delimited(
        char('('),
        separated_list0(delimited(ws, char(','), ws), token),
        preceded(ws, char(')')),
    )(input)
}

fn list(input: &str) -> IResult<&str, Token> {
    map(arguments, Token::List)(input)
}

/// Parse a complete entity record
///
/// Example: `#12=IFCCURVESEGMENT(.CONTINUOUS.,#13,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(50.),#14);`
///
/// Returns the instance number, the upper-case type name and the attribute tokens.
pub fn parse_entity(input: &str) -> Result<(u32, &str, Vec<Token>)> {
    let result: IResult<&str, (u32, &str, Vec<Token>)> = tuple((
        delimited(
            ws,
            preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u32>())),
            ws,
        ),
        preceded(
            char('='),
            delimited(
                ws,
                take_while1(|c: char| c.is_alphanumeric() || c == '_'),
                ws,
            ),
        ),
        tuple((arguments, ws, char(';'))),
    ))(input)
    .map(|(rest, (id, type_name, (args, _, _)))| (rest, (id, type_name, args)));

    match result {
        Ok((_, (id, type_name, args))) => Ok((id, type_name, args)),
        Err(e) => Err(Error::parse(0, format!("Failed to parse entity: {}", e))),
    }
}

/// Entity scanner - finds `#id=TYPE(...);` records without decoding them
///
/// Semicolons inside string literals do not terminate a record.
pub struct EntityScanner<'a> {
    content: &'a str,
    position: usize,
}

impl<'a> EntityScanner<'a> {
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            position: 0,
        }
    }

    /// Scan for the next entity
    /// Returns (entity_id, type_name, record_start, record_end)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();
        let len = bytes.len();

        loop {
            let start = self.position + memchr::memchr(b'#', &bytes[self.position..])?;
            let mut pos = start + 1;

            let id_start = pos;
            while pos < len && bytes[pos].is_ascii_digit() {
                pos += 1;
            }
            let id_end = pos;
            while pos < len && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }

            if id_end == id_start || pos >= len || bytes[pos] != b'=' {
                // A reference inside a header string or similar, not a record start
                self.position = start + 1;
                continue;
            }

            let id = self.content[id_start..id_end].parse::<u32>().ok()?;
            let end = record_end(bytes, pos)?;

            let mut type_start = pos + 1;
            while type_start < end && bytes[type_start].is_ascii_whitespace() {
                type_start += 1;
            }
            let mut type_end = type_start;
            while type_end < end
                && (bytes[type_end].is_ascii_alphanumeric() || bytes[type_end] == b'_')
            {
                type_end += 1;
            }

            self.position = end;
            return Some((id, &self.content[type_start..type_end], start, end));
        }
    }
}

/// Byte offset just past the `;` closing the record that starts before `from`
fn record_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut pos = from;
    loop {
        let offset = memchr::memchr2(b';', b'\'', &bytes[pos..])?;
        pos += offset;
        if bytes[pos] == b';' {
            return Some(pos + 1);
        }
        // Skip the string literal; '' is an escaped quote and re-enters the loop
        pos += 1;
        let close = memchr::memchr(b'\'', &bytes[pos..])?;
        pos += close + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ref() {
        assert_eq!(entity_ref("#123"), Ok(("", Token::EntityRef(123))));
        assert_eq!(entity_ref("#0"), Ok(("", Token::EntityRef(0))));
    }

    #[test]
    fn test_string_literal_with_escaped_quote() {
        assert_eq!(string_literal("'hello'"), Ok(("", Token::String("hello"))));
        assert_eq!(
            string_literal("'it''s'"),
            Ok(("", Token::String("it''s")))
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(integer("-42"), Ok(("", Token::Integer(-42))));
        assert_eq!(float("0."), Ok(("", Token::Float(0.0))));
        assert_eq!(float("-3.25"), Ok(("", Token::Float(-3.25))));
        assert_eq!(float("1.5E-10"), Ok(("", Token::Float(1.5e-10))));
        assert_eq!(float("9.104E-3"), Ok(("", Token::Float(0.009104))));
    }

    #[test]
    fn test_enum() {
        assert_eq!(enum_value(".T."), Ok(("", Token::Enum("T"))));
        assert_eq!(
            enum_value(".CONTINUOUS."),
            Ok(("", Token::Enum("CONTINUOUS")))
        );
    }

    #[test]
    fn test_nested_list() {
        let (_, token) = list("((0.,1.),( 2. , 3. ))").unwrap();
        match token {
            Token::List(items) => {
                assert_eq!(items.len(), 2);
                assert_eq!(
                    items[1],
                    Token::List(vec![Token::Float(2.0), Token::Float(3.0)])
                );
            }
            other => panic!("Expected List token, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_curve_segment_with_typed_values() {
        let input =
            "#12=IFCCURVESEGMENT(.CONTINUOUS.,#13,IFCLENGTHMEASURE(0.),IFCLENGTHMEASURE(50.),#14);";
        let (id, type_name, args) = parse_entity(input).unwrap();
        assert_eq!(id, 12);
        assert_eq!(type_name, "IFCCURVESEGMENT");
        assert_eq!(args.len(), 5);
        assert_eq!(
            args[3],
            Token::TypedValue("IFCLENGTHMEASURE", vec![Token::Float(50.0)])
        );
    }

    #[test]
    fn test_parse_entity_rejects_truncated_record() {
        assert!(parse_entity("#1=IFCDIRECTION((1.,0.)").is_err());
    }

    #[test]
    fn test_scanner_ignores_semicolons_in_strings() {
        let content = r#"
#1=IFCALIGNMENT('0a1b2c3d4e5f6g7h8i9j0k',$,'A; B',$,$,$,$,.USERDEFINED.);
#2 = IFCDIRECTION((1.,0.));
#3=IFCCARTESIANPOINT((0.,0.));
"#;
        let mut scanner = EntityScanner::new(content);
        let (id, type_name, start, end) = scanner.next_entity().unwrap();
        assert_eq!(id, 1);
        assert_eq!(type_name, "IFCALIGNMENT");
        assert!(content[start..end].ends_with(".USERDEFINED.);"));

        let (id, type_name, _, _) = scanner.next_entity().unwrap();
        assert_eq!((id, type_name), (2, "IFCDIRECTION"));

        let (id, type_name, _, _) = scanner.next_entity().unwrap();
        assert_eq!((id, type_name), (3, "IFCCARTESIANPOINT"));
        assert!(scanner.next_entity().is_none());
    }

    #[test]
    fn test_scanner_skips_header_references() {
        let content = "FILE_NAME('#5 draft',$);\nDATA;\n#7=IFCDIRECTION((0.,1.));\nENDSEC;";
        let mut scanner = EntityScanner::new(content);
        let (id, _, _, _) = scanner.next_entity().unwrap();
        assert_eq!(id, 7);
        assert!(scanner.next_entity().is_none());
    }
}
