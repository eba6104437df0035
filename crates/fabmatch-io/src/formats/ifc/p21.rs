//! Part 21 (ISO 10303-21) physical file parser.
//!
//! IFC models are exchanged as Part 21 text: a HEADER section followed by a
//! DATA section of `#id = TYPE(params);` instances. Only the DATA section is
//! parsed; the header is checked for the file marker and skipped.

use std::borrow::Cow;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace0, one_of},
    combinator::{map, map_res, opt, recognize, value, verify},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// An entity instance from the DATA section.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityInstance {
    /// Instance ID (`#123`).
    pub id: u64,
    /// Upper-cased entity type name (e.g. `IFCBEAM`).
    pub type_name: String,
    pub params: Vec<StepValue>,
}

impl EntityInstance {
    pub fn param(&self, index: usize) -> Option<&StepValue> {
        self.params.get(index)
    }
}

/// A value in a parameter list.
#[derive(Debug, Clone, PartialEq)]
pub enum StepValue {
    Integer(i64),
    Real(f64),
    String(String),
    /// Entity reference (`#123`).
    Reference(u64),
    /// Enumeration (`.VALUE.`).
    Enum(String),
    /// Binary literal (`"0FF"`): leading unused-bit count, then hex digits.
    Binary(String),
    List(Vec<StepValue>),
    /// Unset value (`$`).
    Omitted,
    /// Derived value (`*`).
    Derived,
    /// Typed value (`IFCLABEL('x')`).
    Typed { type_name: String, value: Box<StepValue> },
}

impl StepValue {
    pub fn as_reference(&self) -> Option<u64> {
        match self {
            Self::Reference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric value, accepting integers written without a decimal point.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Real(v) => Some(*v),
            Self::Integer(v) => Some(*v as f64),
            Self::Typed { value, .. } => value.as_f64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[StepValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// References held in a list value, skipping anything else.
    pub fn references(&self) -> impl Iterator<Item = u64> + '_ {
        self.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(StepValue::as_reference)
    }
}

fn separator(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn parameter_list(input: &str) -> IResult<&str, Vec<StepValue>> {
    delimited(
        pair(char('('), multispace0),
        terminated(separated_list0(separator, step_value), multispace0),
        char(')'),
    )(input)
}

/// Parse an instance ID (`#123`).
fn entity_id(input: &str) -> IResult<&str, u64> {
    preceded(char('#'), map_res(digit1, |s: &str| s.parse::<u64>()))(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_res(recognize(pair(opt(one_of("+-")), digit1)), |s: &str| {
        s.parse::<i64>()
    })(input)
}

fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

/// Parse a real. A decimal point or exponent is required so integers stay
/// integers.
fn real(input: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(one_of("+-")),
            digit1,
            alt((
                // "0." without trailing digits is legal
                recognize(tuple((char('.'), opt(digit1), opt(exponent)))),
                exponent,
            )),
        ))),
        |s: &str| s.parse::<f64>(),
    )(input)
}

/// Parse a string literal, collapsing doubled quotes and decoding escapes.
fn string_literal(input: &str) -> IResult<&str, String> {
    let (input, _) = char('\'')(input)?;
    let mut raw = String::new();
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c != '\'' {
            raw.push(c);
            continue;
        }
        if matches!(chars.peek(), Some((_, '\''))) {
            raw.push('\'');
            chars.next();
        } else {
            return Ok((&input[i + 1..], decode_step_string(&raw)));
        }
    }

    Err(nom::Err::Error(nom::error::Error::new(
        input,
        nom::error::ErrorKind::Char,
    )))
}

fn hex_chunks(hex: &str, width: usize) -> impl Iterator<Item = u32> + '_ {
    hex.as_bytes().chunks(width).filter_map(|chunk| {
        std::str::from_utf8(chunk)
            .ok()
            .and_then(|s| u32::from_str_radix(s, 16).ok())
    })
}

/// Decode Part 21 control directives: `\X2\…\X0\` (UTF-16), `\X4\…\X0\`
/// (UTF-32), `\X\HH` (Latin-1), `\S\c` (upper half of ISO 8859) and `\\`.
/// Code page switches (`\PA\`) are dropped.
fn decode_step_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if let Some(tail) = rest.strip_prefix("\\X2\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            let units: Vec<u16> = hex_chunks(&tail[..end], 4).map(|u| u as u16).collect();
            out.extend(
                char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)),
            );
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X4\\") {
            let end = tail.find("\\X0\\").unwrap_or(tail.len());
            out.extend(
                hex_chunks(&tail[..end], 8)
                    .map(|u| char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER)),
            );
            rest = tail.get(end + 4..).unwrap_or("");
        } else if let Some(tail) = rest.strip_prefix("\\X\\") {
            match tail.get(..2).and_then(|h| u8::from_str_radix(h, 16).ok()) {
                Some(byte) => {
                    out.push(char::from(byte));
                    rest = &tail[2..];
                }
                None => {
                    out.push('\\');
                    rest = &rest[1..];
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\S\\") {
            let mut chars = tail.chars();
            match chars.next() {
                Some(c) if c.is_ascii() => {
                    out.push(char::from(c as u8 + 0x80));
                    rest = chars.as_str();
                }
                _ => {
                    out.push('\\');
                    rest = &rest[1..];
                }
            }
        } else if let Some(tail) = rest.strip_prefix("\\\\") {
            out.push('\\');
            rest = tail;
        } else if rest.len() >= 4
            && rest.starts_with("\\P")
            && rest.as_bytes()[3] == b'\\'
            && rest.as_bytes()[2].is_ascii_uppercase()
        {
            rest = &rest[4..];
        } else {
            out.push('\\');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

fn enumeration(input: &str) -> IResult<&str, String> {
    delimited(
        char('.'),
        map(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            |s: &str| s.to_ascii_uppercase(),
        ),
        char('.'),
    )(input)
}

/// Parse a binary literal, keeping the digits upper-cased.
fn binary(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            verify(take_while(|c: char| c.is_ascii_hexdigit()), |s: &str| {
                s.starts_with(['0', '1', '2', '3'])
            }),
            |s: &str| s.to_ascii_uppercase(),
        ),
        char('"'),
    )(input)
}

fn type_name(input: &str) -> IResult<&str, String> {
    map(
        verify(
            take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_'),
            |s: &str| s.starts_with(|c: char| c.is_ascii_alphabetic()),
        ),
        |s: &str| s.to_ascii_uppercase(),
    )(input)
}

/// Parse a typed value: `TYPE(value)` or `TYPE(v1, v2, ...)`.
fn typed_parameter(input: &str) -> IResult<&str, StepValue> {
    let (input, type_name) = type_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, mut values) = parameter_list(input)?;

    // A single value is stored directly
    let inner = if values.len() == 1 {
        values.remove(0)
    } else {
        StepValue::List(values)
    };

    Ok((
        input,
        StepValue::Typed {
            type_name,
            value: Box::new(inner),
        },
    ))
}

fn step_value(input: &str) -> IResult<&str, StepValue> {
    let (input, _) = multispace0(input)?;

    alt((
        value(StepValue::Omitted, char('$')),
        value(StepValue::Derived, char('*')),
        map(entity_id, StepValue::Reference),
        map(enumeration, StepValue::Enum),
        map(string_literal, StepValue::String),
        map(binary, StepValue::Binary),
        typed_parameter,
        map(real, StepValue::Real),
        map(integer, StepValue::Integer),
        map(parameter_list, StepValue::List),
    ))(input)
}

/// `TYPE ( params )`
fn typed_value(input: &str) -> IResult<&str, (String, Vec<StepValue>)> {
    let (input, _) = multispace0(input)?;
    let (input, name) = type_name(input)?;
    let (input, _) = multispace0(input)?;
    let (input, params) = parameter_list(input)?;
    Ok((input, (name, params)))
}

/// Parse one instance line, simple or complex.
pub fn entity_instance(input: &str) -> IResult<&str, EntityInstance> {
    let (input, _) = multispace0(input)?;
    let (input, id) = entity_id(input)?;
    let (input, _) = delimited(multispace0, char('='), multispace0)(input)?;

    let (input, (type_name, params)) = if input.starts_with('(') {
        // Complex instance: =( TYPE1(...) TYPE2(...) ). The first type names
        // the instance and the parameters are concatenated.
        let (input, parts) = delimited(
            char('('),
            many0(typed_value),
            pair(multispace0, char(')')),
        )(input)?;
        let type_name = parts
            .first()
            .map(|(t, _)| t.clone())
            .unwrap_or_else(|| "COMPLEX".to_string());
        let params = parts.into_iter().flat_map(|(_, p)| p).collect();
        (input, (type_name, params))
    } else {
        typed_value(input)?
    };

    let (input, _) = pair(multispace0, char(';'))(input)?;

    Ok((
        input,
        EntityInstance {
            id,
            type_name,
            params,
        },
    ))
}

/// Parse the DATA section.
pub fn parse_data_section(input: &str) -> IResult<&str, Vec<EntityInstance>> {
    let (input, _) = take_until("DATA;")(input)?;
    let (input, _) = tag("DATA;")(input)?;
    let (input, _) = multispace0(input)?;

    let (input, entities) = many0(terminated(entity_instance, multispace0))(input)?;

    let (input, _) = tag("ENDSEC;")(input)?;

    Ok((input, entities))
}

/// Remove `/* ... */` comments outside string literals.
pub fn strip_comments(input: &str) -> Cow<'_, str> {
    if !input.contains("/*") {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut rest = input;

    while let Some(c) = rest.chars().next() {
        if !in_string && rest.starts_with("/*") {
            match rest[2..].find("*/") {
                Some(end) => rest = &rest[2 + end + 2..],
                None => rest = "",
            }
            continue;
        }
        if c == '\'' {
            in_string = !in_string;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(out)
}
