// Shared token parsers

use super::ast::ArgValue;
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, is_not, tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{map, opt, recognize, value},
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, pair},
    IResult,
};

/// Wrap a parser so that it skips surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Identifier: a letter or `_`, then letters, digits, `_` or `.`
pub fn identifier(input: &str) -> IResult<&str, String> {
    map(
        recognize(pair(
            satisfy(|c: char| c.is_alphabetic() || c == '_'),
            take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
        )),
        |s: &str| s.to_string(),
    )(input)
}

/// Double-quoted string with `\"`, `\\` and `\n` escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    let (input, _) = char('"')(input)?;
    let (input, s) = opt(escaped_transform(
        is_not("\\\""),
        '\\',
        alt((
            value("\\", tag("\\")),
            value("\"", tag("\"")),
            value("\n", tag("n")),
        )),
    ))(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, s.unwrap_or_default()))
}

pub fn number_literal(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// Bare word; `true`, `false`, `null` (and the Python spellings) are keywords
fn word(input: &str) -> IResult<&str, ArgValue> {
    map(identifier, |w| match w.as_str() {
        "true" | "True" => ArgValue::Bool(true),
        "false" | "False" => ArgValue::Bool(false),
        "null" | "None" => ArgValue::Null,
        _ => ArgValue::Ident(w),
    })(input)
}

fn list(input: &str) -> IResult<&str, ArgValue> {
    map(
        delimited(
            ws(char('[')),
            separated_list0(ws(char(',')), arg_value),
            ws(char(']')),
        ),
        ArgValue::List,
    )(input)
}

/// Any argument value
pub fn arg_value(input: &str) -> IResult<&str, ArgValue> {
    ws(alt((
        list,
        map(string_literal, ArgValue::Str),
        word,
        map(number_literal, ArgValue::Number),
    )))(input)
}
