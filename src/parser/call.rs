// Single plot call parser

use super::ast::{Argument, PlotCall};
use super::lexer::{arg_value, identifier, ws};
use nom::{
    branch::alt,
    character::complete::char,
    combinator::opt,
    multi::separated_list0,
    IResult,
};

/// Parse `name: value` (or `name=value`)
pub fn parse_argument(input: &str) -> IResult<&str, Argument> {
    let (input, name) = ws(identifier)(input)?;
    let (input, _) = ws(alt((char(':'), char('='))))(input)?;
    let (input, value) = arg_value(input)?;
    Ok((input, Argument { name, value }))
}

/// Parse a plot call
/// Format: kind() or kind(name: value, ...)
pub fn parse_call(input: &str) -> IResult<&str, PlotCall> {
    let (input, kind) = ws(identifier)(input)?;
    let (input, _) = ws(char('('))(input)?;
    let (input, args) = separated_list0(ws(char(',')), parse_argument)(input)?;
    let (input, _) = opt(ws(char(',')))(input)?;
    let (input, _) = ws(char(')'))(input)?;

    Ok((input, PlotCall { kind, args }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::ArgValue;

    #[test]
    fn test_parse_empty_call() {
        let (rest, call) = parse_call("line()").unwrap();
        assert_eq!(rest, "");
        assert_eq!(call.kind, "line");
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_parse_call_with_args() {
        let (_, call) = parse_call(r#"hist(bins: 5, stacked: true, histtype: "step")"#).unwrap();
        assert_eq!(call.kind, "hist");
        assert_eq!(call.get("bins"), Some(&ArgValue::Number(5.0)));
        assert_eq!(call.get("stacked"), Some(&ArgValue::Bool(true)));
        assert_eq!(call.get("histtype").and_then(ArgValue::as_str), Some("step"));
    }

    #[test]
    fn test_parse_call_equals_syntax() {
        let (_, call) = parse_call("scatter(x=a, y=b)").unwrap();
        assert_eq!(call.get("x").and_then(ArgValue::as_str), Some("a"));
        assert_eq!(call.get("y").and_then(ArgValue::as_str), Some("b"));
    }

    #[test]
    fn test_parse_call_with_whitespace() {
        let (_, call) = parse_call("  bar ( x : cat ,  y : [v1, v2] , )  ").unwrap();
        assert_eq!(call.kind, "bar");
        assert_eq!(
            call.get("y").and_then(ArgValue::as_names),
            Some(vec!["v1".to_string(), "v2".to_string()])
        );
    }

    #[test]
    fn test_parse_call_missing_paren() {
        assert!(parse_call("line(x: a").is_err());
    }

    #[test]
    fn test_parse_call_missing_value() {
        assert!(parse_call("line(x: )").is_err());
    }
}
