// Pipeline parser: calls joined with `|`

use super::ast::PlotPipeline;
use super::call::parse_call;
use super::lexer::ws;
use crate::error::PlotError;
use nom::{
    bytes::complete::tag,
    combinator::{eof, opt},
    multi::separated_list1,
    IResult,
};

/// Parse a complete plot pipeline
/// Format: call | call | ...
pub fn parse_pipeline(input: &str) -> IResult<&str, PlotPipeline> {
    // Optional: consume leading "df |"
    let (input, _) = opt(ws(tag("df")))(input)?;
    let (input, _) = opt(ws(tag("|")))(input)?;

    let (input, calls) = separated_list1(ws(tag("|")), parse_call)(input)?;

    // Consume trailing whitespace and ensure end of input
    let (input, _) = ws(eof)(input)?;

    Ok((input, PlotPipeline { calls }))
}

/// Parse a pipeline, turning nom errors into a `PlotError`
pub fn parse_plot(input: &str) -> Result<PlotPipeline, PlotError> {
    match parse_pipeline(input) {
        Ok((_, pipeline)) => Ok(pipeline),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let offset = input.len() - e.input.len();
            Err(PlotError::Parse(format!(
                "unexpected input at offset {}: '{}'",
                offset,
                e.input.chars().take(20).collect::<String>()
            )))
        }
        Err(nom::Err::Incomplete(_)) => Err(PlotError::Parse("incomplete input".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_call() {
        let pipeline = parse_plot("line()").unwrap();
        assert_eq!(pipeline.calls.len(), 1);
        assert_eq!(pipeline.calls[0].kind, "line");
    }

    #[test]
    fn test_parse_layers() {
        let pipeline = parse_plot(r#"line(y: a) | scatter(x: a, y: b, c: "red")"#).unwrap();
        assert_eq!(pipeline.calls.len(), 2);
        assert_eq!(pipeline.calls[1].kind, "scatter");
    }

    #[test]
    fn test_parse_with_df_prefix() {
        let pipeline = parse_plot("df | hist(bins: 5)").unwrap();
        assert_eq!(pipeline.calls.len(), 1);
        assert_eq!(pipeline.calls[0].kind, "hist");
    }

    #[test]
    fn test_parse_trailing_pipe() {
        // Trailing pipe should fail (nothing after last pipe)
        assert!(parse_plot("line() |").is_err());
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(parse_plot("").is_err());
    }

    #[test]
    fn test_parse_garbage() {
        let err = parse_plot("invalid syntax here").unwrap_err();
        assert!(err.to_string().contains("parse error"));
    }
}
