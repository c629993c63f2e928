// Display boundary: hands a finished document to something that shows it

use crate::error::Result;
use crate::vegalite::{Data, VegaLite};
use std::io::Write;

/// Anything that can show a Vega-Lite document.
///
/// `spec` never carries data; the payload comes separately so a surface may
/// inline it, reference it, or leave it out.
pub trait RenderSurface {
    fn display(&mut self, spec: &VegaLite, data: Option<&Data>) -> Result<()>;
}

/// Writes the document as JSON
pub struct JsonSurface<W: Write> {
    writer: W,
    pretty: bool,
    include_data: bool,
}

impl<W: Write> JsonSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            include_data: true,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn include_data(mut self, include: bool) -> Self {
        self.include_data = include;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSurface for JsonSurface<W> {
    fn display(&mut self, spec: &VegaLite, data: Option<&Data>) -> Result<()> {
        let mut doc = spec.clone();
        if self.include_data {
            doc.data = data.cloned();
        }
        let text = if self.pretty {
            doc.to_json_pretty()?
        } else {
            doc.to_json()?
        };
        writeln!(self.writer, "{}", text)?;
        self.writer.flush()?;
        Ok(())
    }
}

const VEGA_CDN: &str = "https://cdn.jsdelivr.net/npm/vega@3";
const VEGA_LITE_CDN: &str = "https://cdn.jsdelivr.net/npm/vega-lite@2";
const VEGA_EMBED_CDN: &str = "https://cdn.jsdelivr.net/npm/vega-embed@3";

/// Writes a standalone HTML page rendering the document with vega-embed
pub struct HtmlSurface<W: Write> {
    writer: W,
    title: String,
}

impl<W: Write> HtmlSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            title: "vgplot".to_string(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderSurface for HtmlSurface<W> {
    fn display(&mut self, spec: &VegaLite, data: Option<&Data>) -> Result<()> {
        let mut doc = spec.clone();
        doc.data = data.cloned();
        // `</` would close the script element early
        let json = doc.to_json()?.replace("</", "<\\/");

        let mut html = String::with_capacity(json.len() + 1024);
        html.push_str("<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"UTF-8\">\n");
        html.push_str(&format!("<title>{}</title>\n", html_escape(&self.title)));
        for src in [VEGA_CDN, VEGA_LITE_CDN, VEGA_EMBED_CDN] {
            html.push_str(&format!("<script src=\"{}\"></script>\n", src));
        }
        html.push_str("</head>\n<body>\n<div id=\"vis\"></div>\n<script>\n");
        html.push_str(&format!("const spec = {};\n", json));
        html.push_str("vegaEmbed(\"#vis\", spec).catch(console.error);\n");
        html.push_str("</script>\n</body></html>\n");

        self.writer.write_all(html.as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vegalite::MarkType;
    use serde_json::{json, Map};

    fn make_spec() -> (VegaLite, Data) {
        let mut spec = VegaLite::new();
        spec.mark = Some(MarkType::Point.into());
        let mut row = Map::new();
        row.insert("a".into(), json!("</script>"));
        (spec, Data::inline(vec![row]))
    }

    #[test]
    fn test_json_surface_with_data() {
        let (spec, data) = make_spec();
        let mut surface = JsonSurface::new(Vec::new());
        surface.display(&spec, Some(&data)).unwrap();
        let out = String::from_utf8(surface.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["mark"], json!("point"));
        assert_eq!(value["data"]["values"][0]["a"], json!("</script>"));
    }

    #[test]
    fn test_json_surface_without_data() {
        let (spec, data) = make_spec();
        let mut surface = JsonSurface::new(Vec::new()).include_data(false).pretty(true);
        surface.display(&spec, Some(&data)).unwrap();
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.contains('\n'));
        assert!(!out.contains("\"data\""));
    }

    #[test]
    fn test_html_surface() {
        let (spec, data) = make_spec();
        let mut surface = HtmlSurface::new(Vec::new()).title("a <b>");
        surface.display(&spec, Some(&data)).unwrap();
        let out = String::from_utf8(surface.into_inner()).unwrap();
        assert!(out.starts_with("<!DOCTYPE html>"));
        assert!(out.contains("vegaEmbed(\"#vis\", spec)"));
        assert!(out.contains("<title>a &lt;b&gt;</title>"));
        assert!(out.contains("<\\/script>"));
        assert_eq!(out.matches("</script>").count(), 4);
    }
}
