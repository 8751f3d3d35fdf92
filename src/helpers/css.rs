//! Stylesheet minification via lightningcss

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

use crate::error::{Error, Result};

/// Minify a stylesheet; `path` names it in errors
///
/// # Examples
/// ```ignore
/// compress("css/default.css", "a  {\n  color: red;\n}")? // -> "a{color:red}"
/// ```
pub fn compress(path: &str, css: &str) -> Result<String> {
    let stylesheet_error = |message: String| Error::Stylesheet {
        path: path.to_string(),
        message,
    };

    let mut stylesheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: path.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| stylesheet_error(e.to_string()))?;

    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| stylesheet_error(e.to_string()))?;

    let output = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| stylesheet_error(e.to_string()))?;

    Ok(output.code)
}
