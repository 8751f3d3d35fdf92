//! Routing - maps source identifiers to output paths

use crate::content::ContentClass;

/// Fixed route of the synthesized article index
pub const ARTICLES_ROUTE: &str = "articles.html";

/// Fixed route of the home page
pub const INDEX_ROUTE: &str = "index.html";

/// How a content class is mapped to its output path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Output path equals the source identifier
    Identity,
    /// Source extension is replaced (or added) with the given one
    SetExtension(&'static str),
    /// Output path is fixed regardless of the identifier
    Constant(&'static str),
    /// Item is an input only and is never written
    None,
}

impl Route {
    /// The route every item of `class` takes
    pub fn for_class(class: ContentClass) -> Self {
        match class {
            ContentClass::Image | ContentClass::Stylesheet => Route::Identity,
            ContentClass::Post | ContentClass::ContactPage => Route::SetExtension("html"),
            ContentClass::IndexPage => Route::Constant(INDEX_ROUTE),
            ContentClass::Template => Route::None,
        }
    }

    /// Apply the route to an identifier such as `posts/foo.markdown`
    pub fn apply(self, identifier: &str) -> Option<String> {
        match self {
            Route::Identity => Some(identifier.to_string()),
            Route::SetExtension(ext) => Some(set_extension(identifier, ext)),
            Route::Constant(path) => Some(path.to_string()),
            Route::None => None,
        }
    }
}

/// Route an identifier of a known class
pub fn route(class: ContentClass, identifier: &str) -> Option<String> {
    Route::for_class(class).apply(identifier)
}

/// Replace the extension of the last path segment, or append one if absent
fn set_extension(identifier: &str, ext: &str) -> String {
    let file_start = identifier.rfind('/').map(|i| i + 1).unwrap_or(0);
    let file_name = &identifier[file_start..];
    let stem_len = match file_name.rfind('.') {
        Some(dot) if dot > 0 => dot,
        _ => file_name.len(),
    };
    format!("{}.{}", &identifier[..file_start + stem_len], ext)
}

/// Relative path from a route's directory back to the site root.
///
/// ```ignore
/// to_site_root("index.html")         // -> "."
/// to_site_root("posts/hello.html")   // -> ".."
/// ```
pub fn to_site_root(route: &str) -> String {
    let depth = route
        .trim_start_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .count()
        .saturating_sub(1);

    if depth == 0 {
        ".".to_string()
    } else {
        vec![".."; depth].join("/")
    }
}
