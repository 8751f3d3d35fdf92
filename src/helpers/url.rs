//! URL rewriting over rendered HTML

use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{element, rewrite_str, HandlerResult, RewriteStrSettings};
use std::cell::RefCell;

use crate::routes::to_site_root;

/// Attributes that carry a URL
pub const URL_ATTRIBUTES: &[&str] = &["src", "href", "data", "poster"];

/// Whether a URL is absolute on the same host, e.g. `/css/default.css`
pub fn is_root_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

/// Rewrite root-relative links in `html` so they resolve from `route`.
///
/// HTML the rewriter cannot handle is returned unchanged.
///
/// # Examples
/// ```ignore
/// relativize(r#"<a href="/about.html">"#, "posts/x.html") // -> r#"<a href="../about.html">"#
/// ```
pub fn relativize(html: &str, route: &str) -> String {
    let root = to_site_root(route);
    let result = rewrite_urls(html, |url| {
        is_root_relative(url).then(|| format!("{}{}", root, url))
    });

    match result {
        Ok(rewritten) => rewritten,
        Err(e) => {
            tracing::warn!("Leaving links in {} untouched: {}", route, e);
            html.to_string()
        }
    }
}

/// Apply `f` to every URL attribute; `None` leaves the value as is
pub fn rewrite_urls<F>(html: &str, f: F) -> Result<String, RewritingError>
where
    F: Fn(&str) -> Option<String>,
{
    let f = &f;
    let element_content_handlers = vec![
        element!("[src]", move |el| rewrite_attribute(el, "src", f)),
        element!("[href]", move |el| rewrite_attribute(el, "href", f)),
        element!("[data]", move |el| rewrite_attribute(el, "data", f)),
        element!("[poster]", move |el| rewrite_attribute(el, "poster", f)),
    ];

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers,
            ..RewriteStrSettings::new()
        },
    )
}

/// Every URL attribute value in document order
pub fn collect_urls(html: &str) -> Result<Vec<String>, RewritingError> {
    let urls = RefCell::new(Vec::new());
    rewrite_urls(html, |url| {
        urls.borrow_mut().push(url.to_string());
        None
    })?;
    Ok(urls.into_inner())
}

fn rewrite_attribute<F>(el: &mut Element<'_, '_>, name: &str, f: &F) -> HandlerResult
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = el.get_attribute(name) {
        if let Some(rewritten) = f(&value) {
            el.set_attribute(name, &rewritten)?;
        }
    }
    Ok(())
}
