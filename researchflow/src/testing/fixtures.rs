//! Markup fixtures for search and extraction tests.

/// One result container on a fake search-engine page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFixture {
    /// Link text.
    pub title: String,
    /// Raw `href`, possibly a redirect wrapper.
    pub href: String,
    /// Snippet text.
    pub snippet: String,
}

impl SearchFixture {
    /// Creates a fixture.
    #[must_use]
    pub fn new(title: &str, href: &str, snippet: &str) -> Self {
        Self {
            title: title.to_string(),
            href: href.to_string(),
            snippet: snippet.to_string(),
        }
    }
}

/// Renders a results page in the shape of the HTML-only DuckDuckGo endpoint.
#[must_use]
pub fn search_page(results: &[SearchFixture]) -> String {
    let body: String = results
        .iter()
        .map(|r| {
            format!(
                "<div class=\"result results_links web-result\">\
                 <h2 class=\"result__title\"><a class=\"result__a\" href=\"{}\">{}</a></h2>\
                 <a class=\"result__snippet\" href=\"{}\">{}</a>\
                 </div>\n",
                escape(&r.href),
                escape(&r.title),
                escape(&r.href),
                escape(&r.snippet)
            )
        })
        .collect();

    format!("<!DOCTYPE html><html><head><title>results</title></head><body><div id=\"links\">\n{body}</div></body></html>")
}

/// Renders an article page with a title and one paragraph per entry.
#[must_use]
pub fn article_page(title: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<p>{}</p>", escape(p)))
        .collect();
    format!(
        "<html><head><title>{}</title><script>track();</script></head>\
         <body><nav>Menu</nav><article>{body}</article><footer>Footer</footer></body></html>",
        escape(title)
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
