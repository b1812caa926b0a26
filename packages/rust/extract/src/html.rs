//! Main-content selection and chrome stripping for fetched pages.

use scraper::{Html, Selector};

/// Ordered "main content" selectors; the first match wins.
const MAIN_SELECTORS: &[&str] = &[
    "article",
    "main",
    r#"[role="main"]"#,
    ".article-body",
    ".content",
];

/// Elements that never carry document content.
const NON_CONTENT_SELECTOR: &str =
    "script, style, noscript, nav, header, footer, aside, form, iframe";

/// Help-center boilerplate sub-sections removed from the selected region.
const BOILERPLATE_SELECTOR: &str =
    ".article-attachments, .article-meta, .article-votes, .article-comments";

/// Extract plain text from a raw HTML page: pick the main content region,
/// drop chrome and boilerplate, and join the remaining text nodes.
pub(crate) fn extract_page_text(html: &str) -> String {
    let doc = Html::parse_document(html);
    let region = select_region(&doc);
    let region = strip_elements(&region, NON_CONTENT_SELECTOR);
    let region = strip_elements(&region, BOILERPLATE_SELECTOR);
    fragment_text(&region)
}

/// Serialized HTML of the first matching main-content region, falling back
/// to `<body>` and finally the whole document.
fn select_region(doc: &Html) -> String {
    for sel_str in MAIN_SELECTORS {
        let sel = Selector::parse(sel_str).expect("valid selector");
        if let Some(el) = doc.select(&sel).next() {
            return el.html();
        }
    }

    let body_sel = Selector::parse("body").expect("valid selector");
    match doc.select(&body_sel).next() {
        Some(body) => body.html(),
        None => doc.root_element().html(),
    }
}

/// Remove every element matching `selector` from a serialized HTML fragment.
///
/// Works on scraper's own serialization so the string replacement always
/// matches what the parser produced.
fn strip_elements(html: &str, selector: &str) -> String {
    let frag = Html::parse_fragment(html);
    let sel = Selector::parse(selector).expect("valid selector");

    let mut result = html.to_string();
    for el in frag.select(&sel) {
        result = result.replace(&el.html(), "");
    }
    result
}

/// Collect the text nodes of a fragment, space-separated.
fn fragment_text(html: &str) -> String {
    let frag = Html::parse_fragment(html);
    frag.root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_region() {
        let html = r#"<html><body>
            <nav>Menu items</nav>
            <article><h1>Como gerar DANFE</h1><p>Passo um.</p></article>
            <footer>Copyright</footer>
        </body></html>"#;

        let text = extract_page_text(html);
        assert!(text.contains("Como gerar DANFE"));
        assert!(text.contains("Passo um."));
        assert!(!text.contains("Menu items"));
        assert!(!text.contains("Copyright"));
    }

    #[test]
    fn falls_back_to_article_body_class() {
        let html = r#"<html><body>
            <div class="article-body"><p>Conteúdo do artigo.</p></div>
        </body></html>"#;

        let text = extract_page_text(html);
        assert!(text.contains("Conteúdo do artigo."));
    }

    #[test]
    fn falls_back_to_full_body() {
        let html = "<html><body><p>Texto solto na página.</p></body></html>";
        let text = extract_page_text(html);
        assert!(text.contains("Texto solto na página."));
    }

    #[test]
    fn strips_scripts_inside_region() {
        let html = r#"<html><body><main>
            <p>Visible text.</p>
            <script>var hidden = "should not appear";</script>
            <style>.x { color: red; }</style>
        </main></body></html>"#;

        let text = extract_page_text(html);
        assert!(text.contains("Visible text."));
        assert!(!text.contains("should not appear"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn removes_help_center_boilerplate() {
        let html = r#"<html><body><article>
            <p>Resolução do problema.</p>
            <div class="article-votes">42 pessoas acharam útil</div>
            <section class="article-attachments">arquivo.xml</section>
            <div class="article-meta">Atualizado há 2 meses</div>
        </article></body></html>"#;

        let text = extract_page_text(html);
        assert!(text.contains("Resolução do problema."));
        assert!(!text.contains("acharam útil"));
        assert!(!text.contains("arquivo.xml"));
        assert!(!text.contains("Atualizado"));
    }
}
