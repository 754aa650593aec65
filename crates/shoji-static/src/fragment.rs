//! Fragment derivation for partial page loads.
//!
//! The client-side loader swaps only the content region on navigation, so
//! each rendered page gets a companion fragment: the outer markup of the
//! `<main id="content">` element.

use std::sync::LazyLock;

use regex::Regex;

/// Open tag of the content root element.
static CONTENT_ROOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<main\s+id="content"[^>]*>"#).expect("invalid content root regex")
});

/// Extract the content root element from a rendered page.
///
/// Returns the element's full outer markup, open tag through the matching
/// close tag; nested `<main>` elements are paired by depth count. `None`
/// when the page has no content root — callers fall back to the whole page.
pub fn extract_fragment(html: &str) -> Option<&str> {
    let open = CONTENT_ROOT.find(html)?;
    let mut depth = 1;
    let mut pos = open.end();

    loop {
        let close_at = html[pos..].find("</main>").map(|i| pos + i)?;
        match nested_main(&html[pos..close_at]) {
            Some(rel) => {
                depth += 1;
                pos = pos + rel + "<main".len();
            }
            None => {
                depth -= 1;
                pos = close_at + "</main>".len();
                if depth == 0 {
                    return Some(&html[open.start()..pos]);
                }
            }
        }
    }
}

/// First `<main` open tag within `segment`, if any.
fn nested_main(segment: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(rel) = segment[from..].find("<main") {
        let at = from + rel;
        match segment[at + "<main".len()..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => return Some(at),
            _ => from = at + 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_content_root_and_excludes_chrome() {
        let html = r#"<body><header>Y-chrome</header><main id="content"><p>X</p></main><footer>Y-chrome</footer></body>"#;

        let fragment = extract_fragment(html).unwrap();

        assert_eq!(fragment, r#"<main id="content"><p>X</p></main>"#);
        assert!(fragment.contains("X"));
        assert!(!fragment.contains("Y-chrome"));
    }

    #[test]
    fn keeps_extra_attributes_on_the_content_root() {
        let html = r#"<main id="content" class="prose">body</main>"#;

        assert_eq!(extract_fragment(html).unwrap(), html);
    }

    #[test]
    fn pairs_nested_main_elements() {
        let html = r#"<main id="content">a<main class="inner">b</main>c</main>"#;

        assert_eq!(extract_fragment(html).unwrap(), html);
    }

    #[test]
    fn missing_content_root_yields_none() {
        assert!(extract_fragment("<body><div>no main</div></body>").is_none());
    }

    #[test]
    fn unclosed_content_root_yields_none() {
        assert!(extract_fragment(r#"<main id="content">never closed"#).is_none());
    }

    #[test]
    fn plain_main_without_content_id_is_not_a_root() {
        assert!(extract_fragment("<main>just a main</main>").is_none());
    }
}
