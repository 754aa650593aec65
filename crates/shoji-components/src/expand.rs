//! Component expansion engine.
//!
//! Page markup is parsed into a flat node list where only registered
//! component tags become structure; everything else is opaque text. Usages
//! resolve in a post-order walk: a usage's children collapse to plain markup
//! first, then its slots are read, its template filled, and the filled
//! markup expanded in turn. Outside-in expansion would capture unexpanded
//! child tags as opaque slot text, so the order is load-bearing.

use thiserror::Error;

use crate::registry::ComponentRegistry;
use crate::slots::{extract_slots, fill_slots};

/// Errors from component expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// A registered tag occurs in the document but never collapses —
    /// an unclosed usage, a stray close tag, or a self-closing form.
    #[error("unresolved component tag <{tag}>")]
    UnresolvedTag { tag: String },

    /// A template re-introduces, directly or transitively, a usage of a tag
    /// that is currently being expanded. Without this check expansion would
    /// never reach a fixpoint.
    #[error("cyclic component reference: {chain}")]
    CyclicReference { chain: String },
}

/// A parsed region of page markup.
#[derive(Debug)]
enum Node {
    Text(String),
    Usage { tag: String, children: Vec<Node> },
}

/// Expands component usages against a loaded registry.
pub struct Expander<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> Expander<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    /// Expand every component usage in `source`.
    ///
    /// Markup free of registered tags comes back byte-identical; with an
    /// empty registry the whole call is a pass-through. On success the
    /// result contains no marker of any registered tag.
    pub fn expand(&self, source: &str) -> Result<String, ExpandError> {
        if self.registry.is_empty() {
            return Ok(source.to_string());
        }

        let mut stack = Vec::new();
        let out = self.expand_markup(source, &mut stack)?;
        self.check_resolved(&out)?;
        Ok(out)
    }

    fn expand_markup(
        &self,
        source: &str,
        stack: &mut Vec<String>,
    ) -> Result<String, ExpandError> {
        let nodes = parse_nodes(source, self.registry)?;

        let mut out = String::with_capacity(source.len());
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(&text),
                Node::Usage { tag, children } => {
                    out.push_str(&self.expand_usage(&tag, children, stack)?)
                }
            }
        }
        Ok(out)
    }

    fn expand_usage(
        &self,
        tag: &str,
        children: Vec<Node>,
        stack: &mut Vec<String>,
    ) -> Result<String, ExpandError> {
        // Children collapse before the parent's slots are read, so slot
        // content is always fully expanded markup.
        let mut inner = String::new();
        for child in children {
            match child {
                Node::Text(text) => inner.push_str(&text),
                Node::Usage { tag, children } => {
                    inner.push_str(&self.expand_usage(&tag, children, stack)?)
                }
            }
        }

        if stack.iter().any(|active| active == tag) {
            let chain = stack
                .iter()
                .map(String::as_str)
                .chain([tag])
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(ExpandError::CyclicReference { chain });
        }

        let template = self
            .registry
            .get(tag)
            .expect("parser only emits usages of registered tags");

        let slots = extract_slots(&inner);
        let filled = fill_slots(&template.markup, &slots);

        // The filled template may use other components; expand it with this
        // tag marked in-progress so template cycles surface as errors.
        stack.push(tag.to_string());
        let expanded = self.expand_markup(&filled, stack);
        stack.pop();
        expanded
    }

    /// Scan for surviving markers of registered tags. The parser only
    /// resolves well-formed usages, so a stray close tag or self-closing
    /// form would otherwise ride through silently.
    fn check_resolved(&self, out: &str) -> Result<(), ExpandError> {
        let mut pos = 0;
        while let Some(lt) = out[pos..].find('<') {
            let at = pos + lt;
            let rest = &out[at + 1..];
            let name = scan_tag_name(rest.strip_prefix('/').unwrap_or(rest));
            if !name.is_empty() && self.registry.contains(name) {
                return Err(ExpandError::UnresolvedTag {
                    tag: name.to_string(),
                });
            }
            pos = at + 1;
        }
        Ok(())
    }
}

/// Parse markup into text and component usage nodes. Only registered tag
/// names produce usages; nested same-name usages pair up by depth count.
fn parse_nodes(source: &str, registry: &ComponentRegistry) -> Result<Vec<Node>, ExpandError> {
    let mut nodes = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(lt) = source[pos..].find('<') {
        let open_at = pos + lt;
        let name = scan_tag_name(&source[open_at + 1..]);
        if name.is_empty() || !registry.contains(name) {
            pos = open_at + 1;
            continue;
        }

        let name_end = open_at + 1 + name.len();
        match source[name_end..].chars().next() {
            // `<tag>` or `<tag attr...>`; anything else (e.g. `<tag/>`)
            // is left for check_resolved to reject
            Some(c) if c == '>' || c.is_whitespace() => {}
            _ => {
                pos = open_at + 1;
                continue;
            }
        }

        let Some(gt) = source[name_end..].find('>') else {
            return Err(ExpandError::UnresolvedTag {
                tag: name.to_string(),
            });
        };
        let open_end = name_end + gt + 1;

        let Some((inner_end, usage_end)) = find_matching_close(source, name, open_end) else {
            return Err(ExpandError::UnresolvedTag {
                tag: name.to_string(),
            });
        };

        if open_at > text_start {
            nodes.push(Node::Text(source[text_start..open_at].to_string()));
        }
        let children = parse_nodes(&source[open_end..inner_end], registry)?;
        nodes.push(Node::Usage {
            tag: name.to_string(),
            children,
        });

        pos = usage_end;
        text_start = usage_end;
    }

    if text_start < source.len() {
        nodes.push(Node::Text(source[text_start..].to_string()));
    }

    Ok(nodes)
}

/// Leading run of tag-name characters.
fn scan_tag_name(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '-')
        .unwrap_or(s.len());
    &s[..end]
}

/// Find the close tag matching an open tag of `tag`, counting nested
/// same-name opens. Returns (inner end, end of close tag).
fn find_matching_close(source: &str, tag: &str, from: usize) -> Option<(usize, usize)> {
    let close = format!("</{tag}>");
    let mut depth = 1;
    let mut pos = from;

    loop {
        let close_at = source[pos..].find(&close).map(|i| pos + i)?;
        match nested_open(&source[pos..close_at], tag) {
            Some(rel) => {
                depth += 1;
                pos = pos + rel + 1 + tag.len();
            }
            None => {
                depth -= 1;
                if depth == 0 {
                    return Some((close_at, close_at + close.len()));
                }
                pos = close_at + close.len();
            }
        }
    }
}

/// First open tag of `tag` within `segment`, if any.
fn nested_open(segment: &str, tag: &str) -> Option<usize> {
    let open = format!("<{tag}");
    let mut from = 0;
    while let Some(rel) = segment[from..].find(&open) {
        let at = from + rel;
        match segment[at + open.len()..].chars().next() {
            Some(c) if c == '>' || c.is_whitespace() => return Some(at),
            _ => from = at + 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentRegistry;
    use std::fs;
    use tempfile::tempdir;

    fn registry(templates: &[(&str, &str)]) -> ComponentRegistry {
        let temp = tempdir().unwrap();
        for (tag, markup) in templates {
            fs::write(temp.path().join(format!("{tag}.html")), markup).unwrap();
        }
        ComponentRegistry::load(temp.path()).unwrap()
    }

    #[test]
    fn passes_through_markup_without_usages() {
        let registry = registry(&[("greeting-box", "<div>hi</div>")]);
        let expander = Expander::new(&registry);

        let page = "<html><body><p>plain</p></body></html>";
        assert_eq!(expander.expand(page).unwrap(), page);
    }

    #[test]
    fn empty_registry_is_a_pass_through() {
        let registry = ComponentRegistry::new();
        let expander = Expander::new(&registry);

        let page = "<greeting-box>anything</greeting-box>";
        assert_eq!(expander.expand(page).unwrap(), page);
    }

    #[test]
    fn fills_fallbacks_for_empty_usage() {
        let registry = registry(&[(
            "greeting-box",
            r#"<div><slot name="title">Hi</slot>: <slot>nobody</slot></div>"#,
        )]);
        let expander = Expander::new(&registry);

        let out = expander
            .expand("<greeting-box></greeting-box>")
            .unwrap();

        assert_eq!(out, "<div>Hi: nobody</div>");
    }

    #[test]
    fn supplied_slots_override_fallbacks() {
        let registry = registry(&[(
            "greeting-box",
            r#"<div><slot name="title">Hi</slot>: <slot>nobody</slot></div>"#,
        )]);
        let expander = Expander::new(&registry);

        let out = expander
            .expand(r#"<greeting-box><span slot="title">Hello</span>World</greeting-box>"#)
            .unwrap();

        assert_eq!(out, "<div>Hello: World</div>");
        assert!(!out.contains("Hi"));
        assert!(!out.contains("nobody"));
    }

    #[test]
    fn attributes_on_usages_are_ignored() {
        let registry = registry(&[("call-out", "<aside><slot>empty</slot></aside>")]);
        let expander = Expander::new(&registry);

        let out = expander
            .expand(r#"<call-out class="wide" data-x="1">note</call-out>"#)
            .unwrap();

        assert_eq!(out, "<aside>note</aside>");
    }

    #[test]
    fn inner_components_expand_before_outer_slots_are_read() {
        let registry = registry(&[
            ("outer-box", "<section><slot>none</slot></section>"),
            ("inner-box", "<em>inner</em>"),
        ]);
        let expander = Expander::new(&registry);

        let out = expander
            .expand("<outer-box><inner-box></inner-box></outer-box>")
            .unwrap();

        assert_eq!(out, "<section><em>inner</em></section>");
        assert!(!out.contains("<outer-box"));
        assert!(!out.contains("<inner-box"));
    }

    #[test]
    fn templates_may_use_other_components() {
        let registry = registry(&[
            ("page-shell", "<body><site-nav></site-nav><slot></slot></body>"),
            ("site-nav", "<nav>links</nav>"),
        ]);
        let expander = Expander::new(&registry);

        let out = expander
            .expand("<page-shell>content</page-shell>")
            .unwrap();

        assert_eq!(out, "<body><nav>links</nav>content</body>");
    }

    #[test]
    fn nested_same_name_usages_pair_correctly() {
        let registry = registry(&[("card-box", "[<slot></slot>]")]);
        let expander = Expander::new(&registry);

        let out = expander
            .expand("<card-box><card-box>x</card-box></card-box>")
            .unwrap();

        assert_eq!(out, "[[x]]");
    }

    #[test]
    fn expansion_is_deterministic() {
        let registry = registry(&[
            ("greeting-box", r#"<div><slot name="title">Hi</slot>: <slot>nobody</slot></div>"#),
            ("site-nav", "<nav><slot>home</slot></nav>"),
        ]);
        let expander = Expander::new(&registry);

        let page = r#"<site-nav></site-nav><greeting-box><b slot="title">T</b>body</greeting-box>"#;
        let first = expander.expand(page).unwrap();
        let second = expander.expand(page).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn unclosed_usage_is_an_error() {
        let registry = registry(&[("greeting-box", "<div></div>")]);
        let expander = Expander::new(&registry);

        let err = expander.expand("<greeting-box>never closed").unwrap_err();

        assert!(matches!(err, ExpandError::UnresolvedTag { tag } if tag == "greeting-box"));
    }

    #[test]
    fn stray_close_tag_is_an_error() {
        let registry = registry(&[("greeting-box", "<div></div>")]);
        let expander = Expander::new(&registry);

        let err = expander.expand("text </greeting-box> more").unwrap_err();

        assert!(matches!(err, ExpandError::UnresolvedTag { tag } if tag == "greeting-box"));
    }

    #[test]
    fn self_closing_usage_is_an_error() {
        let registry = registry(&[("greeting-box", "<div></div>")]);
        let expander = Expander::new(&registry);

        let err = expander.expand("<greeting-box/>").unwrap_err();

        assert!(matches!(err, ExpandError::UnresolvedTag { .. }));
    }

    #[test]
    fn self_referential_template_is_a_cycle() {
        let registry = registry(&[("loop-box", "<loop-box></loop-box>")]);
        let expander = Expander::new(&registry);

        let err = expander.expand("<loop-box></loop-box>").unwrap_err();

        assert!(matches!(err, ExpandError::CyclicReference { .. }));
    }

    #[test]
    fn transitive_cycle_is_detected() {
        let registry = registry(&[
            ("ping-box", "<pong-box></pong-box>"),
            ("pong-box", "<ping-box></ping-box>"),
        ]);
        let expander = Expander::new(&registry);

        let err = expander.expand("<ping-box></ping-box>").unwrap_err();

        match err {
            ExpandError::CyclicReference { chain } => {
                assert!(chain.contains("ping-box"));
                assert!(chain.contains("pong-box"));
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    #[test]
    fn longer_tag_with_registered_prefix_is_not_a_usage() {
        let registry = registry(&[("nav-bar", "<nav></nav>")]);
        let expander = Expander::new(&registry);

        let page = "<nav-bar-wide>text</nav-bar-wide>";
        assert_eq!(expander.expand(page).unwrap(), page);
    }
}
