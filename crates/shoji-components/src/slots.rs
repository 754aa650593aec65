//! Slot extraction and filling.
//!
//! A component usage passes content to its template through slots:
//!
//! - named:   `<span slot="title">Hello</span>` fills `<slot name="title">`
//! - default: everything else fills the bare `<slot>`
//!
//! Template placeholders keep their own inner markup as fallback content
//! when the usage supplies nothing for them.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Slot content captured from one usage, keyed by slot name.
/// The default slot lives under the empty-string key.
pub type SlotMap = HashMap<String, String>;

/// Any open tag with an attribute list.
static OPEN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z][A-Za-z0-9]*)((?:\s[^>]*)?)>").expect("invalid open tag regex")
});

/// A `slot="..."` attribute, preceded by whitespace so `data-slot` and
/// friends don't match.
static SLOT_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\sslot="([^"]*)""#).expect("invalid slot attribute regex"));

/// Named placeholder in a template: `<slot name="x">fallback</slot>`.
static NAMED_SLOT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<slot\s+name="([^"]*)"\s*>(.*?)</slot>"#).expect("invalid named slot regex")
});

/// Default placeholder in a template: `<slot>fallback</slot>`.
static DEFAULT_SLOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<slot\s*>(.*?)</slot>").expect("invalid default slot regex"));

/// Extract slot content from the inner markup of one component usage.
///
/// Child elements carrying a `slot` attribute are captured under their slot
/// name (content runs to the first close tag of the child's element name and
/// is trimmed; a later same-named child overwrites an earlier one) and removed
/// from the markup. Whatever remains, trimmed, becomes the default content.
///
/// A slotted child with no close tag is not treated as a slot at all; it
/// stays in the default content. Lenient on purpose.
pub fn extract_slots(inner: &str) -> SlotMap {
    let mut slots = SlotMap::new();
    let mut kept = String::with_capacity(inner.len());
    let mut cursor = 0;

    while cursor < inner.len() {
        let Some(caps) = OPEN_TAG.captures_at(inner, cursor) else {
            break;
        };
        let open = caps.get(0).expect("regex match has a whole-match group");
        let name = &caps[1];
        let attrs = caps.get(2).map_or("", |m| m.as_str());

        let Some(slot) = SLOT_ATTR.captures(attrs) else {
            kept.push_str(&inner[cursor..open.end()]);
            cursor = open.end();
            continue;
        };

        let close = format!("</{name}>");
        let Some(rel) = inner[open.end()..].find(&close) else {
            // unterminated slotted child, leave it in the default content
            kept.push_str(&inner[cursor..open.end()]);
            cursor = open.end();
            continue;
        };

        let content = &inner[open.end()..open.end() + rel];
        slots.insert(slot[1].to_string(), content.trim().to_string());

        kept.push_str(&inner[cursor..open.start()]);
        cursor = open.end() + rel + close.len();
    }
    kept.push_str(&inner[cursor..]);

    let default = kept.trim();
    if !default.is_empty() {
        slots.insert(String::new(), default.to_string());
    }

    slots
}

/// Fill a template's `<slot>` placeholders from extracted slot content.
///
/// Every named placeholder receives the map's value for its name, or its own
/// fallback markup verbatim when the usage supplied nothing. The default
/// placeholder works the same way under the empty-string key. Slot values
/// with no matching placeholder are dropped silently.
pub fn fill_slots(template: &str, slots: &SlotMap) -> String {
    let filled = NAMED_SLOT.replace_all(template, |caps: &regex::Captures| {
        match slots.get(&caps[1]) {
            Some(content) => content.clone(),
            None => caps[2].to_string(),
        }
    });

    DEFAULT_SLOT
        .replace_all(&filled, |caps: &regex::Captures| match slots.get("") {
            Some(content) => content.clone(),
            None => caps[1].to_string(),
        })
        .into_owned()
}
