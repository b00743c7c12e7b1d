//! Rebuild a document outline from the `<hN id="...">` elements in rendered HTML.

use log::warn;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use std::cell::RefCell;
use std::rc::Rc;

use crate::OutlineNode;

#[derive(Default)]
struct ScannedHeading {
    level: u8,
    id: Option<String>,
    text: String,
}

/// Collect every `h1`..`h6` in document order with its id (if any) and text content.
fn scan_headings(html: &str) -> Vec<ScannedHeading> {
    let headings: Rc<RefCell<Vec<ScannedHeading>>> = Rc::new(RefCell::new(Vec::new()));

    let mut handlers = Vec::with_capacity(12);
    for level in 1..=6u8 {
        let tag = format!("h{level}");
        handlers.push(element!(tag.as_str(), {
            let headings = Rc::clone(&headings);
            move |el| {
                headings.borrow_mut().push(ScannedHeading {
                    level,
                    id: el.get_attribute("id"),
                    text: String::new(),
                });
                Ok(())
            }
        }));
        handlers.push(text!(tag.as_str(), {
            let headings = Rc::clone(&headings);
            move |t| {
                if let Some(current) = headings.borrow_mut().last_mut() {
                    current.text.push_str(t.as_str());
                }
                Ok(())
            }
        }));
    }

    if let Err(e) = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: handlers,
            ..RewriteStrSettings::default()
        },
    ) {
        warn!("Outline scan stopped early: {}", e);
    }

    Rc::try_unwrap(headings)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.take())
}

/// Decode the handful of entities a renderer emits in heading text.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Build the outline forest for `html`.
///
/// Headings without an `id` cannot be linked to and are skipped. A heading closes every open
/// heading at the same or a deeper level; skipped levels are fine and simply nest under the
/// nearest shallower heading.
pub fn build_outline(html: &str) -> Vec<OutlineNode> {
    let mut roots: Vec<OutlineNode> = Vec::new();
    // Open headings, shallowest first. Each one is attached to its parent when it closes.
    let mut stack: Vec<OutlineNode> = Vec::new();

    for heading in scan_headings(html) {
        let Some(id) = heading.id.filter(|id| !id.is_empty()) else {
            continue;
        };
        while stack.last().is_some_and(|top| top.level >= heading.level) {
            close_top(&mut stack, &mut roots);
        }
        stack.push(OutlineNode::new(
            decode_entities(heading.text.trim()),
            id,
            heading.level,
        ));
    }
    while !stack.is_empty() {
        close_top(&mut stack, &mut roots);
    }
    roots
}

fn close_top(stack: &mut Vec<OutlineNode>, roots: &mut Vec<OutlineNode>) {
    if let Some(node) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => roots.push(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_decoded_once() {
        assert_eq!(decode_entities("A &amp; B &lt;c&gt;"), "A & B <c>");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn nested_inline_text_is_included() {
        let outline = build_outline(r#"<h2 id="api">The <code>render</code> call</h2>"#);
        assert_eq!(outline.len(), 1);
        assert_eq!(outline[0].title, "The render call");
    }
}
