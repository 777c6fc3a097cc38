//! Lenient HTML fragment parser.
//!
//! Clipboard and drop payloads arrive as arbitrary markup, so the parser
//! never fails: malformed constructs degrade to text or are skipped, open
//! elements are auto-closed at end of input, and unmatched close tags are
//! dropped. The output is detached arena nodes owned by the target [`Dom`].

use super::{Dom, NodeId, is_void_tag};

/// Parses `html` into detached nodes inside `dom`, returning the top-level
/// nodes in document order.
pub fn parse_fragment(dom: &mut Dom, html: &str) -> Vec<NodeId> {
    let bytes = html.as_bytes();
    let mut roots: Vec<NodeId> = Vec::new();
    // Open-element stack; text and finished elements attach to the top.
    let mut open: Vec<NodeId> = Vec::new();
    let mut index = 0;
    let mut text_start = 0;

    while index < bytes.len() {
        if bytes[index] != b'<' {
            index += 1;
            continue;
        }

        // Flush the text run preceding this tag.
        if text_start < index {
            flush_text(dom, &html[text_start..index], &open, &mut roots);
        }

        if html[index..].starts_with("<!--") {
            let end = html[index..]
                .find("-->")
                .map(|pos| index + pos + 3)
                .unwrap_or(bytes.len());
            index = end;
            text_start = index;
            continue;
        }
        if html[index..].starts_with("<!") || html[index..].starts_with("<?") {
            let end = html[index..]
                .find('>')
                .map(|pos| index + pos + 1)
                .unwrap_or(bytes.len());
            index = end;
            text_start = index;
            continue;
        }

        let Some(close_pos) = html[index..].find('>') else {
            // Unterminated tag: treat the remainder as text. The run before
            // the `<` was already flushed above.
            text_start = index;
            break;
        };
        let tag_end = index + close_pos;
        let raw = &html[index + 1..tag_end];
        index = tag_end + 1;
        text_start = index;

        if let Some(name) = raw.strip_prefix('/') {
            close_element(dom, name.trim(), &mut open);
            continue;
        }

        let self_closing = raw.ends_with('/');
        let raw = raw.strip_suffix('/').unwrap_or(raw);
        let Some((name, attrs)) = parse_tag_body(raw) else {
            continue;
        };

        let element = dom.create_element(&name);
        for (attr_name, attr_value) in attrs {
            dom.set_attr(element, &attr_name, &decode_entities(&attr_value));
        }
        attach(dom, element, &open, &mut roots);
        if !self_closing && !is_void_tag(&name) {
            open.push(element);
        }
    }

    if text_start < bytes.len() {
        flush_text(dom, &html[text_start..], &open, &mut roots);
    }

    roots
}

fn flush_text(dom: &mut Dom, raw: &str, open: &[NodeId], roots: &mut Vec<NodeId>) {
    let decoded = decode_entities(raw);
    if decoded.is_empty() {
        return;
    }
    let text = dom.create_text(&decoded);
    attach(dom, text, open, roots);
}

fn attach(dom: &mut Dom, node: NodeId, open: &[NodeId], roots: &mut Vec<NodeId>) {
    match open.last() {
        Some(&parent) => {
            // Appending a fresh node into a detached parent cannot cycle.
            let _ = dom.append_child(parent, node);
        }
        None => roots.push(node),
    }
}

fn close_element(dom: &Dom, name: &str, open: &mut Vec<NodeId>) {
    let name = name.to_ascii_lowercase();
    // Implicitly closes anything left open above the match; an unmatched
    // close tag is dropped.
    if let Some(pos) = open
        .iter()
        .rposition(|&id| dom.tag(id) == Some(name.as_str()))
    {
        open.truncate(pos);
    }
}

/// Splits a tag body into its name and attribute list. Returns `None` for
/// bodies that cannot name an element.
fn parse_tag_body(raw: &str) -> Option<(String, Vec<(String, String)>)> {
    let raw = raw.trim();
    let name_end = raw
        .find(|ch: char| ch.is_whitespace())
        .unwrap_or(raw.len());
    let name = raw[..name_end].to_ascii_lowercase();
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-') {
        return None;
    }

    let mut attrs = Vec::new();
    let rest = &raw[name_end..];
    let bytes = rest.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        while index < bytes.len() && bytes[index].is_ascii_whitespace() {
            index += 1;
        }
        if index >= bytes.len() {
            break;
        }
        let attr_start = index;
        while index < bytes.len()
            && !bytes[index].is_ascii_whitespace()
            && bytes[index] != b'='
        {
            index += 1;
        }
        let attr_name = rest[attr_start..index].to_ascii_lowercase();
        if attr_name.is_empty() {
            index += 1;
            continue;
        }

        while index < bytes.len() && bytes[index].is_ascii_whitespace() {
            index += 1;
        }
        if index >= bytes.len() || bytes[index] != b'=' {
            attrs.push((attr_name, String::new()));
            continue;
        }
        index += 1;
        while index < bytes.len() && bytes[index].is_ascii_whitespace() {
            index += 1;
        }
        let value = if index < bytes.len() && (bytes[index] == b'"' || bytes[index] == b'\'') {
            let quote = bytes[index];
            index += 1;
            let value_start = index;
            while index < bytes.len() && bytes[index] != quote {
                index += 1;
            }
            let value = rest[value_start..index].to_string();
            index = (index + 1).min(bytes.len());
            value
        } else {
            let value_start = index;
            while index < bytes.len() && !bytes[index].is_ascii_whitespace() {
                index += 1;
            }
            rest[value_start..index].to_string()
        };
        attrs.push((attr_name, value));
    }

    Some((name, attrs))
}

/// Decodes the entity forms the serializer and common clipboard sources
/// produce. Unknown entities pass through literally.
pub fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] != b'&' {
            let ch_len = utf8_len(bytes[index]);
            out.push_str(&text[index..index + ch_len]);
            index += ch_len;
            continue;
        }
        let Some(semi) = text[index..].find(';').filter(|&pos| pos <= 10) else {
            out.push('&');
            index += 1;
            continue;
        };
        let entity = &text[index + 1..index + semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            _ => entity
                .strip_prefix('#')
                .and_then(|digits| {
                    if let Some(hex) = digits.strip_prefix('x').or(digits.strip_prefix('X')) {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        digits.parse::<u32>().ok()
                    }
                })
                .and_then(char::from_u32),
        };
        match decoded {
            Some(ch) => {
                out.push(ch);
                index += semi + 1;
            }
            None => {
                out.push('&');
                index += 1;
            }
        }
    }
    out
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        byte if byte < 0x80 => 1,
        byte if byte >= 0xF0 => 4,
        byte if byte >= 0xE0 => 3,
        _ => 2,
    }
}
