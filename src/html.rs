use std::collections::HashMap;

use crate::dom::Dom;
use crate::{Error, Result};

/// Parses page markup into a DOM. Script and style bodies are kept as opaque
/// text; nothing is executed.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root()];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            if let Some(end) = find_subslice(bytes, i + 4, b"-->") {
                i = end + 3;
            } else {
                return Err(Error::HtmlParse("unclosed HTML comment".into()));
            }
            continue;
        }

        if starts_with_at(bytes, i, b"<!") {
            // Doctype and friends.
            while i < bytes.len() && bytes[i] != b'>' {
                i += 1;
            }
            i = (i + 1).min(bytes.len());
            continue;
        }

        if bytes[i] == b'<' {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;

                while stack.len() > 1 {
                    let top = *stack
                        .last()
                        .ok_or_else(|| Error::HtmlParse("invalid stack state".into()))?;
                    let top_tag = dom.tag_name(top).unwrap_or("");
                    let matched = top_tag.eq_ignore_ascii_case(&tag);
                    stack.pop();
                    if matched {
                        break;
                    }
                }
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if is_raw_text_tag(&tag) {
                let close = find_case_insensitive_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    if !body.is_empty() {
                        dom.create_text(node, body.to_string());
                    }
                }
                i = close;
                let (_, after_end) = parse_end_tag(html, i)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            if !text.is_empty() {
                let parent = *stack
                    .last()
                    .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                dom.create_text(parent, text.to_string());
            }
        }
    }

    dom.initialize_form_control_values()?;
    Ok(dom)
}

fn parse_start_tag(html: &str, at: usize) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

    skip_ws(bytes, &mut i);
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    if tag.is_empty() {
        return Err(Error::HtmlParse("empty tag name".into()));
    }

    let mut attrs = HashMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed start tag".into()));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
            self_closing = true;
            i += 2;
            break;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }
        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();
        if name.is_empty() {
            return Err(Error::HtmlParse(format!(
                "unexpected character in <{tag}> attributes"
            )));
        }

        skip_ws(bytes, &mut i);
        if bytes.get(i) != Some(&b'=') {
            attrs.insert(name, String::new());
            continue;
        }
        i += 1;
        skip_ws(bytes, &mut i);

        let value = match bytes.get(i) {
            Some(&quote @ (b'"' | b'\'')) => {
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i >= bytes.len() {
                    return Err(Error::HtmlParse("unclosed attribute value".into()));
                }
                let value = html
                    .get(value_start..i)
                    .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?
                    .to_string();
                i += 1;
                value
            }
            _ => {
                let value_start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'>'
                    && bytes[i] != b'/'
                {
                    i += 1;
                }
                html.get(value_start..i)
                    .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?
                    .to_string()
            }
        };
        attrs.insert(name, value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if !starts_with_at(bytes, i, b"</") {
        return Err(Error::HtmlParse("expected '</'".into()));
    }
    i += 2;

    skip_ws(bytes, &mut i);
    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }
    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag name".into()))?
        .to_ascii_lowercase();

    skip_ws(bytes, &mut i);
    if bytes.get(i) != Some(&b'>') {
        return Err(Error::HtmlParse(format!("unclosed end tag </{tag}>")));
    }
    Ok((tag, i + 1))
}

fn find_case_insensitive_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i + tag.len() + 2 <= bytes.len() {
        if starts_with_at(bytes, i, b"</") {
            let name = &bytes[i + 2..i + 2 + tag.len()];
            if name.eq_ignore_ascii_case(tag) {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

fn is_tag_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-'
}

fn is_attr_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte == b':'
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes.len() >= at + needle.len() && &bytes[at..at + needle.len()] == needle
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || bytes.len() < needle.len() {
        return None;
    }
    (from..=bytes.len() - needle.len()).find(|&i| &bytes[i..i + needle.len()] == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements_and_text() -> crate::Result<()> {
        let dom = parse_html("<div id='outer'><p id='inner'>hello</p></div>")?;
        let outer = dom.by_id("outer").unwrap();
        let inner = dom.by_id("inner").unwrap();
        assert_eq!(dom.tag_name(outer), Some("div"));
        assert_eq!(dom.parent(inner), Some(outer));
        assert_eq!(dom.text_content(inner), "hello");
        Ok(())
    }

    #[test]
    fn void_and_self_closing_tags_do_not_nest() -> crate::Result<()> {
        let dom = parse_html("<div id='box'><input id='field'><br/><span id='tail'>t</span></div>")?;
        let field = dom.by_id("field").unwrap();
        let tail = dom.by_id("tail").unwrap();
        let box_node = dom.by_id("box").unwrap();
        assert_eq!(dom.parent(field), Some(box_node));
        assert_eq!(dom.parent(tail), Some(box_node));
        Ok(())
    }

    #[test]
    fn comments_and_doctype_are_skipped() -> crate::Result<()> {
        let dom = parse_html("<!DOCTYPE html><!-- note --><p id='p'>x</p>")?;
        assert_eq!(dom.text_content(dom.by_id("p").unwrap()), "x");
        Ok(())
    }

    #[test]
    fn unclosed_comment_is_an_error() {
        let err = parse_html("<!-- dangling").unwrap_err();
        assert!(matches!(err, crate::Error::HtmlParse(_)));
    }

    #[test]
    fn script_bodies_are_swallowed_as_text() -> crate::Result<()> {
        let dom = parse_html("<script>if (a < b) { go(); }</script><p id='p'>ok</p>")?;
        assert_eq!(dom.text_content(dom.by_id("p").unwrap()), "ok");
        Ok(())
    }

    #[test]
    fn unquoted_and_bare_attributes_parse() -> crate::Result<()> {
        let dom = parse_html("<input id=field type=radio checked name='options' value=\"a\">")?;
        let field = dom.by_id("field").unwrap();
        assert_eq!(dom.attr(field, "type").as_deref(), Some("radio"));
        assert!(dom.checked(field)?);
        assert_eq!(dom.value(field)?, "a");
        Ok(())
    }
}
