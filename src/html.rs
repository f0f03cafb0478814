use super::*;

/// Start tags that implicitly close an open element, and the ancestors that
/// bound the search for it.
struct ImpliedEndTag {
    opened: &'static [&'static str],
    closes: &'static [&'static str],
    scope: &'static [&'static str],
}

const IMPLIED_END_TAGS: &[ImpliedEndTag] = &[
    ImpliedEndTag {
        opened: &["li"],
        closes: &["li"],
        scope: &["ol", "ul", "menu"],
    },
    ImpliedEndTag {
        opened: &["dt", "dd"],
        closes: &["dt", "dd"],
        scope: &["dl"],
    },
    ImpliedEndTag {
        opened: &["option", "optgroup"],
        closes: &["option"],
        scope: &["optgroup", "select", "datalist"],
    },
    ImpliedEndTag {
        opened: &["optgroup"],
        closes: &["optgroup"],
        scope: &["select"],
    },
    ImpliedEndTag {
        opened: &[
            "address", "article", "aside", "blockquote", "details", "div", "dl", "fieldset",
            "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header",
            "hr", "main", "nav", "ol", "p", "pre", "section", "table", "ul",
        ],
        closes: &["p"],
        scope: &[],
    },
];

/// Elements whose body is taken verbatim up to the matching end tag.
const RAW_TEXT_TAGS: &[&str] = &["script", "style", "textarea", "title"];

pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = Dom::new();
    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            let end = find_subslice(bytes, i + 4, b"-->")
                .ok_or_else(|| Error::HtmlParse("unclosed HTML comment".into()))?;
            i = end + 3;
            continue;
        }

        if bytes[i] == b'<' && is_markup_start(bytes, i) {
            if starts_with_at(bytes, i, b"</") {
                let (tag, next) = parse_end_tag(html, i)?;
                i = next;
                close_open_element(&dom, &mut stack, &tag);
                continue;
            }

            if starts_with_at(bytes, i, b"<!") {
                i = parse_declaration_tag(html, i)?;
                continue;
            }

            let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
            i = next;
            close_implied_end_tags(&dom, &mut stack, &tag);

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(parent, tag.clone(), attrs);

            if !self_closing && RAW_TEXT_TAGS.contains(&tag.as_str()) {
                let close = find_case_insensitive_raw_end_tag(bytes, i, tag.as_bytes())
                    .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
                if let Some(body) = html.get(i..close) {
                    let body = if tag == "textarea" || tag == "title" {
                        decode_html_character_references(body)
                    } else {
                        body.to_string()
                    };
                    if !body.is_empty() {
                        dom.create_text(node, body);
                    }
                }
                let (_, after_end) = parse_end_tag(html, close)?;
                i = after_end;
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && !(bytes[i] == b'<' && is_markup_start(bytes, i)) {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let decoded = decode_html_character_references(text);
            if !decoded.is_empty() {
                dom.create_text(parent, decoded);
            }
        }
    }

    dom.initialize_form_control_values()?;
    Ok(dom)
}

// A '<' only opens markup when followed by a tag name, '/', or '!'.
fn is_markup_start(bytes: &[u8], at: usize) -> bool {
    matches!(bytes.get(at + 1), Some(b) if b.is_ascii_alphabetic() || *b == b'/' || *b == b'!')
}

fn close_open_element(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    let Some(index) = (1..stack.len())
        .rev()
        .find(|index| dom.tag_name(stack[*index]) == Some(tag))
    else {
        // Stray end tag with no open element.
        return;
    };
    stack.truncate(index);
}

fn close_implied_end_tags(dom: &Dom, stack: &mut Vec<NodeId>, tag: &str) {
    for rule in IMPLIED_END_TAGS {
        if !rule.opened.contains(&tag) {
            continue;
        }

        let mut close_index = None;
        for index in (1..stack.len()).rev() {
            let Some(open_tag) = dom.tag_name(stack[index]) else {
                continue;
            };
            if rule.closes.contains(&open_tag) {
                close_index = Some(index);
                break;
            }
            if rule.scope.contains(&open_tag) {
                break;
            }
        }

        if let Some(index) = close_index {
            stack.truncate(index);
        }
    }
}

fn decode_html_character_references(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    fn decode_numeric(value: &str) -> Option<char> {
        let codepoint =
            if let Some(hex) = value.strip_prefix('x').or_else(|| value.strip_prefix('X')) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                value.parse::<u32>().ok()?
            };
        char::from_u32(codepoint)
    }

    fn decode_named(value: &str) -> Option<char> {
        match value {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            "nbsp" => Some('\u{00A0}'),
            "times" => Some('×'),
            "copy" => Some('©'),
            "reg" => Some('®'),
            "trade" => Some('™'),
            "euro" => Some('€'),
            "pound" => Some('£'),
            "yen" => Some('¥'),
            "ndash" => Some('–'),
            "mdash" => Some('—'),
            "hellip" => Some('…'),
            "middot" => Some('·'),
            "laquo" => Some('«'),
            "raquo" => Some('»'),
            "ldquo" => Some('“'),
            "rdquo" => Some('”'),
            "lsquo" => Some('‘'),
            "rsquo" => Some('’'),
            "frac12" => Some('½'),
            "deg" => Some('°'),
            _ => None,
        }
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let token_len = tail
            .char_indices()
            .find(|(_, ch)| !(ch.is_ascii_alphanumeric() || *ch == '#'))
            .map(|(idx, _)| idx)
            .unwrap_or(tail.len());
        let raw = &tail[..token_len];
        let decoded = match raw.strip_prefix('#') {
            Some(numeric) => decode_numeric(numeric),
            None => decode_named(raw),
        };

        match decoded {
            Some(ch) if token_len > 0 => {
                out.push(ch);
                let consumed = if tail[token_len..].starts_with(';') {
                    token_len + 1
                } else {
                    token_len
                };
                rest = &tail[consumed..];
            }
            _ => {
                out.push('&');
                rest = tail;
            }
        }
    }

    out.push_str(rest);
    out
}

fn parse_start_tag(
    html: &str,
    at: usize,
) -> Result<(String, HashMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at;
    if bytes.get(i) != Some(&b'<') {
        return Err(Error::HtmlParse("expected '<'".into()));
    }
    i += 1;

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
            return Err(Error::HtmlParse(format!("unclosed start tag <{tag}>")));
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

        if !is_attr_name_char(bytes[i]) {
            // Skip junk fragments the way browsers recover from them.
            while i < bytes.len()
                && !bytes[i].is_ascii_whitespace()
                && bytes[i] != b'>'
                && !(bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>'))
            {
                i += 1;
            }
            continue;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        skip_ws(bytes, &mut i);

        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, bytes, &mut i)?
        } else {
            String::new()
        };

        // First occurrence of a duplicated attribute wins.
        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_declaration_tag(html: &str, at: usize) -> Result<usize> {
    let bytes = html.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = at + 2;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'\'' || b == b'"' => quote = Some(b),
            None if b == b'>' => return Ok(i + 1),
            None => {}
        }
        i += 1;
    }

    Err(Error::HtmlParse("unclosed declaration tag".into()))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    if !starts_with_at(bytes, at, b"</") {
        return Err(Error::HtmlParse("expected end tag".into()));
    }
    let mut i = at + 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse(format!("unclosed end tag </{tag}")));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
        *i += 1;
        return Ok(decode_html_character_references(value));
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !(bytes[*i] == b'/' && bytes.get(*i + 1) == Some(&b'>'))
    {
        *i += 1;
    }

    let value = html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?;
    Ok(decode_html_character_references(value))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'@' | b'.')
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

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .is_some_and(|window| window == needle)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

fn find_case_insensitive_raw_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == b'<' && bytes.get(i + 1) == Some(&b'/') {
            let mut j = i + 2;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let tag_end = j + tag.len();
            if tag_end <= bytes.len()
                && bytes[j..tag_end].eq_ignore_ascii_case(tag)
                && bytes
                    .get(tag_end)
                    .is_none_or(|after| !after.is_ascii_alphanumeric())
            {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_markup_with_entities() -> Result<()> {
        let dom = parse_html(
            r#"<!DOCTYPE html>
               <div class="product-card-container">
                 <h5 class="product-title">Ben &amp; Jerry&#39;s</h5>
                 <p class="product-description">Price &lt; $5</p>
               </div>"#,
        )?;
        let title = dom
            .query_selector(".product-title")?
            .ok_or_else(|| Error::SelectorNotFound(".product-title".into()))?;
        assert_eq!(dom.text_content(title), "Ben & Jerry's");
        let desc = dom
            .query_selector(".product-description")?
            .ok_or_else(|| Error::SelectorNotFound(".product-description".into()))?;
        assert_eq!(dom.text_content(desc), "Price < $5");
        Ok(())
    }

    #[test]
    fn script_bodies_are_kept_as_raw_text() -> Result<()> {
        let dom = parse_html(
            r#"<script>if (a < b && c > d) { x = "</div>"; }</script><p id="after">ok</p>"#,
        )?;
        assert!(dom.by_id("after").is_some());
        let script = dom
            .query_selector("script")?
            .ok_or_else(|| Error::SelectorNotFound("script".into()))?;
        assert!(dom.text_content(script).contains("a < b && c > d"));
        Ok(())
    }

    #[test]
    fn unclosed_options_and_list_items_are_closed_implicitly() -> Result<()> {
        let dom = parse_html(
            r#"<select id="c"><option value="">All<option value="FRUIT">Fruit</select>
               <ul><li>one<li>two</ul>"#,
        )?;
        assert_eq!(dom.query_selector_all("select > option")?.len(), 2);
        assert_eq!(dom.query_selector_all("ul > li")?.len(), 2);
        Ok(())
    }

    #[test]
    fn bare_less_than_in_text_is_not_markup() -> Result<()> {
        let dom = parse_html("<p id='p'>1 < 2</p>")?;
        let p = dom.by_id("p").ok_or_else(|| Error::SelectorNotFound("#p".into()))?;
        assert_eq!(dom.text_content(p), "1 < 2");
        Ok(())
    }

    #[test]
    fn reports_unclosed_comment_and_start_tag() {
        assert!(matches!(parse_html("<!-- open"), Err(Error::HtmlParse(_))));
        assert!(matches!(parse_html("<div class='x'"), Err(Error::HtmlParse(_))));
    }

    #[test]
    fn boolean_attributes_have_empty_values() -> Result<()> {
        let dom = parse_html("<input id='q' disabled readonly>")?;
        let q = dom.by_id("q").ok_or_else(|| Error::SelectorNotFound("#q".into()))?;
        assert_eq!(dom.attr(q, "disabled").as_deref(), Some(""));
        assert!(dom.disabled(q));
        assert!(dom.readonly(q));
        Ok(())
    }
}
