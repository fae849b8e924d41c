//! Output-area markup fragments and their plain-text rendering.

/// Escapes the five HTML-sensitive characters.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn answer_markup(answer: &str) -> String {
    format!("<p>{}</p>", escape_html(answer))
}

/// Inserts `message` verbatim; callers escape it when it is untrusted.
pub fn error_markup(message: &str) -> String {
    format!(r#"<p class="error">{message}</p>"#)
}

pub fn failure_message(detail: &str, endpoint: &str) -> String {
    format!("Error: {detail}<br><br>Make sure your backend is running at {endpoint}")
}

/// For failures that never left the process, so no backend hint applies.
pub fn local_failure_message(detail: &str) -> String {
    format!("Error: {detail}")
}

/// Flattens an output fragment for frontends that cannot render markup.
///
/// `<br>` becomes a newline, block tags become paragraph breaks, every other
/// tag is dropped and the entities produced by [`escape_html`] are decoded.
pub fn to_plain_text(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let Some(len) = rest[start..].find('>') else {
            text.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let tag = rest[start + 1..start + len]
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match tag.as_str() {
            "br" => text.push('\n'),
            "p" | "div" if !text.is_empty() && !text.ends_with('\n') => text.push('\n'),
            _ => {}
        }
        rest = &rest[start + len + 1..];
    }
    text.push_str(rest);

    decode_entities(text.trim_end())
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_sensitive_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
        assert_eq!(escape_html("plain text"), "plain text");
    }

    #[test]
    fn answer_markup_never_contains_raw_script_tag() {
        let markup = answer_markup("<script>");
        assert_eq!(markup, "<p>&lt;script&gt;</p>");
        assert!(!markup.contains("<script>"));
    }

    #[test]
    fn error_markup_keeps_message_verbatim() {
        assert_eq!(
            error_markup("<b>down</b>"),
            r#"<p class="error"><b>down</b></p>"#
        );
    }

    #[test]
    fn plain_text_decodes_entities_and_line_breaks() {
        let markup = error_markup(&failure_message(
            "HTTP error! status: 500",
            "http://localhost:5000/query",
        ));
        assert_eq!(
            to_plain_text(&markup),
            "Error: HTTP error! status: 500\n\nMake sure your backend is running at http://localhost:5000/query"
        );
        assert_eq!(to_plain_text(&answer_markup("a < b & c")), "a < b & c");
    }

    #[test]
    fn plain_text_keeps_unterminated_tag_text() {
        assert_eq!(to_plain_text("x <y"), "x <y");
    }
}
