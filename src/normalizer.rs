use log::debug;
use regex::Regex;

use crate::message::RawMessage;

/// Produce the plain-text rendering of a message body: best body part,
/// markup stripped, quoted-reply chain removed, whitespace tidied. Never
/// fails; a message with no usable body yields an empty string.
pub fn normalize(msg: &RawMessage) -> String {
    let text = if let Some(plain) = msg.body_plain.as_deref() {
        plain.to_string()
    } else if let Some(html) = msg.body_html.as_deref() {
        strip_markup(html)
    } else {
        String::new()
    };

    let text = strip_quoted_reply(&text);
    let text = tidy_whitespace(&text);

    debug!("Normalized body: {} chars", text.len());
    text
}

/// Strip HTML tags, keeping line structure: block-level closers and <br>
/// become newlines before tags are removed.
pub fn strip_markup(html: &str) -> String {
    let mut text = html.to_string();

    if let Ok(re) = Regex::new(r"(?i)<br\s*/?>|</p>|</div>|</tr>|</li>|</h[1-6]>") {
        text = re.replace_all(&text, "\n").to_string();
    }
    if let Ok(re) = Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>") {
        text = re.replace_all(&text, "").to_string();
    }
    if let Ok(re) = Regex::new(r"<[^>]+>") {
        text = re.replace_all(&text, "").to_string();
    }

    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

/// Truncate at the first quoted-reply marker ("On <date/name> wrote:"),
/// keeping only the new content above it. "On" is matched case-sensitively;
/// the date/name capture is free-form and may span lines.
fn strip_quoted_reply(text: &str) -> String {
    if let Ok(re) = Regex::new(r"(?s)\bOn .{0,400}?\bwrote:") {
        if let Some(m) = re.find(text) {
            return text[..m.start()].to_string();
        }
    }
    text.to_string()
}

/// Collapse runs of horizontal whitespace inside lines and cap consecutive
/// blank lines at one, preserving the line structure the extractors rely on.
fn tidy_whitespace(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0usize;

    for line in text.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        lines.push(collapsed);
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::RawMessage;

    fn msg(plain: Option<&str>, html: Option<&str>) -> RawMessage {
        RawMessage {
            uid: 1,
            sender: "a@b.com".to_string(),
            subject: String::new(),
            body_plain: plain.map(String::from),
            body_html: html.map(String::from),
            calendar_part: None,
            headers: Vec::new(),
        }
    }

    #[test]
    fn test_prefers_plain_text() {
        let m = msg(Some("plain body"), Some("<b>html body</b>"));
        assert_eq!(normalize(&m), "plain body");
    }

    #[test]
    fn test_falls_back_to_html() {
        let m = msg(None, Some("<p>Hello Jane,</p><p>Call me.</p>"));
        assert_eq!(normalize(&m), "Hello Jane,\nCall me.");
    }

    #[test]
    fn test_strips_quoted_reply() {
        let body = "Thanks for your time.\n\nOn Mon, Jan 6, 2025 at 3:02 PM Bob Smith\n<bob@acme.com> wrote:\n> earlier message";
        let m = msg(Some(body), None);
        assert_eq!(normalize(&m), "Thanks for your time.");
    }

    #[test]
    fn test_quoted_reply_is_case_sensitive() {
        let body = "we agreed on what he wrote: nothing changes";
        let m = msg(Some(body), None);
        assert_eq!(normalize(&m), body);
    }

    #[test]
    fn test_empty_body_yields_empty_string() {
        let m = msg(None, None);
        assert_eq!(normalize(&m), "");
    }

    #[test]
    fn test_collapses_whitespace_but_keeps_lines() {
        let m = msg(Some("Best\n\n\n\nJane   Doe\t Globex"), None);
        assert_eq!(normalize(&m), "Best\n\nJane Doe Globex");
    }

    #[test]
    fn test_strip_markup_removes_script_blocks() {
        let out = strip_markup("<style>p{}</style><p>Hi&nbsp;there</p>");
        assert_eq!(out.trim(), "Hi there");
    }
}
