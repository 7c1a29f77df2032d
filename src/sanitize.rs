//! Output sanitization for bookmark content.
//!
//! Applied on the read path, so every bookmark leaving the service is clean
//! no matter how its row got into the store. Both functions are idempotent:
//! feeding them their own output changes nothing, which keeps double-cleaned
//! data from turning into `&amp;amp;` soup.

use crate::model::Bookmark;

/// Escapes a title for safe embedding in HTML contexts.
///
/// `<`, `>`, `"` and `'` always become entities. A bare `&` becomes `&amp;`,
/// but an `&` that already starts a character entity is left alone so the
/// escape can be applied twice without mangling anything.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (i, c) in input.char_indices() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '&' if !starts_entity(&input[i + 1..]) => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// True when `rest` (the text right after an `&`) begins a character entity,
/// either named (`lt;`), decimal (`#39;`) or hex (`#x27;`).
fn starts_entity(rest: &str) -> bool {
    let Some(end) = rest.find(';') else {
        return false;
    };
    if end == 0 || end > 32 {
        return false;
    }
    let name = &rest[..end];
    if let Some(code) = name.strip_prefix('#') {
        if let Some(hex) = code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
            return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
        }
        return !code.is_empty() && code.chars().all(|c| c.is_ascii_digit());
    }
    name.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Cleans description HTML with ammonia's conservative default allowlist.
///
/// Benign markup like `<strong>` and `<img src=...>` survives, event-handler
/// attributes are dropped, script elements are removed with their content.
pub fn clean_html(input: &str) -> String {
    ammonia::Builder::default().clean(input).to_string()
}

/// Sanitizes the rendered fields of a bookmark before it leaves the service.
pub fn bookmark(bookmark: Bookmark) -> Bookmark {
    Bookmark {
        title: escape_html(&bookmark.title),
        description: clean_html(&bookmark.description),
        ..bookmark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Script tags in titles come back entity-escaped, not removed.
    #[test]
    fn escapes_script_in_title() {
        let title = r#"Naughty naughty very naughty <script>alert("xss");</script>"#;
        assert_eq!(
            escape_html(title),
            "Naughty naughty very naughty &lt;script&gt;alert(&quot;xss&quot;);&lt;/script&gt;"
        );
    }

    // Plain text passes through untouched.
    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(escape_html("Thoughtful bookmarks"), "Thoughtful bookmarks");
    }

    // Bare ampersands are escaped, existing entities are left as they are.
    #[test]
    fn escapes_bare_ampersands_only() {
        assert_eq!(
            escape_html("AT&T & &amp; & &#169;"),
            "AT&amp;T &amp; &amp; &amp; &#169;"
        );
    }

    // Escaping already-escaped text changes nothing.
    #[test]
    fn escape_is_idempotent() {
        let once = escape_html(r#"Fish & <chips> "forever" & 'ever'"#);
        assert_eq!(escape_html(&once), once);
    }

    // Event handlers are stripped while benign markup survives.
    #[test]
    fn strips_event_handlers_from_descriptions() {
        let description = r#"Bad image <img src="https://url.to.file.which/does-not.exist" onerror="alert(document.cookie);">. But not <strong>all</strong> bad."#;
        assert_eq!(
            clean_html(description),
            r#"Bad image <img src="https://url.to.file.which/does-not.exist">. But not <strong>all</strong> bad."#
        );
    }

    // Script elements are removed from descriptions along with their content.
    #[test]
    fn removes_scripts_from_descriptions() {
        assert_eq!(
            clean_html(r#"before <script>alert("xss")</script> after"#),
            "before  after"
        );
    }

    // Cleaning already-clean HTML is a no-op.
    #[test]
    fn clean_is_idempotent() {
        let once = clean_html(r#"<img src="https://x.test/a.png" onerror="alert(1)"> & <em>fine</em>"#);
        assert_eq!(clean_html(&once), once);
    }

    // The read-path wrapper cleans both rendered fields and keeps the rest.
    #[test]
    fn sanitizes_bookmark_fields() {
        let raw = Bookmark {
            id: 7,
            title: "<b>t</b>".to_string(),
            url: "https://x.test".to_string(),
            description: "<script>boom()</script>ok".to_string(),
            rating: 4,
        };
        let clean = bookmark(raw);
        assert_eq!(clean.title, "&lt;b&gt;t&lt;/b&gt;");
        assert_eq!(clean.description, "ok");
        assert_eq!(clean.url, "https://x.test");
        assert_eq!((clean.id, clean.rating), (7, 4));
    }
}
