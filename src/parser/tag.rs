//! `@tutorial`, `@deprecated` and `@experimental` recognition.

use crate::error::DocError;
use crate::model::Tag;

/// Recognize a tag in one doc-comment line (marker already stripped).
///
/// `None` means the line is ordinary text. `Some(Err(_))` is a line that
/// looks like a tag but does not follow the tag grammar or carries an
/// invalid url; callers report it and drop the tag.
pub fn parse_tag<F>(text: &str, is_valid_url: F) -> Option<Result<Tag, DocError>>
where
    F: Fn(&str) -> bool,
{
    let text = text.trim();
    if keyword_rest(text, "@deprecated").is_some() {
        return Some(Ok(Tag::deprecated()));
    }
    if keyword_rest(text, "@experimental").is_some() {
        return Some(Ok(Tag::experimental()));
    }
    let rest = keyword_rest(text, "@tutorial")?;
    Some(parse_tutorial(rest.trim_start(), is_valid_url))
}

/// `@tutorial` continues with an optional `(label)` and a `: url`.
fn parse_tutorial<F>(rest: &str, is_valid_url: F) -> Result<Tag, DocError>
where
    F: Fn(&str) -> bool,
{
    let (label, rest) = match rest.strip_prefix('(') {
        Some(inner) => {
            let close = inner.find(')').ok_or_else(|| {
                DocError::MalformedTag("unterminated `(` in @tutorial label".to_string())
            })?;
            (Some(inner[..close].trim()), &inner[close + 1..])
        }
        None => (None, rest),
    };
    let url = rest
        .strip_prefix(':')
        .ok_or_else(|| DocError::MalformedTag("@tutorial needs `: url`".to_string()))?
        .trim();
    if !is_valid_url(url) {
        return Err(DocError::MalformedTag(format!(
            "`{}` is not a valid http(s) url",
            url
        )));
    }
    Ok(Tag::tutorial(url, label.filter(|l| !l.is_empty())))
}

/// The text following `keyword`, when `keyword` ends at a word boundary.
fn keyword_rest<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(keyword)?;
    match rest.chars().next() {
        None => Some(rest),
        Some(c) if c.is_whitespace() || c == ':' || c == '(' => Some(rest),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::is_valid_http_url;
    use crate::model::TagKind;

    fn tag(text: &str) -> Option<Result<Tag, DocError>> {
        parse_tag(text, is_valid_http_url)
    }

    #[test]
    fn lifecycle_tags() {
        assert_eq!(tag("@deprecated"), Some(Ok(Tag::deprecated())));
        assert_eq!(tag("@deprecated: use move_to()"), Some(Ok(Tag::deprecated())));
        assert_eq!(tag("@experimental"), Some(Ok(Tag::experimental())));
    }

    #[test]
    fn tutorial_with_and_without_label() {
        let t = tag("@tutorial: https://docs.godotengine.org").unwrap().unwrap();
        assert_eq!(t.kind, TagKind::Tutorial);
        assert_eq!(t.url.as_deref(), Some("https://docs.godotengine.org"));
        assert_eq!(t.label, None);

        let t = tag("@tutorial(Signals): https://example.com/signals").unwrap().unwrap();
        assert_eq!(t.label.as_deref(), Some("Signals"));
        assert_eq!(t.url.as_deref(), Some("https://example.com/signals"));
    }

    #[test]
    fn malformed_tutorials() {
        for text in [
            "@tutorial: not-a-url",
            "@tutorial(Broken: https://example.com",
            "@tutorial https://example.com",
            "@tutorial(Label) https://example.com",
        ] {
            assert!(matches!(tag(text), Some(Err(DocError::MalformedTag(_)))), "{text}");
        }
    }

    #[test]
    fn plain_text_is_not_a_tag() {
        assert_eq!(tag("Moves the player."), None);
        assert_eq!(tag("@tutorials are elsewhere"), None);
        assert_eq!(tag("See @deprecated below"), None);
    }

    #[test]
    fn url_predicate_is_consulted() {
        let t = parse_tag("@tutorial: anything", |_| true).unwrap().unwrap();
        assert_eq!(t.url.as_deref(), Some("anything"));
    }
}
