#![forbid(unsafe_code)]

//! Parser for the CSS `src` descriptor of a font face.
//!
//! Accepted grammar (whitespace-insensitive, function names
//! case-insensitive):
//!
//! ```text
//! src   := entry ("," entry)*
//! entry := "url(" value ")" ["format(" value ")"] ["tech(" value ")"]
//!        | "local(" value ")"
//! value := quoted string | unquoted text
//! ```
//!
//! Commas inside parentheses or quotes (data URLs) do not split entries.

use crate::error::FontLoadError;

/// One candidate location of a font face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SrcEntry {
    Url { url: String, format: Option<String> },
    Local(String),
}

/// Parse a `src` descriptor into its candidate list.
pub fn parse_src(src: &str) -> Result<Vec<SrcEntry>, FontLoadError> {
    let parts = split_top_level(src).ok_or_else(|| FontLoadError::syntax(src))?;
    parts
        .into_iter()
        .map(|part| parse_entry(part.trim()).ok_or_else(|| FontLoadError::syntax(src)))
        .collect()
}

fn parse_entry(part: &str) -> Option<SrcEntry> {
    let (name, args, rest) = function_call(part)?;
    match name.as_str() {
        "url" => {
            let url = unquote(args)?;
            if url.is_empty() {
                return None;
            }
            let mut format = None;
            let mut rest = rest.trim();
            while !rest.is_empty() {
                let (hint, value, tail) = function_call(rest)?;
                match hint.as_str() {
                    "format" if format.is_none() => format = Some(unquote(value)?),
                    "tech" => {}
                    _ => return None,
                }
                rest = tail.trim();
            }
            Some(SrcEntry::Url { url, format })
        }
        "local" if rest.trim().is_empty() => {
            let family = unquote(args)?;
            (!family.is_empty()).then_some(SrcEntry::Local(family))
        }
        _ => None,
    }
}

/// Split `name(args)rest`, honouring nested parentheses and quotes.
fn function_call(input: &str) -> Option<(String, &str, &str)> {
    let open = input.find('(')?;
    let name = input[..open].trim();
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '-') {
        return None;
    }
    let mut depth = 0usize;
    let mut quote = None;
    for (index, ch) in input[open..].char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    let close = open + index;
                    return Some((
                        name.to_ascii_lowercase(),
                        &input[open + 1..close],
                        &input[close + 1..],
                    ));
                }
            }
            _ => {}
        }
    }
    None
}

fn split_top_level(input: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote = None;
    let mut start = 0;
    for (index, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.checked_sub(1)?,
            (None, ',') if depth == 0 => {
                parts.push(&input[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    parts.push(&input[start..]);
    Some(parts)
}

fn unquote(value: &str) -> Option<String> {
    let value = value.trim();
    let mut chars = value.chars();
    match chars.next() {
        Some(q @ ('"' | '\'')) => {
            let inner = value.strip_prefix(q)?.strip_suffix(q)?;
            (!inner.contains(q)).then(|| inner.to_owned())
        }
        _ if value.contains(['"', '\'']) => None,
        _ => Some(value.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn url(url: &str, format: Option<&str>) -> SrcEntry {
        SrcEntry::Url {
            url: url.to_owned(),
            format: format.map(str::to_owned),
        }
    }

    #[test]
    fn single_url() {
        assert_eq!(parse_src("url(/a.woff2)").unwrap(), vec![url("/a.woff2", None)]);
        assert_eq!(
            parse_src("  URL( '/a b.ttf' )  ").unwrap(),
            vec![url("/a b.ttf", None)]
        );
    }

    #[test]
    fn fallback_list_with_hints() {
        let parsed = parse_src(
            r#"local("Inter"), url("/inter.woff2") format("woff2"), url(/inter.ttf) format(truetype) tech(variations)"#,
        )
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                SrcEntry::Local("Inter".to_owned()),
                url("/inter.woff2", Some("woff2")),
                url("/inter.ttf", Some("truetype")),
            ]
        );
    }

    #[test]
    fn data_urls_keep_their_commas() {
        let parsed = parse_src("url(data:font/woff2;base64,d09GMg==) format('woff2')").unwrap();
        assert_eq!(
            parsed,
            vec![url("data:font/woff2;base64,d09GMg==", Some("woff2"))]
        );
    }

    #[test]
    fn local_names_may_contain_spaces() {
        assert_eq!(
            parse_src("local(Helvetica Neue)").unwrap(),
            vec![SrcEntry::Local("Helvetica Neue".to_owned())]
        );
    }

    #[test]
    fn malformed_sources_are_syntax_errors() {
        for bad in [
            "",
            "/fonts/a.woff2",
            "url()",
            "url(/a.woff",
            "url(/a.woff))",
            "url(\"/a.woff)",
            "url(/a.woff) format(woff) format(ttf)",
            "url(/a.woff) bogus(x)",
            "url(/a.woff),",
            "local()",
            "local(a) format(woff)",
            "image(/a.png)",
        ] {
            assert_eq!(
                parse_src(bad),
                Err(FontLoadError::syntax(bad)),
                "{bad:?} should not parse"
            );
        }
    }
}
