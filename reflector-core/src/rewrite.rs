use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::trace;
use url::Url;

/// Matches `href="..."` / `src="..."` with either quote style.
/// Captures: group 1 = attribute name, group 2/3 = double/single quoted value.
static ATTR_REF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\b(href|src)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("attribute reference pattern is valid")
});

/// Matches CSS `url(...)` tokens with optional single/double quoting.
/// Captures: group 1/2 = quoted value, group 3 = bare value.
static CSS_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*(?:'([^']*)'|"([^"]*)"|([^'")\s]+))\s*\)"#)
        .expect("css url pattern is valid")
});

/// Matches `srcset="..."` candidate lists with either quote style.
static SRCSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\bsrcset\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("srcset pattern is valid")
});

/// Values starting with one of these are already absolute or carry a
/// scheme that must never be resolved against the page. `http` covers
/// both `http:` and `https:`.
const SKIP_PREFIXES: &[&str] = &[
    "http",
    "//",
    "data:",
    "mailto:",
    "javascript:",
    "tel:",
    "#",
    "blob:",
];

fn has_prefix_ignore_ascii_case(value: &str, prefix: &str) -> bool {
    value.len() >= prefix.len() && value.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Whether a reference should be resolved against the base URL, or left
/// verbatim because it is already absolute or non-resolvable.
pub fn is_rewritable(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && !SKIP_PREFIXES
            .iter()
            .any(|prefix| has_prefix_ignore_ascii_case(value, prefix))
}

/// Resolve a relative reference against the page URL. `None` means the
/// occurrence is left unchanged; resolution failures never abort a rewrite.
pub fn resolve(value: &str, base: &Url) -> Option<String> {
    base.join(value.trim()).ok().map(|url| url.to_string())
}

/// Rewrite every relative reference in `html` to an absolute URL anchored
/// at `base`. Pure function; unresolvable occurrences pass through
/// byte-for-byte. Rewriting its own output is a no-op since every value
/// it produces is absolute.
pub fn rewrite(html: &str, base: &Url) -> String {
    let attrs = ATTR_REF_RE.replace_all(html, |caps: &Captures| {
        let attr = &caps[1];
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        if !is_rewritable(value) {
            return caps[0].to_string();
        }
        match resolve(value, base) {
            Some(absolute) => {
                trace!("Rewrote {}: {} -> {}", attr, value, absolute);
                format!("{}=\"{}\"", attr, absolute)
            }
            None => caps[0].to_string(),
        }
    });

    let css = CSS_URL_RE.replace_all(&attrs, |caps: &Captures| {
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map_or("", |m| m.as_str());
        if !is_rewritable(value) {
            return caps[0].to_string();
        }
        match resolve(value, base) {
            Some(absolute) => format!("url('{}')", absolute),
            None => caps[0].to_string(),
        }
    });

    let srcsets = SRCSET_RE.replace_all(&css, |caps: &Captures| {
        let value = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map_or("", |m| m.as_str());
        format!("srcset=\"{}\"", rewrite_srcset(value, base))
    });

    srcsets.into_owned()
}

/// Rewrite the URL portion of each srcset candidate, leaving descriptor
/// tokens (width/density hints) untouched.
fn rewrite_srcset(value: &str, base: &Url) -> String {
    value
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| {
            let mut parts = candidate.split_whitespace();
            // split on a non-empty string yields at least one part
            let url_part = parts.next().unwrap_or(candidate);
            let descriptor = parts.collect::<Vec<_>>().join(" ");

            let resolved = if is_rewritable(url_part) {
                resolve(url_part, base).unwrap_or_else(|| url_part.to_string())
            } else {
                url_part.to_string()
            };

            if descriptor.is_empty() {
                resolved
            } else {
                format!("{} {}", resolved, descriptor)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
