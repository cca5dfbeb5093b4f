//! Best-effort site address extraction from Caddyfile text.

use std::collections::HashSet;

use serde::Serialize;
use url::Url;

/// Tokens at depth 0 that are never site addresses.
const KEYWORDS: &[&str] = &["import", "handle", "route"];

/// Prefixes marking snippets, matchers, bare ports, paths and unix sockets.
const SKIPPED_PREFIXES: &[&str] = &["(", "@", ":", "/", "unix/"];

/// A reachable endpoint derived from a site address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct HostEntry {
    /// Display name, usually the host component.
    pub name: String,
    pub url: String,
}

impl HostEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Extract site addresses from Caddyfile text.
///
/// Only tokens that appear at brace depth 0 right before a block opens are
/// considered. Malformed nesting is tolerated; depth never drops below 0.
/// Output is deduplicated on `(name, url)` in first-seen order.
pub fn extract_hosts(text: &str) -> Vec<HostEntry> {
    let mut seen = HashSet::new();
    let mut hosts = Vec::new();
    let mut depth: usize = 0;
    // Address tokens carried over from a line ending in a comma.
    let mut pending: Vec<String> = Vec::new();

    for raw_line in text.lines() {
        let line = strip_comment(raw_line);
        let mut segment = String::new();
        let mut in_quotes = false;

        for ch in line.chars() {
            if ch == '"' {
                in_quotes = !in_quotes;
            }
            if in_quotes {
                if depth == 0 {
                    segment.push(ch);
                }
                continue;
            }
            match ch {
                '{' => {
                    if depth == 0 {
                        pending.extend(tokenize(&segment));
                        for token in pending.drain(..) {
                            if let Some(entry) = classify(&token) {
                                if seen.insert(entry.clone()) {
                                    hosts.push(entry);
                                }
                            }
                        }
                        segment.clear();
                    }
                    depth += 1;
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    segment.clear();
                }
                _ if depth == 0 => segment.push(ch),
                _ => {}
            }
        }

        if depth == 0 && segment.trim_end().ends_with(',') {
            pending.extend(tokenize(&segment));
        } else {
            pending.clear();
        }
    }

    hosts
}

/// Drop everything from the first `#` that is not inside double quotes.
fn strip_comment(line: &str) -> &str {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '#' if !in_quotes => return &line[..idx],
            _ => {}
        }
    }
    line
}

fn tokenize(segment: &str) -> Vec<String> {
    segment
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Turn one address token into a host entry, or skip it.
fn classify(token: &str) -> Option<HostEntry> {
    if KEYWORDS.contains(&token) || SKIPPED_PREFIXES.iter().any(|p| token.starts_with(p)) {
        return None;
    }

    if token.contains("://") {
        let name = Url::parse(token)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_else(|| token.to_string());
        return Some(HostEntry::new(name, token));
    }

    let bare = token.strip_prefix("*.").unwrap_or(token).trim_start_matches('*');
    let (host, port) = split_port(bare);
    if host.is_empty() {
        return None;
    }

    let scheme = if token.starts_with("http") || port == Some("80") {
        "http"
    } else {
        "https"
    };
    Some(HostEntry::new(host, format!("{}://{}", scheme, host)))
}

/// Split a trailing `:port` made only of digits.
fn split_port(address: &str) -> (&str, Option<&str>) {
    match address.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
            (host, Some(port))
        }
        _ => (address, None),
    }
}
