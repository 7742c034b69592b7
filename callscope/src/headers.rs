use once_cell::sync::Lazy;
use regex::Regex;

/// Header names that some capture tools glue onto a single line.
pub const KNOWN_HEADERS: &[&str] = &[
    "Via", "From", "To", "Call-ID", "CSeq", "Contact", "User-Agent", "P-RTP-Stat",
    "P-Asserted-Identity", "P-Access-Network-Info", "Allow", "Content-Length",
    "Content-Type", "Reason", "Route", "Supported", "Require", "Expires", "Authorization",
    "Security-Verify", "Record-Route", "Session-Expires", "X-Asterisk",
];

static RE_HEADER: Lazy<Regex> = Lazy::new(|| {
    // Longer names first so `Record-Route` wins over `Route` at the same position.
    let mut names: Vec<&str> = KNOWN_HEADERS.to_vec();
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let alt = names.iter().map(|n| regex::escape(n)).collect::<Vec<_>>().join("|");
    Regex::new(&format!(r"\b(?:{alt}):\s")).unwrap()
});

/// Puts every known `Header: ` occurrence at the start of its own line.
///
/// Occurrences already at a line start are left alone, and names that are the
/// tail of a hyphenated header (`Reply-To:`) are not split, so the function is
/// idempotent.
pub fn normalize_headers(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len() + 64);
    let mut last = 0;
    for m in RE_HEADER.find_iter(text) {
        let start = m.start();
        if start == 0 {
            continue;
        }
        match bytes[start - 1] {
            b'\n' | b'-' => continue,
            _ => {}
        }
        out.push_str(&text[last..start]);
        out.push('\n');
        last = start;
    }
    out.push_str(&text[last..]);
    out
}

/// Value of the first `name:` header (case-insensitive name, tolerant of a
/// missing colon as in `Name 16`), trimmed to the end of its line.
pub fn header_value<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    for line in body.lines() {
        let mut rest = line.trim_start();
        loop {
            let Some(pos) = find_ignore_case(rest, name) else { break };
            let after = &rest[pos + name.len()..];
            let boundary_ok = pos == 0 || !is_name_char(rest.as_bytes()[pos - 1]);
            match after.chars().next() {
                Some(c) if boundary_ok && (c == ':' || c == ' ' || c == '\t') => {
                    let v = after.trim_start_matches([':', ' ', '\t']).trim();
                    if !v.is_empty() {
                        return Some(v);
                    }
                    break;
                }
                _ => rest = &rest[pos + name.len()..],
            }
        }
    }
    None
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
