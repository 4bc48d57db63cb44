use time::OffsetDateTime;

/// Escape text for insertion into an HTML fragment.
///
/// Rewrites `&`, `<`, `>`, `"` and `'` to their entity forms in a single
/// pass. Deliberately not idempotent: escaping already-escaped text turns
/// the `&` of existing entities into `&amp;` again, so callers must escape
/// exactly once.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a duration in seconds as a compact `1h2m3s` string.
///
/// Leading units are suppressed when zero: `59 -> "59s"`, `60 -> "1m0s"`.
pub fn fmt_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// Format a timestamp as `YYYY-MM-DD HH:MM:SS`, zero-padded.
pub fn timestamp_string(t: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        t.year(),
        u8::from(t.month()),
        t.day(),
        t.hour(),
        t.minute(),
        t.second()
    )
}

/// Current time as `YYYY-MM-DD HH:MM:SS` (UTC).
pub fn now_string() -> String {
    timestamp_string(OffsetDateTime::now_utc())
}

/// Current Unix timestamp in seconds. Source of the result-poll watermark.
pub fn timestamp_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}
