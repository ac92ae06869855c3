use std::time::SystemTime;

/// Formats `time` as an RFC 1123 HTTP-date in GMT,
/// e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(time: SystemTime) -> String {
    httpdate::fmt_http_date(time)
}
