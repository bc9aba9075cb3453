use sha2::{Digest, Sha256};
use std::net::IpAddr;

use axum::http::HeaderMap;

/// Creates a truncated, salted hash of an identifier for safe logging.
///
/// # Arguments
/// * `id` - The identifier to hash (e.g., source IP, user_id).
/// * `salt` - A salt value from the application's configuration.
///
/// # Returns
/// A short, hexadecimal string representing the salted hash.
pub fn log_safe_id(id: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(id.as_bytes());
    let hash = hasher.finalize();

    hex::encode(&hash[..4])
}

/// Extracts the client IP used as the admission source key.
///
/// Priority:
/// 1. First entry of X-Forwarded-For
/// 2. X-Real-IP
/// 3. The socket peer address
///
/// Returns "unknown" when none is available, so every such request shares
/// one bucket.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> String {
    if let Some(forwarded_for) = headers.get("x-forwarded-for")
        && let Ok(forwarded_str) = forwarded_for.to_str()
    {
        // "client, proxy1, proxy2"
        let first_ip = forwarded_str.split(',').next().unwrap_or("").trim();
        if let Ok(ip) = normalize_ip(first_ip).parse::<IpAddr>() {
            return ip.to_string();
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip")
        && let Ok(real_ip_str) = real_ip.to_str()
        && let Ok(ip) = normalize_ip(real_ip_str).parse::<IpAddr>()
    {
        return ip.to_string();
    }

    if let Some(ip) = direct_ip {
        return ip.to_string();
    }

    "unknown".to_string()
}

/// Strips whitespace and IPv6 brackets ("[::1]" -> "::1")
pub fn normalize_ip(raw: &str) -> &str {
    raw.trim().trim_start_matches('[').trim_end_matches(']')
}

/// Escapes text for interpolation into an HTML body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
