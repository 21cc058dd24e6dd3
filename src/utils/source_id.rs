//! Video identifier extraction from user-supplied URLs

const ID_LEN: usize = 11;
const PATH_PREFIXES: &[&str] = &["embed", "shorts", "live", "v"];

/// Extract the 11-character video id from a YouTube URL or a bare id
pub fn extract_id(input: &str) -> Option<String> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(input.to_string());
    }

    let without_scheme = input
        .strip_prefix("https://")
        .or_else(|| input.strip_prefix("http://"))
        .unwrap_or(input);
    let (host, rest) = without_scheme
        .split_once('/')
        .unwrap_or((without_scheme, ""));
    let host = host.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let host = host.strip_prefix("m.").unwrap_or(host);
    let host = host.strip_prefix("music.").unwrap_or(host);

    let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
    let query = query.split('#').next().unwrap_or("");
    let path = path.split('#').next().unwrap_or("");
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let candidate = match host {
        "youtu.be" => segments.first().copied(),
        "youtube.com" | "youtube-nocookie.com" => match segments.as_slice() {
            ["watch"] => query_param(query, "v"),
            [prefix, id, ..] if PATH_PREFIXES.contains(prefix) => Some(*id),
            _ => None,
        },
        _ => None,
    }?;

    is_video_id(candidate).then(|| candidate.to_string())
}

/// Canonical watch page for an extracted id
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn is_video_id(candidate: &str) -> bool {
    candidate.len() == ID_LEN
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
