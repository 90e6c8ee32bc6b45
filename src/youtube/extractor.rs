//! Watch-page fetching and JSON extraction.
//!
//! The watch page embeds two JSON blobs: `ytInitialPlayerResponse` (video
//! details and streaming data) and `ytInitialData` (page rendering,
//! including owner badges). Both are pulled out with regexes and parsed.

use regex::Regex;
use reqwest::blocking;
use serde_json::Value;

use crate::common::types::AnyResult;

use super::VideoData;

/// Everything extracted from one watch page.
pub struct PlayerResponse {
    /// Absolute URL of the player script (`/s/player/.../base.js`).
    pub player_url: String,
    /// `ytInitialData`.
    pub player_data: Value,
    /// `ytInitialPlayerResponse`.
    pub player_response: Value,
}

pub fn fetch_player_response(
    client: &blocking::Client,
    host: &str,
    id: &str,
) -> AnyResult<PlayerResponse> {
    let page = client
        .get(format!("{}/watch?v={}&hl=en", host, id))
        .send()?
        .error_for_status()?
        .text()?;
    parse_watch_page(host, &page)
}

pub fn parse_watch_page(host: &str, page: &str) -> AnyResult<PlayerResponse> {
    let mut player_url = regex_capture(r#""(?:PLAYER_JS_URL|jsUrl)"\s*:\s*"([^"]+)""#, page)
        .ok_or("player script url not found in watch page")?;
    if player_url.starts_with("//") {
        player_url = format!("https:{}", player_url);
    } else if player_url.starts_with('/') {
        player_url = format!("{}{}", host, player_url);
    }

    let data_raw = regex_capture(
        r#"ytInitialData\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)"#,
        page,
    )
    .ok_or("ytInitialData not found in watch page")?;
    let player_data: Value = serde_json::from_str(&data_raw)?;

    let response_raw = regex_capture(
        r#"ytInitialPlayerResponse\s*=\s*(\{.+?\})\s*;\s*(?:var\s+meta|</script|\n)"#,
        page,
    )
    .ok_or("ytInitialPlayerResponse not found in watch page")?;
    let player_response: Value = serde_json::from_str(&response_raw)?;

    Ok(PlayerResponse {
        player_url,
        player_data,
        player_response,
    })
}

fn regex_capture(pattern: &str, text: &str) -> Option<String> {
    let regex = Regex::new(pattern).ok()?;
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Text of a renderer field: `simpleText` or the first of its `runs`.
pub fn renderer_text(value: &Value) -> Option<String> {
    if let Some(simple) = value.get("simpleText").and_then(|v| v.as_str()) {
        return Some(simple.to_string());
    }
    value
        .get("runs")
        .and_then(|v| v.get(0))
        .and_then(|v| v.get("text"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Parse `H:MM:SS` / `M:SS` / `S` into seconds.
pub fn parse_duration_text(text: &str) -> f64 {
    text.split(':')
        .rev()
        .enumerate()
        .map(|(i, part)| part.trim().parse::<f64>().unwrap_or(0.0) * 60f64.powi(i as i32))
        .sum()
}

/// First integer in a human-formatted count like `"1,234,567 views"`.
pub fn parse_count(text: &str) -> i64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Whether any badge in the list is the official artist badge.
pub fn has_artist_badge(badges: &Value) -> bool {
    badges
        .as_array()
        .map(|list| {
            list.iter().any(|badge| {
                badge
                    .get("metadataBadgeRenderer")
                    .and_then(|v| v.get("icon"))
                    .and_then(|v| v.get("iconType"))
                    .and_then(|v| v.as_str())
                    == Some("OFFICIAL_ARTIST_BADGE")
            })
        })
        .unwrap_or(false)
}

/// Build a [`VideoData`] from a search `videoRenderer`.
pub fn video_from_renderer(item: &Value) -> Option<VideoData> {
    let id = item.get("videoId").and_then(|v| v.as_str())?;

    Some(VideoData {
        id: id.to_string(),
        author: item
            .get("ownerText")
            .and_then(renderer_text)
            .unwrap_or_default(),
        title: item.get("title").and_then(renderer_text).unwrap_or_default(),
        duration: item
            .get("lengthText")
            .and_then(renderer_text)
            .map(|text| parse_duration_text(&text))
            .unwrap_or(0.0),
        views: item
            .get("viewCountText")
            .and_then(renderer_text)
            .map(|text| parse_count(&text))
            .unwrap_or(0),
        from_artist: item
            .get("ownerBadges")
            .map(has_artist_badge)
            .unwrap_or(false),
    })
}

/// Build a [`VideoData`] from a fetched watch page.
pub fn video_from_watch_page(id: &str, response: &PlayerResponse) -> AnyResult<VideoData> {
    let details = response
        .player_response
        .get("videoDetails")
        .ok_or("no video details in player response")?;

    let mut from_artist = false;
    let contents = response
        .player_data
        .get("contents")
        .and_then(|v| v.get("twoColumnWatchNextResults"))
        .and_then(|v| v.get("results"))
        .and_then(|v| v.get("results"))
        .and_then(|v| v.get("contents"))
        .and_then(|v| v.as_array());
    if let Some(contents) = contents {
        for entry in contents {
            let badges = entry
                .get("videoSecondaryInfoRenderer")
                .and_then(|v| v.get("owner"))
                .and_then(|v| v.get("videoOwnerRenderer"))
                .and_then(|v| v.get("badges"));
            if badges.map(has_artist_badge).unwrap_or(false) {
                from_artist = true;
            }
        }
    }

    Ok(VideoData {
        id: id.to_string(),
        author: details
            .get("author")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        title: details
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string(),
        duration: details
            .get("lengthSeconds")
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.0),
        views: details
            .get("viewCount")
            .and_then(|v| v.as_str())
            .map(parse_count)
            .unwrap_or(0),
        from_artist,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn duration_text_forms() {
        assert_eq!(parse_duration_text("17"), 17.0);
        assert_eq!(parse_duration_text("3:45"), 225.0);
        assert_eq!(parse_duration_text("1:02:03"), 3723.0);
    }

    #[test]
    fn count_strips_formatting() {
        assert_eq!(parse_count("1,234,567 views"), 1_234_567);
        assert_eq!(parse_count("No views"), 0);
    }

    #[test]
    fn renderer_text_forms() {
        assert_eq!(
            renderer_text(&json!({"simpleText": "plain"})).as_deref(),
            Some("plain")
        );
        assert_eq!(
            renderer_text(&json!({"runs": [{"text": "first"}, {"text": "second"}]})).as_deref(),
            Some("first")
        );
        assert_eq!(renderer_text(&json!({})), None);
    }

    #[test]
    fn artist_badge() {
        let badges = json!([
            {"metadataBadgeRenderer": {"icon": {"iconType": "CHECK_CIRCLE_THICK"}}},
            {"metadataBadgeRenderer": {"icon": {"iconType": "OFFICIAL_ARTIST_BADGE"}}}
        ]);
        assert!(has_artist_badge(&badges));
        assert!(!has_artist_badge(&json!([])));
        assert!(!has_artist_badge(&json!(null)));
    }

    #[test]
    fn parses_watch_page() {
        let page = concat!(
            r#"<script>var config = {"PLAYER_JS_URL": "/s/player/abc123/base.js"};</script>"#,
            "\n",
            r#"<script>var ytInitialPlayerResponse = {"videoDetails": {"author": "Artist", "title": "Song", "lengthSeconds": "213", "viewCount": "42"}};</script>"#,
            "\n",
            r#"<script>var ytInitialData = {"contents": {"twoColumnWatchNextResults": {"results": {"results": {"contents": [{"videoSecondaryInfoRenderer": {"owner": {"videoOwnerRenderer": {"badges": [{"metadataBadgeRenderer": {"icon": {"iconType": "OFFICIAL_ARTIST_BADGE"}}}]}}}}]}}}}};</script>"#,
        );

        let response = parse_watch_page("https://www.youtube.com", page).unwrap();
        assert_eq!(
            response.player_url,
            "https://www.youtube.com/s/player/abc123/base.js"
        );

        let video = video_from_watch_page("vid01", &response).unwrap();
        assert_eq!(video.author, "Artist");
        assert_eq!(video.title, "Song");
        assert_eq!(video.duration, 213.0);
        assert_eq!(video.views, 42);
        assert!(video.from_artist);
    }
}
