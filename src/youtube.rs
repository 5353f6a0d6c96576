use eyre::{Result, bail};
use log::debug;
use regex::Regex;
use reqwest::StatusCode;
use serde_json::Value;

use crate::output::decode_caption_text;
use crate::{TranscriptError, TranscriptLine};

pub const DEFAULT_BASE_URL: &str = "https://www.youtube.com";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// GET a YouTube resource as text; 404 means the video does not exist
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    user_agent: &str,
    video_id: &str,
) -> Result<String, TranscriptError> {
    debug!("Fetching {url}");

    let resp = client
        .get(url)
        .header("User-Agent", user_agent)
        .header("Accept-Language", ACCEPT_LANGUAGE)
        .send()
        .await?;

    if resp.status() == StatusCode::NOT_FOUND {
        return Err(TranscriptError::VideoNotFound(video_id.to_string()));
    }

    Ok(resp.error_for_status()?.text().await?)
}

/// Locate `<marker> = {...}` in a page and parse the JSON value that follows
///
/// Only the first complete JSON value after `=` is read, so trailing script
/// text (`;var ...`) and nested `};` sequences inside strings are harmless.
pub fn extract_embedded_json(html: &str, marker: &str) -> Option<Value> {
    let re = Regex::new(&format!(r#"{}"?\]?\s*=\s*\{{"#, regex::escape(marker))).ok()?;

    for m in re.find_iter(html) {
        let start = m.end() - 1;
        let mut stream = serde_json::Deserializer::from_str(&html[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => return Some(value),
            Some(Err(e)) => debug!("Skipping unparsable {marker} blob: {e}"),
            None => {}
        }
    }

    None
}

/// Text of a YouTube "formatted string": `simpleText`, or the joined `runs`
pub fn formatted_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("simpleText").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let runs = value.get("runs")?.as_array()?;
    let joined: String = runs
        .iter()
        .filter_map(|r| r.get("text").and_then(Value::as_str))
        .collect();
    Some(joined)
}

/// Parse the `<transcript><text start=".." dur="..">..</text></transcript>` caption format
pub fn parse_caption_xml(xml: &str) -> Result<Vec<TranscriptLine>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut lines = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                current_dur = dur;
            }
            Ok(Event::Empty(_)) => {
                // Self-closing <text .../> has no content
            }
            Ok(Event::Text(ref e)) => {
                if let Some(start) = current_start.take() {
                    let raw_text = e.unescape().unwrap_or_default().to_string();
                    let mut line = TranscriptLine::new(decode_caption_text(&raw_text), start);
                    line.duration = current_dur.take();
                    lines.push(line);
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"text" => {
                current_start = None;
                current_dur = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => bail!("error parsing caption XML: {e}"),
            _ => {}
        }
    }

    Ok(lines)
}
