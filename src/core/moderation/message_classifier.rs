// Message classifier - turns a raw message into `MessageFeatures`.
//
// Pure text/metadata inspection: no network calls, no state, no tier awareness.
// The same message always classifies to the same features.

use super::moderation_models::{
    AttachmentInfo, DetectedLink, ForwardedReason, InboundMessage, LinkCategory, MessageFeatures,
};
use regex::Regex;
use url::Url;

const ANIMATED_EXTENSIONS: [&str; 3] = ["gif", "webp", "apng"];
const ANIMATED_MIME_MARKERS: [&str; 3] = ["image/gif", "webp", "apng"];
const VIDEO_EXTENSIONS: [&str; 10] = [
    "mp4", "mov", "mkv", "webm", "avi", "flv", "mpeg", "mpg", "m4v", "3gp",
];

const VIDEO_HOSTS: [&str; 6] = [
    "youtube.com",
    "youtu.be",
    "twitch.tv",
    "vimeo.com",
    "streamable.com",
    "tiktok.com",
];
const GIF_HOSTS: [&str; 3] = ["tenor.com", "giphy.com", "gfycat.com"];
const PLATFORM_HOSTS: [&str; 4] = ["discord.com", "discordapp.com", "discordapp.net", "discord.gg"];

/// True if `domain` is `base` or a subdomain of it.
pub fn domain_matches(domain: &str, base: &str) -> bool {
    if domain.is_empty() || base.is_empty() {
        return false;
    }
    domain == base
        || domain
            .strip_suffix(base)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// Extracts moderation features from messages using a fixed set of patterns.
pub struct MessageClassifier {
    url_regex: Regex,
    message_permalink_regex: Regex,
    attachment_permalink_regex: Regex,
}

impl MessageClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Scheme-less links only when they are unambiguous: `www.` hosts and invite/short hosts
            url_regex: Regex::new(
                r#"(?i)(?:\bhttps?://|\bwww\.|\b(?:discord\.gg|youtu\.be)/)[^\s<>"']+"#,
            )?,
            // Permalinks include Discord's `<...>` no-embed wrapper when present
            message_permalink_regex: Regex::new(
                r"(?i)<?https?://(?:(?:ptb|canary)\.)?discord(?:app)?\.com/channels/(?:\d+|@me)/\d+/\d+>?",
            )?,
            attachment_permalink_regex: Regex::new(
                r"(?i)<?https?://(?:cdn|media)\.discordapp\.(?:com|net)/(?:ephemeral-)?attachments/\d+/\d+/[^\s<>]+>?",
            )?,
        })
    }

    pub fn classify(&self, message: &InboundMessage) -> MessageFeatures {
        let links = self.detect_links(&message.text);

        MessageFeatures {
            has_any_link: !links.is_empty(),
            has_video_host_link: links.iter().any(|l| l.category == LinkCategory::VideoHost),
            has_gif_host_link: links.iter().any(|l| l.category == LinkCategory::GifHost),
            has_any_attachment: !message.attachments.is_empty(),
            has_animated_attachment: message.attachments.iter().any(is_animated),
            has_device_video_attachment: message.attachments.iter().any(is_device_video),
            forwarded: self.forwarded_reason(message),
            links,
        }
    }

    /// The forwarded/empty heuristic. Checked before any tier rule applies.
    fn forwarded_reason(&self, message: &InboundMessage) -> Option<ForwardedReason> {
        let text = message.text.as_str();
        let blank = text.trim().is_empty();

        if !blank && !self.is_reply_with_commentary(message) {
            if self.message_permalink_regex.is_match(text) {
                return Some(ForwardedReason::MessagePermalink);
            }
            if self.attachment_permalink_regex.is_match(text) {
                return Some(ForwardedReason::AttachmentPermalink);
            }
        }

        if blank && message.attachments.is_empty() {
            return if message.embed_count > 0 {
                Some(ForwardedReason::EmbedOnly)
            } else {
                Some(ForwardedReason::Empty)
            };
        }

        None
    }

    /// A reply that says something beyond the permalinks it quotes.
    fn is_reply_with_commentary(&self, message: &InboundMessage) -> bool {
        if !message.is_reply() {
            return false;
        }
        let without_messages = self.message_permalink_regex.replace_all(&message.text, "");
        let remainder = self
            .attachment_permalink_regex
            .replace_all(&without_messages, "");
        !remainder.trim().is_empty()
    }

    fn detect_links(&self, text: &str) -> Vec<DetectedLink> {
        self.url_regex
            .find_iter(text)
            .map(|m| {
                let domain = normalize_host(m.as_str());
                let category = categorize(&domain);
                DetectedLink { domain, category }
            })
            .collect()
    }
}

fn normalize_host(raw: &str) -> String {
    let parsed = if raw.contains("://") {
        Url::parse(raw)
    } else {
        Url::parse(&format!("https://{}", raw))
    };
    let Ok(parsed) = parsed else {
        return String::new();
    };
    let host = parsed.host_str().unwrap_or_default().to_lowercase();
    let host = host.trim_end_matches('.');
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn categorize(domain: &str) -> LinkCategory {
    let any = |hosts: &[&str]| hosts.iter().any(|base| domain_matches(domain, base));

    if any(&VIDEO_HOSTS) {
        LinkCategory::VideoHost
    } else if any(&GIF_HOSTS) {
        LinkCategory::GifHost
    } else if any(&PLATFORM_HOSTS) {
        LinkCategory::Platform
    } else {
        LinkCategory::Other
    }
}

fn extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.trim().rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn mime(attachment: &AttachmentInfo) -> String {
    attachment
        .content_type
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn is_animated(attachment: &AttachmentInfo) -> bool {
    let by_name = extension(&attachment.filename)
        .is_some_and(|ext| ANIMATED_EXTENSIONS.contains(&ext.as_str()));
    let mime = mime(attachment);
    by_name || ANIMATED_MIME_MARKERS.iter().any(|marker| mime.contains(marker))
}

pub fn is_device_video(attachment: &AttachmentInfo) -> bool {
    let by_name = extension(&attachment.filename)
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()));
    by_name || mime(attachment).starts_with("video/")
}
