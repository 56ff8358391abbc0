// Moderation domain models - the message snapshot, its classified features,
// and the verdict the decision engine hands back.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts serenity messages into `InboundMessage`.

use crate::core::tiers::Tier;

/// What kind of message this is, as far as moderation cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Ordinary user message (forwards arrive as this kind too)
    Default,
    /// Inline reply to another message
    Reply,
    /// Platform-generated notices (joins, pins, boosts...)
    System,
}

/// File metadata attached to a message. Either field may be missing or garbage.
#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentInfo {
    pub filename: String,
    pub content_type: Option<String>,
}

impl AttachmentInfo {
    pub fn new(filename: impl Into<String>, content_type: Option<&str>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.map(str::to_string),
        }
    }
}

/// A message as seen by one moderation pass. Never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub message_id: u64,
    pub author_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub text: String,
    pub attachments: Vec<AttachmentInfo>,
    pub embed_count: usize,
    /// Id of the message this one replies to, if any
    pub reply_to: Option<u64>,
    pub kind: MessageKind,
}

impl InboundMessage {
    pub fn is_reply(&self) -> bool {
        self.kind == MessageKind::Reply
    }
}

/// The member who sent a message, at the time we looked them up.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberSnapshot {
    pub user_id: u64,
    pub role_ids: Vec<u64>,
}

/// Rough bucket for a link's host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCategory {
    VideoHost,
    GifHost,
    Platform,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLink {
    /// Lowercased host with any leading `www.` removed. Empty if unparsable.
    pub domain: String,
    pub category: LinkCategory,
}

/// Why a message counts as forwarded or empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardedReason {
    MessagePermalink,
    AttachmentPermalink,
    EmbedOnly,
    Empty,
}

impl std::fmt::Display for ForwardedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ForwardedReason::MessagePermalink => write!(f, "message permalink"),
            ForwardedReason::AttachmentPermalink => write!(f, "attachment permalink"),
            ForwardedReason::EmbedOnly => write!(f, "embed-only message"),
            ForwardedReason::Empty => write!(f, "empty message"),
        }
    }
}

/// Everything the decision engine needs to know about a message's content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageFeatures {
    pub links: Vec<DetectedLink>,
    pub has_any_link: bool,
    /// Diagnostic only: logged with `DEBUG_MESSAGES`, not used in decisions
    pub has_video_host_link: bool,
    /// Diagnostic only, like `has_video_host_link`
    pub has_gif_host_link: bool,
    pub has_any_attachment: bool,
    pub has_animated_attachment: bool,
    pub has_device_video_attachment: bool,
    /// `Some` when the message is forwarded, embed-only or empty
    pub forwarded: Option<ForwardedReason>,
}

/// Why a message was removed.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteReason {
    Forwarded(ForwardedReason),
    AnimatedAttachment,
    DeviceVideoAttachment,
    DisallowedLink { domain: String },
    LinkOutsideExemptChannel { domain: String },
    Attachment,
}

impl std::fmt::Display for DeleteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteReason::Forwarded(reason) => write!(f, "forwarded or empty ({})", reason),
            DeleteReason::AnimatedAttachment => write!(f, "animated attachment not allowed"),
            DeleteReason::DeviceVideoAttachment => write!(f, "video attachment not allowed"),
            DeleteReason::DisallowedLink { domain } => write!(f, "link not allowed: {}", domain),
            DeleteReason::LinkOutsideExemptChannel { domain } => {
                write!(f, "link only allowed in exempt channels: {}", domain)
            }
            DeleteReason::Attachment => write!(f, "attachments not allowed"),
        }
    }
}

/// Why a message was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    SystemMessage,
    Unmoderated,
    UnrestrictedTier(Tier),
    PolicyPermits(Tier),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Allow(AllowReason),
    Delete { tier: Tier, reason: DeleteReason },
}

#[cfg(test)]
impl Verdict {
    pub fn is_delete(&self) -> bool {
        matches!(self, Verdict::Delete { .. })
    }
}
