//! Slack incoming-webhook payload and the fixed template that fills it.
//!
//! Every message has the same block layout no matter which fields the event carried,
//! so the output is easy to diff. Missing values show a placeholder instead.

use std::net::IpAddr;

use serde::Serialize;

use crate::config::Config;
use crate::models::{SessionActivityEvent, NOT_AVAILABLE, UNKNOWN_TIME};


/// Labels of the main section, in display order.
pub const FIELD_LABELS: [&str; 8] = [
    "User",
    "Account",
    "Region",
    "Source IP",
    "Target",
    "Session ID",
    "Time",
    "Reason",
];

const USER_AGENT_MAX_CHARS: usize = 60;
// Slack rejects the whole message with `invalid_blocks` past these.
const HEADER_MAX_CHARS: usize = 150;
const FIELD_VALUE_MAX_CHARS: usize = 1000;
const PRIVILEGED_HINTS: [&str; 3] = ["admin", "prod", "power"];


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextObject {
    #[serde(rename = "type")]
    pub text_type: String,
    pub text: String,
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text_type: "plain_text".to_string(),
            text: text.into(),
        }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self {
            text_type: "mrkdwn".to_string(),
            text: text.into(),
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Header { text: TextObject },
    Section { fields: Vec<TextObject> },
    Divider,
    Context { elements: Vec<TextObject> },
}


#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    /// Fallback for clients that do not render blocks.
    pub text: String,
    pub blocks: Vec<Block>,
    pub unfurl_links: bool,
    pub unfurl_media: bool,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}


pub fn render(event: &SessionActivityEvent, config: &Config) -> Message {
    let name = clip(event.event_name.as_str(), FIELD_VALUE_MAX_CHARS);
    let user = clip(&event.actor.display, FIELD_VALUE_MAX_CHARS);
    let account = field_value(&event.account_id);
    let region = field_value(&event.region);
    let source_ip = field_value(&event.source_ip);
    let target = field_value(&event.target_resource);
    let session = field_value(&event.session_id);
    let time = clip(event.timestamp.as_deref().unwrap_or(UNKNOWN_TIME), FIELD_VALUE_MAX_CHARS);
    let reason = field_value(&event.reason);
    let document = field_value(&event.document_name);

    let mut text = format!("{name} {user} -> {target} ({region}) session={session} doc={document} ip={source_ip}");
    if event.reason.is_some() {
        text.push_str(&format!(" reason={reason}"));
    }

    let values = [&user, &account, &region, &source_ip, &target, &session, &time, &reason];
    let fields = FIELD_LABELS
        .iter()
        .zip(values)
        .map(|(label, value)| TextObject::mrkdwn(format!("*{label}*\n{value}")))
        .collect();

    let user_agent: String = or_placeholder(&event.user_agent)
        .chars()
        .take(USER_AGENT_MAX_CHARS)
        .collect();

    let details = vec![
        TextObject::mrkdwn(format!(
            "*UserType:* {}  |  *Principal:* {}",
            event.actor.user_type,
            or_placeholder(&event.actor.principal_id)
        )),
        TextObject::mrkdwn(format!("*Document:* {document}")),
        TextObject::mrkdwn(format!("UA: {user_agent}")),
        TextObject::mrkdwn(event_reference(event)),
    ];

    let flags = risk_flags(event);
    let flag_line = if flags.is_empty() {
        "*Flags:* none".to_string()
    } else {
        format!("*Flags:* {}", flags.join("  "))
    };

    let (icon_emoji, icon_url) = match &config.icon_url {
        Some(url) => (None, Some(url.clone())),
        None => (Some(config.icon_emoji.clone()), None),
    };

    Message {
        text,
        blocks: vec![
            Block::Header {
                text: TextObject::plain(clip(&format!("{} SSM {name}", event.event_name.emoji()), HEADER_MAX_CHARS)),
            },
            Block::Section { fields },
            Block::Divider,
            Block::Context { elements: details },
            Block::Context {
                elements: vec![TextObject::mrkdwn(flag_line)],
            },
        ],
        unfurl_links: false,
        unfurl_media: false,
        username: config.username.clone(),
        icon_emoji,
        icon_url,
        channel: config.channel.clone(),
    }
}


/// Quick-glance warnings for events that deserve a second look.
pub fn risk_flags(event: &SessionActivityEvent) -> Vec<&'static str> {
    let mut flags = Vec::new();

    if event.actor.is_root() {
        flags.push(":rotating_light: *ROOT ACCOUNT*");
    }

    if event.actor.is_assumed_role() {
        let names = [Some(&event.actor.display), event.actor.role_issuer.as_ref()];
        let privileged = names.iter().flatten().any(|name| {
            let lower = name.to_lowercase();
            PRIVILEGED_HINTS.iter().any(|hint| lower.contains(hint))
        });
        if privileged {
            flags.push(":warning: privileged role?");
        }
    }

    // Service principals such as "ssm.amazonaws.com" are not addresses and never flagged.
    if let Some(ip) = event.source_ip.as_deref().and_then(|ip| ip.parse::<IpAddr>().ok()) {
        if is_public(&ip) {
            flags.push(":globe_with_meridians: external IP");
        }
    }

    flags
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => !(v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public(&IpAddr::V4(v4)),
            None => !(v6.is_loopback() || v6.is_unspecified() || v6.is_unique_local() || v6.is_unicast_link_local()),
        },
    }
}

fn event_reference(event: &SessionActivityEvent) -> String {
    match (&event.event_id, &event.region) {
        (Some(id), Some(region)) => format!(
            "<https://{region}.console.aws.amazon.com/cloudtrail/home?region={region}#/events/{id}|CloudTrail event>"
        ),
        _ => format!("*Event:* {}", or_placeholder(&event.event_id)),
    }
}

/// Cuts `value` to at most `max` characters, marking the cut with an ellipsis.
fn clip(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut clipped: String = value.chars().take(max - 1).collect();
    clipped.push('…');
    clipped
}

fn field_value(value: &Option<String>) -> String {
    clip(or_placeholder(value), FIELD_VALUE_MAX_CHARS)
}

fn or_placeholder(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or(NOT_AVAILABLE)
}
