/// Shown in place of any optional value the event did not carry.
pub const NOT_AVAILABLE: &str = "N/A";
pub const UNKNOWN_TIME: &str = "unknown";
pub const UNKNOWN_USER: &str = "unknown-user";
pub const UNKNOWN_EVENT: &str = "UnknownEvent";


#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    StartSession,
    ResumeSession,
    TerminateSession,
    Unknown(String),
}

impl EventKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "StartSession" => EventKind::StartSession,
            "ResumeSession" => EventKind::ResumeSession,
            "TerminateSession" => EventKind::TerminateSession,
            other => EventKind::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::StartSession => "StartSession",
            EventKind::ResumeSession => "ResumeSession",
            EventKind::TerminateSession => "TerminateSession",
            EventKind::Unknown(name) => name,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            EventKind::StartSession => ":large_blue_circle:",
            EventKind::ResumeSession => ":arrows_counterclockwise:",
            EventKind::TerminateSession => ":white_check_mark:",
            EventKind::Unknown(_) => ":information_source:",
        }
    }
}


/// The principal that made the call, reduced to what the notification shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub display: String,
    pub user_type: String,
    pub principal_id: Option<String>,
    pub account_id: Option<String>,
    /// ARN of the role that issued an assumed-role session.
    pub role_issuer: Option<String>,
}

impl Actor {
    pub fn is_root(&self) -> bool {
        self.user_type == "Root"
    }

    pub fn is_assumed_role(&self) -> bool {
        self.user_type == "AssumedRole"
    }
}


/// Normalized view of one Session Manager audit event.
///
/// Optional values stay `None` here; the renderer substitutes the placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionActivityEvent {
    pub event_name: EventKind,
    pub actor: Actor,
    pub account_id: Option<String>,
    pub region: Option<String>,
    pub source_ip: Option<String>,
    pub target_resource: Option<String>,
    pub session_id: Option<String>,
    /// Already formatted for display.
    pub timestamp: Option<String>,
    pub reason: Option<String>,
    pub document_name: Option<String>,
    pub user_agent: Option<String>,
    pub event_id: Option<String>,
}
