use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::InterpretError;
use crate::models::{Actor, EventKind, SessionActivityEvent, UNKNOWN_EVENT, UNKNOWN_USER};


type IdentityStrategy = fn(&Value) -> Option<String>;

// Tried in order, first hit wins.
const IDENTITY_STRATEGIES: &[IdentityStrategy] = &[
    root_account,
    arn_path_name,
    user_name,
    principal_id,
    bare_arn,
];


/// Reads an EventBridge-delivered CloudTrail record into a [`SessionActivityEvent`].
///
/// Only a payload that is not an object, or one without a `detail` object, is rejected.
/// Everything else that is missing is left as `None`.
pub fn interpret(raw: &Value) -> Result<SessionActivityEvent, InterpretError> {
    if !raw.is_object() {
        return Err(InterpretError::NotAnObject);
    }

    let detail = match raw.get("detail") {
        Some(detail) if detail.is_object() => detail,
        _ => return Err(InterpretError::MissingDetail),
    };

    let identity = detail.get("userIdentity").unwrap_or(&Value::Null);
    let request = detail.get("requestParameters").unwrap_or(&Value::Null);
    let response = detail.get("responseElements").unwrap_or(&Value::Null);

    let actor = summarize_identity(identity);

    let event_name = text(detail, "eventName")
        .map(|name| EventKind::from_name(&name))
        .unwrap_or_else(|| EventKind::Unknown(UNKNOWN_EVENT.to_string()));

    let account_id = text(raw, "account")
        .or_else(|| text(detail, "recipientAccountId"))
        .or_else(|| actor.account_id.clone());

    let region = text(raw, "region").or_else(|| text(detail, "awsRegion"));

    let timestamp = text(detail, "eventTime")
        .or_else(|| text(raw, "time"))
        .map(|ts| format_event_time(&ts));

    let session_id = text(response, "sessionId")
        .or_else(|| text(response, "SessionId"))
        .or_else(|| {
            response
                .get("StartSessionResponse")
                .and_then(|inner| text(inner, "SessionId"))
        });

    Ok(SessionActivityEvent {
        event_name,
        actor,
        account_id,
        region,
        source_ip: text(detail, "sourceIPAddress"),
        target_resource: text(request, "target").or_else(|| text(request, "Target")),
        session_id,
        timestamp,
        reason: text(request, "reason").or_else(|| text(request, "Reason")),
        document_name: text(request, "documentName").or_else(|| text(request, "DocumentName")),
        user_agent: text(detail, "userAgent"),
        event_id: text(detail, "eventID").or_else(|| text(detail, "eventId")),
    })
}


fn summarize_identity(identity: &Value) -> Actor {
    let display = IDENTITY_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(identity))
        .unwrap_or_else(|| UNKNOWN_USER.to_string());

    let role_issuer = identity
        .get("sessionContext")
        .and_then(|ctx| ctx.get("sessionIssuer"))
        .and_then(|issuer| text(issuer, "arn"));

    Actor {
        display,
        user_type: text(identity, "type").unwrap_or_else(|| "Unknown".to_string()),
        principal_id: text(identity, "principalId"),
        account_id: text(identity, "accountId"),
        role_issuer,
    }
}

fn root_account(identity: &Value) -> Option<String> {
    (text(identity, "type").as_deref() == Some("Root")).then(|| "Root".to_string())
}

fn arn_path_name(identity: &Value) -> Option<String> {
    let arn = text(identity, "arn")?;
    let (_, name) = arn.rsplit_once('/')?;
    (!name.is_empty()).then(|| name.to_string())
}

fn user_name(identity: &Value) -> Option<String> {
    text(identity, "userName")
}

fn principal_id(identity: &Value) -> Option<String> {
    text(identity, "principalId")
}

fn bare_arn(identity: &Value) -> Option<String> {
    text(identity, "arn")
}


/// CloudTrail times are already ISO-8601; normalize to UTC so every message reads the same.
/// Anything that does not parse is shown as received.
fn format_event_time(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.with_timezone(&Utc).format("%Y-%m-%d %H:%M:%SZ").to_string(),
        Err(_) => raw.to_string(),
    }
}

fn text(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
