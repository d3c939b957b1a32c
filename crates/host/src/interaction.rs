//! Parsed inbound interaction payloads.
//!
//! Slack delivers interactivity as JSON documents whose shape varies by
//! `type`. This module normalizes the three kinds the runtime routes
//! (`block_actions`, `view_submission`, `view_closed`), plus slash
//! commands, into typed payloads carrying exactly what a turn needs: who
//! triggered it, where, the submitted [`FormState`], and the matched
//! actions.

use std::collections::HashMap;

use blocks_core::{FormState, FormValue, InboundAction};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("payload is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("unsupported interaction type: {0}")]
    UnsupportedType(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// The view object embedded in view-scoped payloads.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InboundView {
    pub id: String,
    pub callback_id: Option<String>,
    pub private_metadata: String,
    pub hash: Option<String>,
    pub state: FormState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockActionsPayload {
    pub user_id: String,
    pub team_id: Option<String>,
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub trigger_id: Option<String>,
    pub response_url: Option<String>,
    pub view: Option<InboundView>,
    pub actions: Vec<InboundAction>,
    /// Form state merged from `view.state` and the action values, so a
    /// takeValues walk sees selects changed on message surfaces too.
    pub form: FormState,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewSubmissionPayload {
    pub user_id: String,
    pub team_id: Option<String>,
    pub trigger_id: Option<String>,
    pub view: InboundView,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewClosedPayload {
    pub user_id: String,
    pub team_id: Option<String>,
    pub view: InboundView,
    pub is_cleared: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub text: String,
    pub user_id: String,
    pub team_id: Option<String>,
    pub channel_id: Option<String>,
    pub trigger_id: Option<String>,
    pub response_url: Option<String>,
}

impl SlashCommandPayload {
    /// Builds the payload from the decoded form fields of a slash command
    /// request.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, PayloadError> {
        let field = |name: &'static str| fields.get(name).cloned();
        Ok(Self {
            command: field("command").ok_or(PayloadError::MissingField("command"))?,
            text: field("text").unwrap_or_default(),
            user_id: field("user_id").ok_or(PayloadError::MissingField("user_id"))?,
            team_id: field("team_id"),
            channel_id: field("channel_id"),
            trigger_id: field("trigger_id"),
            response_url: field("response_url"),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionPayload {
    BlockActions(BlockActionsPayload),
    ViewSubmission(ViewSubmissionPayload),
    ViewClosed(ViewClosedPayload),
}

impl InteractionPayload {
    pub fn parse(payload: &Value) -> Result<Self, PayloadError> {
        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .ok_or(PayloadError::MissingField("type"))?;
        match kind {
            "block_actions" => Ok(Self::BlockActions(parse_block_actions(payload)?)),
            "view_submission" => Ok(Self::ViewSubmission(parse_view_submission(payload)?)),
            "view_closed" => Ok(Self::ViewClosed(parse_view_closed(payload)?)),
            other => Err(PayloadError::UnsupportedType(other.to_owned())),
        }
    }

    pub fn callback_id(&self) -> Option<&str> {
        match self {
            Self::BlockActions(payload) => {
                payload.view.as_ref().and_then(|view| view.callback_id.as_deref())
            }
            Self::ViewSubmission(payload) => payload.view.callback_id.as_deref(),
            Self::ViewClosed(payload) => payload.view.callback_id.as_deref(),
        }
    }
}

fn user_id(payload: &Value) -> Result<String, PayloadError> {
    payload
        .pointer("/user/id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or(PayloadError::MissingField("user.id"))
}

fn optional_str(payload: &Value, pointer: &str) -> Option<String> {
    payload.pointer(pointer).and_then(Value::as_str).map(str::to_owned)
}

fn parse_view(view: &Value) -> Result<InboundView, PayloadError> {
    Ok(InboundView {
        id: view
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(PayloadError::MissingField("view.id"))?,
        callback_id: view
            .get("callback_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_owned),
        private_metadata: view
            .get("private_metadata")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        hash: view.get("hash").and_then(Value::as_str).map(str::to_owned),
        state: view.pointer("/state/values").map(form_state_from_values).unwrap_or_default(),
    })
}

/// Normalizes Slack's per-element `state.values` encodings into one
/// [`FormState`]: block id → action id → value.
fn form_state_from_values(values: &Value) -> FormState {
    let mut form = FormState::new();
    let Some(blocks) = values.as_object() else {
        return form;
    };
    for (block_id, actions) in blocks {
        let Some(actions) = actions.as_object() else {
            continue;
        };
        for (action_id, state) in actions {
            form.insert(block_id.clone(), action_id.clone(), form_value_from_state(state));
        }
    }
    form
}

fn form_value_from_state(state: &Value) -> FormValue {
    let kind = state.get("type").and_then(Value::as_str).unwrap_or_default();
    match kind {
        "plain_text_input" => match state.get("value").and_then(Value::as_str) {
            Some(value) => FormValue::Text(value.to_owned()),
            None => FormValue::Empty,
        },
        "static_select" | "radio_buttons" => {
            match state.pointer("/selected_option/value").and_then(Value::as_str) {
                Some(value) => FormValue::Selected(vec![value.to_owned()]),
                None => FormValue::Empty,
            }
        }
        "multi_static_select" | "checkboxes" => {
            let selected: Vec<String> = state
                .pointer("/selected_options")
                .and_then(Value::as_array)
                .map(|options| {
                    options
                        .iter()
                        .filter_map(|option| option.get("value").and_then(Value::as_str))
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default();
            FormValue::Selected(selected)
        }
        "datepicker" => match state.get("selected_date").and_then(Value::as_str) {
            Some(value) => FormValue::Text(value.to_owned()),
            None => FormValue::Empty,
        },
        "timepicker" => match state.get("selected_time").and_then(Value::as_str) {
            Some(value) => FormValue::Text(value.to_owned()),
            None => FormValue::Empty,
        },
        other => {
            debug!(kind = other, "unrecognized state value type; best-effort text");
            match state.get("value").and_then(Value::as_str) {
                Some(value) => FormValue::Text(value.to_owned()),
                None => FormValue::Empty,
            }
        }
    }
}

/// One action entry of a `block_actions` payload, plus the form value it
/// implies (Slack repeats the new value inside the action object).
fn parse_action(action: &Value) -> Result<(InboundAction, Option<FormValue>), PayloadError> {
    let action_id = action
        .get("action_id")
        .and_then(Value::as_str)
        .ok_or(PayloadError::MissingField("actions[].action_id"))?;
    let mut inbound = InboundAction::new(action_id);
    inbound.block_id = action.get("block_id").and_then(Value::as_str).map(str::to_owned);
    inbound.value = action.get("value").and_then(Value::as_str).map(str::to_owned);
    let implied = implied_form_value(action);
    Ok((inbound, implied))
}

fn implied_form_value(action: &Value) -> Option<FormValue> {
    let kind = action.get("type").and_then(Value::as_str)?;
    match kind {
        "static_select" | "radio_buttons" => Some(
            action
                .pointer("/selected_option/value")
                .and_then(Value::as_str)
                .map(|value| FormValue::Selected(vec![value.to_owned()]))
                .unwrap_or(FormValue::Empty),
        ),
        "multi_static_select" | "checkboxes" => Some(FormValue::Selected(
            action
                .pointer("/selected_options")
                .and_then(Value::as_array)
                .map(|options| {
                    options
                        .iter()
                        .filter_map(|option| option.get("value").and_then(Value::as_str))
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        )),
        "datepicker" => Some(
            action
                .get("selected_date")
                .and_then(Value::as_str)
                .map(|value| FormValue::Text(value.to_owned()))
                .unwrap_or(FormValue::Empty),
        ),
        "timepicker" => Some(
            action
                .get("selected_time")
                .and_then(Value::as_str)
                .map(|value| FormValue::Text(value.to_owned()))
                .unwrap_or(FormValue::Empty),
        ),
        "plain_text_input" => Some(
            action
                .get("value")
                .and_then(Value::as_str)
                .map(|value| FormValue::Text(value.to_owned()))
                .unwrap_or(FormValue::Empty),
        ),
        _ => None,
    }
}

fn parse_block_actions(payload: &Value) -> Result<BlockActionsPayload, PayloadError> {
    let view = match payload.get("view") {
        Some(view) if view.is_object() => Some(parse_view(view)?),
        _ => None,
    };

    let mut form = view.as_ref().map(|view| view.state.clone()).unwrap_or_default();
    let mut actions = Vec::new();
    if let Some(entries) = payload.get("actions").and_then(Value::as_array) {
        for entry in entries {
            let (action, implied) = parse_action(entry)?;
            if let (Some(block_id), Some(value)) = (&action.block_id, implied) {
                form.insert(block_id.clone(), action.action_id.clone(), value);
            }
            actions.push(action);
        }
    }
    if actions.is_empty() {
        return Err(PayloadError::Malformed("block_actions without actions".to_owned()));
    }

    Ok(BlockActionsPayload {
        user_id: user_id(payload)?,
        team_id: optional_str(payload, "/team/id"),
        channel_id: optional_str(payload, "/channel/id")
            .or_else(|| optional_str(payload, "/container/channel_id")),
        message_ts: optional_str(payload, "/message/ts")
            .or_else(|| optional_str(payload, "/container/message_ts")),
        trigger_id: optional_str(payload, "/trigger_id"),
        response_url: optional_str(payload, "/response_url"),
        view,
        actions,
        form,
    })
}

fn parse_view_submission(payload: &Value) -> Result<ViewSubmissionPayload, PayloadError> {
    let view = payload.get("view").ok_or(PayloadError::MissingField("view"))?;
    Ok(ViewSubmissionPayload {
        user_id: user_id(payload)?,
        team_id: optional_str(payload, "/team/id"),
        trigger_id: optional_str(payload, "/trigger_id"),
        view: parse_view(view)?,
    })
}

fn parse_view_closed(payload: &Value) -> Result<ViewClosedPayload, PayloadError> {
    let view = payload.get("view").ok_or(PayloadError::MissingField("view"))?;
    Ok(ViewClosedPayload {
        user_id: user_id(payload)?,
        team_id: optional_str(payload, "/team/id"),
        view: parse_view(view)?,
        is_cleared: payload.get("is_cleared").and_then(Value::as_bool).unwrap_or(false),
    })
}

#[cfg(test)]
mod tests {
    use blocks_core::FormValue;
    use serde_json::json;

    use super::{InteractionPayload, PayloadError};

    #[test]
    fn block_actions_payload_merges_action_values_into_form_state() {
        let payload = json!({
            "type": "block_actions",
            "user": {"id": "U1"},
            "team": {"id": "T1"},
            "container": {"channel_id": "C1", "message_ts": "123.45"},
            "actions": [{
                "type": "static_select",
                "action_id": "root.0",
                "block_id": "root",
                "selected_option": {"value": "apac"}
            }]
        });

        let InteractionPayload::BlockActions(parsed) =
            InteractionPayload::parse(&payload).expect("parse")
        else {
            panic!("block actions expected");
        };
        assert_eq!(parsed.user_id, "U1");
        assert_eq!(parsed.channel_id.as_deref(), Some("C1"));
        assert_eq!(parsed.actions.len(), 1);
        assert_eq!(
            parsed.form.value("root", "root.0"),
            Some(&FormValue::Selected(vec!["apac".to_owned()]))
        );
    }

    #[test]
    fn view_submission_extracts_state_values_per_element_type() {
        let payload = json!({
            "type": "view_submission",
            "user": {"id": "U1"},
            "view": {
                "id": "V1",
                "callback_id": "form",
                "private_metadata": "",
                "state": {"values": {
                    "form.0": {"form.0": {"type": "plain_text_input", "value": "hello"}},
                    "form.1": {"form.1": {"type": "checkboxes", "selected_options": [
                        {"value": "a"}, {"value": "c"}
                    ]}},
                    "form.2": {"form.2": {"type": "datepicker", "selected_date": "2026-03-01"}}
                }}
            }
        });

        let InteractionPayload::ViewSubmission(parsed) =
            InteractionPayload::parse(&payload).expect("parse")
        else {
            panic!("view submission expected");
        };
        assert_eq!(parsed.view.callback_id.as_deref(), Some("form"));
        assert_eq!(
            parsed.view.state.value("form.0", "form.0"),
            Some(&FormValue::Text("hello".to_owned()))
        );
        assert_eq!(
            parsed.view.state.value("form.1", "form.1"),
            Some(&FormValue::Selected(vec!["a".to_owned(), "c".to_owned()]))
        );
        assert_eq!(
            parsed.view.state.value("form.2", "form.2"),
            Some(&FormValue::Text("2026-03-01".to_owned()))
        );
    }

    #[test]
    fn unknown_interaction_type_is_rejected() {
        let payload = json!({"type": "message_action", "user": {"id": "U1"}});
        assert_eq!(
            InteractionPayload::parse(&payload),
            Err(PayloadError::UnsupportedType("message_action".to_owned()))
        );
    }

    #[test]
    fn block_actions_without_actions_is_malformed() {
        let payload = json!({
            "type": "block_actions",
            "user": {"id": "U1"},
            "actions": []
        });
        assert!(matches!(
            InteractionPayload::parse(&payload),
            Err(PayloadError::Malformed(_))
        ));
    }
}
