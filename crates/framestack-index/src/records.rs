use chrono::{DateTime, Utc};
use framestack_types::{AnchorType, EventType, FrameState, FrameType, RunState};

use crate::{Error, Result};

pub fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Query(format!("invalid timestamp {s:?}: {e}")))
}

pub fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub fn frame_type_to_str(t: FrameType) -> &'static str {
    t.as_str()
}

pub fn frame_type_from_str(s: &str) -> Result<FrameType> {
    Ok(match s {
        "task" => FrameType::Task,
        "subtask" => FrameType::Subtask,
        "tool_scope" => FrameType::ToolScope,
        "review" => FrameType::Review,
        "write" => FrameType::Write,
        "debug" => FrameType::Debug,
        "feature" => FrameType::Feature,
        "bug" => FrameType::Bug,
        "refactor" => FrameType::Refactor,
        "architecture" => FrameType::Architecture,
        "milestone" => FrameType::Milestone,
        other => return Err(Error::Query(format!("unknown frame_type {other:?}"))),
    })
}

pub fn frame_state_to_str(s: FrameState) -> &'static str {
    match s {
        FrameState::Active => "active",
        FrameState::Stalled => "stalled",
        FrameState::Closed => "closed",
    }
}

pub fn frame_state_from_str(s: &str) -> Result<FrameState> {
    Ok(match s {
        "active" => FrameState::Active,
        "stalled" => FrameState::Stalled,
        "closed" => FrameState::Closed,
        other => return Err(Error::Query(format!("unknown frame state {other:?}"))),
    })
}

pub fn run_state_to_str(s: RunState) -> &'static str {
    match s {
        RunState::Active => "active",
        RunState::Completed => "completed",
        RunState::Failed => "failed",
    }
}

pub fn run_state_from_str(s: &str) -> Result<RunState> {
    Ok(match s {
        "active" => RunState::Active,
        "completed" => RunState::Completed,
        "failed" => RunState::Failed,
        other => return Err(Error::Query(format!("unknown run state {other:?}"))),
    })
}

pub fn anchor_type_to_str(t: AnchorType) -> &'static str {
    match t {
        AnchorType::Fact => "fact",
        AnchorType::Decision => "decision",
        AnchorType::Constraint => "constraint",
        AnchorType::InterfaceContract => "interface_contract",
        AnchorType::Todo => "todo",
        AnchorType::Risk => "risk",
    }
}

pub fn anchor_type_from_str(s: &str) -> Result<AnchorType> {
    Ok(match s {
        "fact" => AnchorType::Fact,
        "decision" => AnchorType::Decision,
        "constraint" => AnchorType::Constraint,
        "interface_contract" => AnchorType::InterfaceContract,
        "todo" => AnchorType::Todo,
        "risk" => AnchorType::Risk,
        other => return Err(Error::Query(format!("unknown anchor_type {other:?}"))),
    })
}

pub fn event_type_to_str(t: EventType) -> &'static str {
    match t {
        EventType::UserMessage => "user_message",
        EventType::AssistantMessage => "assistant_message",
        EventType::ToolCall => "tool_call",
        EventType::ToolResult => "tool_result",
        EventType::Decision => "decision",
        EventType::Constraint => "constraint",
        EventType::Artifact => "artifact",
        EventType::Observation => "observation",
    }
}
