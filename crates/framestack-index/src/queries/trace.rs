use rusqlite::{params, Connection, OptionalExtension};

use framestack_types::{EventId, Trace, TraceId, TraceType};

use crate::records::format_ts;
use crate::Result;

fn trace_type_to_str(t: TraceType) -> &'static str {
    match t {
        TraceType::SearchDriven => "search_driven",
        TraceType::ErrorRecovery => "error_recovery",
        TraceType::FeatureImplementation => "feature_implementation",
        TraceType::Refactoring => "refactoring",
        TraceType::Testing => "testing",
        TraceType::Exploration => "exploration",
        TraceType::Debugging => "debugging",
        TraceType::Documentation => "documentation",
        TraceType::BuildDeploy => "build_deploy",
        TraceType::Unknown => "unknown",
    }
}

fn trace_type_from_str(s: &str) -> Result<TraceType> {
    Ok(match s {
        "search_driven" => TraceType::SearchDriven,
        "error_recovery" => TraceType::ErrorRecovery,
        "feature_implementation" => TraceType::FeatureImplementation,
        "refactoring" => TraceType::Refactoring,
        "testing" => TraceType::Testing,
        "exploration" => TraceType::Exploration,
        "debugging" => TraceType::Debugging,
        "documentation" => TraceType::Documentation,
        "build_deploy" => TraceType::BuildDeploy,
        "unknown" => TraceType::Unknown,
        other => return Err(crate::Error::Query(format!("unknown trace_type {other:?}"))),
    })
}

pub fn insert(conn: &Connection, trace: &Trace) -> Result<()> {
    let event_ids: Vec<String> = trace.events.iter().map(|e| e.to_string()).collect();
    conn.execute(
        r#"
        INSERT INTO traces (id, trace_type, start_ts, end_ts, events_json, importance, summary)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(id) DO UPDATE SET
            trace_type = ?2, end_ts = ?4, events_json = ?5, importance = ?6, summary = ?7
        "#,
        params![
            trace.id.to_string(),
            trace_type_to_str(trace.trace_type),
            format_ts(trace.start_ts),
            format_ts(trace.end_ts),
            serde_json::to_string(&event_ids)?,
            trace.importance,
            trace.summary,
        ],
    )?;
    Ok(())
}

type TraceRow = (String, String, String, String, String, f64, Option<String>);

fn row_to_trace(row: &rusqlite::Row<'_>) -> rusqlite::Result<TraceRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
}

fn build_trace(row: TraceRow) -> Result<Trace> {
    let (id, trace_type, start_ts, end_ts, events_json, importance, summary) = row;
    let event_ids: Vec<String> = serde_json::from_str(&events_json)?;
    let events = event_ids
        .into_iter()
        .map(|s| s.parse::<EventId>().map_err(|e| crate::Error::Query(e.to_string())))
        .collect::<Result<Vec<_>>>()?;
    Ok(Trace {
        id: id.parse::<TraceId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        trace_type: trace_type_from_str(&trace_type)?,
        start_ts: crate::records::parse_ts(&start_ts)?,
        end_ts: crate::records::parse_ts(&end_ts)?,
        events,
        importance,
        summary,
    })
}

const SELECT_COLUMNS: &str = "id, trace_type, start_ts, end_ts, events_json, importance, summary";

pub fn get(conn: &Connection, id: TraceId) -> Result<Option<Trace>> {
    let row: Option<TraceRow> = conn
        .query_row(&format!("SELECT {SELECT_COLUMNS} FROM traces WHERE id = ?1"), [id.to_string()], row_to_trace)
        .optional()?;
    row.map(build_trace).transpose()
}

pub fn list_recent(conn: &Connection, limit: usize) -> Result<Vec<Trace>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM traces ORDER BY start_ts DESC LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit as i64], row_to_trace)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    rows.into_iter().map(build_trace).collect()
}
