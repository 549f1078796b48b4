use rusqlite::{params, Connection, OptionalExtension};

use framestack_types::{Frame, FrameId, FrameState, RunId};

use crate::records::{format_ts, frame_state_from_str, frame_state_to_str, frame_type_from_str, frame_type_to_str, parse_ts};
use crate::Result;

pub fn insert(conn: &Connection, frame: &Frame) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO frames (
            id, run_id, parent_id, depth, frame_type, name, state,
            inputs_json, outputs_json, digest_text, digest_json, digest_embedding_json,
            created_at, closed_at, last_activity_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
        params![
            frame.id.to_string(),
            frame.run_id.to_string(),
            frame.parent_id.map(|p| p.to_string()),
            frame.depth,
            frame_type_to_str(frame.frame_type),
            frame.name,
            frame_state_to_str(frame.state),
            serde_json::to_string(&frame.inputs)?,
            frame.outputs.as_ref().map(serde_json::to_string).transpose()?,
            frame.digest_text,
            frame.digest_json.as_ref().map(serde_json::to_string).transpose()?,
            frame.digest_embedding.as_ref().map(serde_json::to_string).transpose()?,
            format_ts(frame.created_at),
            frame.closed_at.map(format_ts),
            format_ts(frame.last_activity_at),
        ],
    )?;
    Ok(())
}

pub fn update(conn: &Connection, frame: &Frame) -> Result<()> {
    conn.execute(
        r#"
        UPDATE frames SET
            state = ?2, outputs_json = ?3, digest_text = ?4, digest_json = ?5,
            digest_embedding_json = ?6, closed_at = ?7, last_activity_at = ?8
        WHERE id = ?1
        "#,
        params![
            frame.id.to_string(),
            frame_state_to_str(frame.state),
            frame.outputs.as_ref().map(serde_json::to_string).transpose()?,
            frame.digest_text,
            frame.digest_json.as_ref().map(serde_json::to_string).transpose()?,
            frame.digest_embedding.as_ref().map(serde_json::to_string).transpose()?,
            frame.closed_at.map(format_ts),
            format_ts(frame.last_activity_at),
        ],
    )?;
    Ok(())
}

type FrameRow = (
    String,
    String,
    Option<String>,
    u32,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
    Option<String>,
    String,
);

fn row_to_frame(row: &rusqlite::Row<'_>) -> rusqlite::Result<FrameRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
        row.get(14)?,
    ))
}

fn build_frame(row: FrameRow) -> Result<Frame> {
    let (
        id,
        run_id,
        parent_id,
        depth,
        frame_type,
        name,
        state,
        inputs_json,
        outputs_json,
        digest_text,
        digest_json,
        digest_embedding_json,
        created_at,
        closed_at,
        last_activity_at,
    ) = row;

    Ok(Frame {
        id: id.parse::<FrameId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        run_id: run_id.parse::<RunId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        parent_id: parent_id
            .map(|p| p.parse::<FrameId>().map_err(|e| crate::Error::Query(e.to_string())))
            .transpose()?,
        depth,
        frame_type: frame_type_from_str(&frame_type)?,
        name,
        state: frame_state_from_str(&state)?,
        inputs: serde_json::from_str(&inputs_json)?,
        outputs: outputs_json.map(|s| serde_json::from_str(&s)).transpose()?,
        digest_text,
        digest_json: digest_json.map(|s| serde_json::from_str(&s)).transpose()?,
        digest_embedding: digest_embedding_json.map(|s| serde_json::from_str(&s)).transpose()?,
        created_at: parse_ts(&created_at)?,
        closed_at: closed_at.map(|s| parse_ts(&s)).transpose()?,
        last_activity_at: parse_ts(&last_activity_at)?,
    })
}

const SELECT_COLUMNS: &str = r#"
    id, run_id, parent_id, depth, frame_type, name, state,
    inputs_json, outputs_json, digest_text, digest_json, digest_embedding_json,
    created_at, closed_at, last_activity_at
"#;

pub fn get(conn: &Connection, id: FrameId) -> Result<Option<Frame>> {
    let row: Option<FrameRow> = conn
        .query_row(
            &format!("SELECT {SELECT_COLUMNS} FROM frames WHERE id = ?1"),
            [id.to_string()],
            row_to_frame,
        )
        .optional()?;
    row.map(build_frame).transpose()
}

pub fn list_by_run(conn: &Connection, run_id: RunId) -> Result<Vec<Frame>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM frames WHERE run_id = ?1 ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map([run_id.to_string()], row_to_frame)?;
    rows.map(|r| build_frame(r?)).collect()
}

/// Every frame filed under any run of `project_id`, newest first. This is
/// the candidate pool the retrieval pipeline scores against.
pub fn list_by_project(conn: &Connection, project_id: &str) -> Result<Vec<Frame>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM frames \
         WHERE run_id IN (SELECT id FROM runs WHERE project_id = ?1) \
         ORDER BY created_at DESC"
    ))?;
    let rows = stmt.query_map([project_id], row_to_frame)?;
    rows.map(|r| build_frame(r?)).collect()
}

pub fn list_children(conn: &Connection, parent_id: FrameId) -> Result<Vec<Frame>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM frames WHERE parent_id = ?1 ORDER BY created_at ASC"
    ))?;
    let rows = stmt.query_map([parent_id.to_string()], row_to_frame)?;
    rows.map(|r| build_frame(r?)).collect()
}

/// All frames under `run_id` that are neither active nor stalled, used to
/// check the "no open descendants" invariant before a close.
pub fn count_open_children(conn: &Connection, parent_id: FrameId) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM frames WHERE parent_id = ?1 AND state != ?2",
        params![parent_id.to_string(), frame_state_to_str(FrameState::Closed)],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Delete the frame row itself. Only called after its events and anchors
/// have already been deleted in the same tombstoning transaction.
pub fn delete(conn: &Connection, id: FrameId) -> Result<()> {
    conn.execute("DELETE FROM frames WHERE id = ?1", [id.to_string()])?;
    Ok(())
}

/// Children ids of `parent_id`, for the frame-store's "no open descendants"
/// check and for cascading lookups during tombstoning.
pub fn list_child_ids(conn: &Connection, parent_id: FrameId) -> Result<Vec<FrameId>> {
    let mut stmt = conn.prepare("SELECT id FROM frames WHERE parent_id = ?1")?;
    let rows = stmt.query_map([parent_id.to_string()], |row| row.get::<_, String>(0))?;
    rows.map(|r| {
        r?.parse::<FrameId>().map_err(|e| crate::Error::Query(e.to_string()))
    })
    .collect()
}
