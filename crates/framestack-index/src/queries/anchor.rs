use rusqlite::{params, Connection};

use framestack_types::{Anchor, AnchorId, AnchorType, FrameId};

use crate::records::{anchor_type_from_str, anchor_type_to_str, format_ts, parse_ts};
use crate::Result;

pub fn insert(conn: &Connection, anchor: &Anchor) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO anchors (id, frame_id, anchor_type, text, priority, supersedes, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            anchor.id.to_string(),
            anchor.frame_id.to_string(),
            anchor_type_to_str(anchor.anchor_type),
            anchor.text,
            anchor.priority,
            anchor.supersedes.map(|s| s.to_string()),
            format_ts(anchor.created_at),
        ],
    )?;
    Ok(())
}

type AnchorRow = (String, String, String, String, u8, Option<String>, String);

fn row_to_anchor(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnchorRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?))
}

fn build_anchor(row: AnchorRow) -> Result<Anchor> {
    let (id, frame_id, anchor_type, text, priority, supersedes, created_at) = row;
    Ok(Anchor {
        id: id.parse::<AnchorId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        frame_id: frame_id.parse::<FrameId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        anchor_type: anchor_type_from_str(&anchor_type)?,
        text,
        priority,
        supersedes: supersedes
            .map(|s| s.parse::<AnchorId>().map_err(|e| crate::Error::Query(e.to_string())))
            .transpose()?,
        created_at: parse_ts(&created_at)?,
    })
}

/// Bulk delete every anchor under `frame_id`, as part of frame tombstoning.
pub fn delete_by_frame(conn: &Connection, frame_id: FrameId) -> Result<()> {
    conn.execute("DELETE FROM anchors WHERE frame_id = ?1", params![frame_id.to_string()])?;
    Ok(())
}

const SELECT_COLUMNS: &str = "id, frame_id, anchor_type, text, priority, supersedes, created_at";

/// `list(frame_id, types?, min_priority?)`: ordered priority descending,
/// creation ascending (stable).
pub fn list(
    conn: &Connection,
    frame_id: FrameId,
    types: Option<&[AnchorType]>,
    min_priority: Option<u8>,
) -> Result<Vec<Anchor>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM anchors WHERE frame_id = ?1 ORDER BY priority DESC, created_at ASC"
    ))?;
    let rows = stmt
        .query_map([frame_id.to_string()], row_to_anchor)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let anchors = rows.into_iter().map(build_anchor).collect::<Result<Vec<_>>>()?;

    Ok(anchors
        .into_iter()
        .filter(|a| types.is_none_or(|ts| ts.contains(&a.anchor_type)))
        .filter(|a| min_priority.is_none_or(|min| a.priority >= min))
        .collect())
}
