use rusqlite::{params, Connection};

use framestack_types::{Event, EventId, EventPosition, EventPayload, FrameId};

use crate::records::{event_type_to_str, format_ts, parse_ts};
use crate::Result;

pub fn append(conn: &Connection, event: &Event) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO events (id, frame_id, shard, seq, event_type, payload_json, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            event.id.to_string(),
            event.frame_id.to_string(),
            event.position.shard,
            event.position.seq,
            event_type_to_str(event.event_type()),
            serde_json::to_string(&event.payload)?,
            format_ts(event.timestamp),
        ],
    )?;
    Ok(())
}

type EventRow = (String, String, u16, u64, String, String);

fn row_to_event(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
}

fn build_event(row: EventRow) -> Result<Event> {
    let (id, frame_id, shard, seq, payload_json, timestamp) = row;
    Ok(Event {
        id: id.parse::<EventId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        frame_id: frame_id.parse::<FrameId>().map_err(|e| crate::Error::Query(e.to_string()))?,
        position: EventPosition { seq, shard },
        payload: serde_json::from_str::<EventPayload>(&payload_json)?,
        timestamp: parse_ts(&timestamp)?,
    })
}

const SELECT_COLUMNS: &str = "id, frame_id, shard, seq, payload_json, timestamp";

/// Events for `frame_id` with `seq >= from_seq`, merged across shards in
/// `(seq, shard)` order, capped at `limit` (0 means unbounded).
pub fn range(conn: &Connection, frame_id: FrameId, from_seq: u64, limit: usize) -> Result<Vec<Event>> {
    let query = if limit == 0 {
        format!(
            "SELECT {SELECT_COLUMNS} FROM events WHERE frame_id = ?1 AND seq >= ?2 ORDER BY seq ASC, shard ASC"
        )
    } else {
        format!(
            "SELECT {SELECT_COLUMNS} FROM events WHERE frame_id = ?1 AND seq >= ?2 ORDER BY seq ASC, shard ASC LIMIT ?3"
        )
    };
    let mut stmt = conn.prepare(&query)?;
    let rows = if limit == 0 {
        stmt.query_map(params![frame_id.to_string(), from_seq], row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?
    } else {
        stmt.query_map(params![frame_id.to_string(), from_seq, limit as i64], row_to_event)?
            .collect::<std::result::Result<Vec<_>, _>>()?
    };
    rows.into_iter().map(build_event).collect()
}

/// The next unallocated `seq` for every shard that has at least one
/// persisted event, as `(shard, max_seq + 1)`. Used to rehydrate a
/// [`framestack_core::Clock`] when reopening an existing store so appends
/// in a new process continue past whatever was last persisted instead of
/// restarting at 0 (§4.1, §5).
pub fn next_seq_by_shard(conn: &Connection) -> Result<Vec<(u16, u64)>> {
    let mut stmt = conn.prepare("SELECT shard, MAX(seq) FROM events GROUP BY shard")?;
    let rows = stmt
        .query_map([], |row| {
            let shard: u16 = row.get(0)?;
            let max_seq: u64 = row.get(1)?;
            Ok((shard, max_seq + 1))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Bulk delete every event under `frame_id`. Only legal as part of frame
/// tombstoning (§4.1: "Delete is bulk and allowed only during frame
/// tombstoning"); never called to prune an active frame's log.
pub fn delete_by_frame(conn: &Connection, frame_id: FrameId) -> Result<()> {
    conn.execute("DELETE FROM events WHERE frame_id = ?1", params![frame_id.to_string()])?;
    Ok(())
}

/// The `n` most recent events for `frame_id`, returned in ascending
/// per-frame order.
pub fn tail(conn: &Connection, frame_id: FrameId, n: usize) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SELECT_COLUMNS} FROM events WHERE frame_id = ?1 ORDER BY seq DESC, shard DESC LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(params![frame_id.to_string(), n as i64], row_to_event)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let mut events = rows.into_iter().map(build_event).collect::<Result<Vec<_>>>()?;
    events.reverse();
    Ok(events)
}
