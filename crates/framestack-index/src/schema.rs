use rusqlite::Connection;

use crate::Result;

/// Bump whenever a table definition changes; mismatched versions are
/// resolved by dropping and recreating every table (destructive, but the
/// event log and frame store are the source of truth during a migration
/// window only in pathological crash-recovery scenarios).
pub const SCHEMA_VERSION: i32 = 1;

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != 0 && current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            settings_json TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS runs (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL,
            start_ts TEXT NOT NULL,
            end_ts TEXT,
            state TEXT NOT NULL,
            FOREIGN KEY (project_id) REFERENCES projects(id)
        );

        CREATE TABLE IF NOT EXISTS frames (
            id TEXT PRIMARY KEY,
            run_id TEXT NOT NULL,
            parent_id TEXT,
            depth INTEGER NOT NULL,
            frame_type TEXT NOT NULL,
            name TEXT NOT NULL,
            state TEXT NOT NULL,
            inputs_json TEXT NOT NULL,
            outputs_json TEXT,
            digest_text TEXT,
            digest_json TEXT,
            digest_embedding_json TEXT,
            created_at TEXT NOT NULL,
            closed_at TEXT,
            last_activity_at TEXT NOT NULL,
            FOREIGN KEY (run_id) REFERENCES runs(id)
        );

        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            frame_id TEXT NOT NULL,
            shard INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            event_type TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            FOREIGN KEY (frame_id) REFERENCES frames(id),
            UNIQUE (frame_id, shard, seq)
        );

        CREATE TABLE IF NOT EXISTS anchors (
            id TEXT PRIMARY KEY,
            frame_id TEXT NOT NULL,
            anchor_type TEXT NOT NULL,
            text TEXT NOT NULL,
            priority INTEGER NOT NULL,
            supersedes TEXT,
            created_at TEXT NOT NULL,
            FOREIGN KEY (frame_id) REFERENCES frames(id)
        );

        CREATE TABLE IF NOT EXISTS traces (
            id TEXT PRIMARY KEY,
            trace_type TEXT NOT NULL,
            start_ts TEXT NOT NULL,
            end_ts TEXT NOT NULL,
            events_json TEXT NOT NULL,
            importance REAL NOT NULL,
            summary TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_runs_project ON runs(project_id);
        CREATE INDEX IF NOT EXISTS idx_frames_run ON frames(run_id);
        CREATE INDEX IF NOT EXISTS idx_frames_parent ON frames(parent_id);
        CREATE INDEX IF NOT EXISTS idx_frames_created_at ON frames(created_at DESC);
        CREATE INDEX IF NOT EXISTS idx_events_frame_position ON events(frame_id, seq, shard);
        CREATE INDEX IF NOT EXISTS idx_anchors_frame ON anchors(frame_id);
        CREATE INDEX IF NOT EXISTS idx_traces_start ON traces(start_ts);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {SCHEMA_VERSION}"), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS anchors;
        DROP TABLE IF EXISTS events;
        DROP TABLE IF EXISTS traces;
        DROP TABLE IF EXISTS frames;
        DROP TABLE IF EXISTS runs;
        DROP TABLE IF EXISTS projects;
        "#,
    )?;
    Ok(())
}
