use rusqlite::{params, Connection, OptionalExtension};

use framestack_types::{ProjectId, Run, RunId};

use crate::records::{format_ts, parse_ts, run_state_from_str, run_state_to_str};
use crate::Result;

pub fn insert(conn: &Connection, run: &Run) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO runs (id, project_id, start_ts, end_ts, state)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            run.id.to_string(),
            run.project_id.as_str(),
            format_ts(run.start_ts),
            run.end_ts.map(format_ts),
            run_state_to_str(run.state),
        ],
    )?;
    Ok(())
}

pub fn update_state(conn: &Connection, run: &Run) -> Result<()> {
    conn.execute(
        "UPDATE runs SET end_ts = ?2, state = ?3 WHERE id = ?1",
        params![run.id.to_string(), run.end_ts.map(format_ts), run_state_to_str(run.state)],
    )?;
    Ok(())
}

/// Runs under `project_id`, most recently started first.
pub fn list_by_project(conn: &Connection, project_id: &ProjectId) -> Result<Vec<Run>> {
    let mut stmt = conn.prepare(
        "SELECT id, project_id, start_ts, end_ts, state FROM runs \
         WHERE project_id = ?1 ORDER BY start_ts DESC",
    )?;
    let rows = stmt.query_map([project_id.as_str()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;
    rows.map(|r| {
        let (id, project_id, start_ts, end_ts, state) = r?;
        Ok(Run {
            id: id.parse::<RunId>().map_err(|e| crate::Error::Query(e.to_string()))?,
            project_id: ProjectId::from_raw(project_id),
            start_ts: parse_ts(&start_ts)?,
            end_ts: end_ts.map(|s| parse_ts(&s)).transpose()?,
            state: run_state_from_str(&state)?,
        })
    })
    .collect()
}

type RunRow = (String, String, String, Option<String>, String);

pub fn get(conn: &Connection, id: RunId) -> Result<Option<Run>> {
    let row: Option<RunRow> = conn
        .query_row(
            "SELECT id, project_id, start_ts, end_ts, state FROM runs WHERE id = ?1",
            [id.to_string()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .optional()?;

    row.map(|(id, project_id, start_ts, end_ts, state)| {
        Ok(Run {
            id: id.parse::<RunId>().map_err(|e| crate::Error::Query(e.to_string()))?,
            project_id: ProjectId::from_raw(project_id),
            start_ts: parse_ts(&start_ts)?,
            end_ts: end_ts.map(|s| parse_ts(&s)).transpose()?,
            state: run_state_from_str(&state)?,
        })
    })
    .transpose()
}
