use rusqlite::{params, Connection, OptionalExtension};

use framestack_types::{Project, ProjectId};

use crate::records::format_ts;
use crate::Result;

pub fn upsert(conn: &Connection, project: &Project) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO projects (id, display_name, settings_json, created_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(id) DO UPDATE SET
            display_name = ?2,
            settings_json = ?3
        "#,
        params![
            project.id.as_str(),
            project.display_name,
            serde_json::to_string(&project.settings)?,
            format_ts(project.created_at),
        ],
    )?;
    Ok(())
}

pub fn get(conn: &Connection, id: &ProjectId) -> Result<Option<Project>> {
    conn.query_row(
        "SELECT id, display_name, settings_json, created_at FROM projects WHERE id = ?1",
        [id.as_str()],
        |row| {
            let id: String = row.get(0)?;
            let display_name: String = row.get(1)?;
            let settings_json: String = row.get(2)?;
            let created_at: String = row.get(3)?;
            Ok((id, display_name, settings_json, created_at))
        },
    )
    .optional()?
    .map(|(id, display_name, settings_json, created_at)| {
        Ok(Project {
            id: ProjectId::from_raw(id),
            display_name,
            settings: serde_json::from_str(&settings_json)?,
            created_at: crate::records::parse_ts(&created_at)?,
        })
    })
    .transpose()
}
