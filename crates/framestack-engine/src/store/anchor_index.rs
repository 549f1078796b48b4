use framestack_index::{queries, Database};
use framestack_types::{Anchor, AnchorId, AnchorType, Error, FrameId, Result};

use super::frame_store;

/// `add(frame_id, type, text, priority, supersedes?) -> anchor_id`.
///
/// Rejects if `frame_id` is closed (anchors pin facts to live reasoning,
/// §4.3) or if `supersedes` names an anchor under a different frame.
pub fn add(
    db: &mut Database,
    frame_id: FrameId,
    anchor_type: AnchorType,
    text: impl Into<String>,
    priority: u8,
    supersedes: Option<AnchorId>,
) -> Result<Anchor> {
    let frame = frame_store::lookup(db, frame_id)?;
    if !frame.is_open() {
        return Err(Error::conflict(format!("cannot anchor to closed frame {frame_id}")));
    }
    if let Some(previous_id) = supersedes {
        let existing = queries::anchor::list(db.conn(), frame_id, None, None)?;
        if !existing.iter().any(|a| a.id == previous_id) {
            return Err(Error::invalid_argument(format!(
                "superseded anchor {previous_id} is not under frame {frame_id}"
            )));
        }
    }

    let mut anchor = Anchor::new(frame_id, anchor_type, text, priority);
    if let Some(previous_id) = supersedes {
        anchor = anchor.superseding(previous_id);
    }
    db.in_transaction(|tx| {
        queries::anchor::insert(tx, &anchor)?;
        Ok(())
    })?;
    Ok(anchor)
}

/// `list(frame_id, types?, min_priority?) -> priority-ordered anchors`.
///
/// Includes superseded anchors; callers that want only the live set filter
/// out any anchor id referenced by another anchor's `supersedes` (§4.3: a
/// superseded anchor remains visible unless the caller filters it).
pub fn list(
    db: &Database,
    frame_id: FrameId,
    types: Option<&[AnchorType]>,
    min_priority: Option<u8>,
) -> Result<Vec<Anchor>> {
    Ok(queries::anchor::list(db.conn(), frame_id, types, min_priority)?)
}

/// `list` filtered down to anchors that are not themselves superseded by a
/// later one.
pub fn list_live(
    db: &Database,
    frame_id: FrameId,
    types: Option<&[AnchorType]>,
    min_priority: Option<u8>,
) -> Result<Vec<Anchor>> {
    let all = list(db, frame_id, types, min_priority)?;
    let superseded: std::collections::HashSet<AnchorId> = all.iter().filter_map(|a| a.supersedes).collect();
    Ok(all.into_iter().filter(|a| !superseded.contains(&a.id)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_types::{Frame, FrameType, Project, ProjectId, Run};
    use serde_json::Value;

    fn setup() -> (Database, FrameId) {
        let mut db = Database::open_in_memory().unwrap();
        let project = Project::new(ProjectId::from_source("/tmp/anchor-index-test"), "anchor-index-test");
        queries::project::upsert(db.conn(), &project).unwrap();
        let run = Run::start(project.id);
        queries::run::insert(db.conn(), &run).unwrap();
        let root = Frame::new_root(run.id, FrameType::Task, "root", Value::Null);
        queries::frame::insert(db.conn(), &root).unwrap();
        (db, root.id)
    }

    #[test]
    fn add_rejects_on_closed_frame() {
        let (mut db, frame_id) = setup();
        let mut frame = frame_store::lookup(&db, frame_id).unwrap();
        frame.close(Value::Null, "done".into(), Value::Null);
        db.in_transaction(|tx| {
            queries::frame::update(tx, &frame)?;
            Ok(())
        })
        .unwrap();

        let err = add(&mut db, frame_id, AnchorType::Fact, "x", 5, None).unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::Conflict);
    }

    #[test]
    fn list_orders_by_priority_desc_then_creation_asc() {
        let (mut db, frame_id) = setup();
        add(&mut db, frame_id, AnchorType::Fact, "low", 1, None).unwrap();
        add(&mut db, frame_id, AnchorType::Fact, "high", 9, None).unwrap();
        let anchors = list(&db, frame_id, None, None).unwrap();
        assert_eq!(anchors[0].text, "high");
        assert_eq!(anchors[1].text, "low");
    }

    #[test]
    fn list_live_excludes_superseded_anchors() {
        let (mut db, frame_id) = setup();
        let original = add(&mut db, frame_id, AnchorType::Decision, "v1", 5, None).unwrap();
        add(&mut db, frame_id, AnchorType::Decision, "v2", 5, Some(original.id)).unwrap();

        let all = list(&db, frame_id, None, None).unwrap();
        assert_eq!(all.len(), 2);

        let live = list_live(&db, frame_id, None, None).unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].text, "v2");
    }

    #[test]
    fn add_rejects_supersedes_of_unknown_anchor() {
        let (mut db, frame_id) = setup();
        let err = add(&mut db, frame_id, AnchorType::Fact, "x", 5, Some(AnchorId::new())).unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::InvalidArgument);
    }
}
