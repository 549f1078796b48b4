use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde_json::Value;

use framestack_index::{queries, Database};
use framestack_types::{
    Digest, Error, Frame, FrameId, FrameState, FrameType, Result, Run, RunId,
};

/// `create(parent, type, name, inputs) -> frame_id`.
///
/// Rejects with `NotFound` if `parent` is unknown (§7: "frame/anchor/event
/// id unknown" is `NotFound`, not `Conflict`); rejects with `Conflict` if
/// `parent` is closed or belongs to a different run (§4.2).
pub fn create(
    db: &mut Database,
    run_id: RunId,
    parent_id: Option<FrameId>,
    frame_type: FrameType,
    name: impl Into<String>,
    inputs: Value,
) -> Result<Frame> {
    let name = name.into();

    if let Some(parent_id) = parent_id {
        let parent = queries::frame::get(db.conn(), parent_id)?
            .ok_or_else(|| Error::not_found(format!("unknown parent frame {parent_id}")))?;
        if !parent.is_open() {
            return Err(Error::conflict(format!("cannot create a child under closed frame {parent_id}")));
        }
        if parent.run_id != run_id {
            return Err(Error::conflict(format!("parent frame {parent_id} belongs to a different run")));
        }
    }

    db.in_transaction(|tx| {
        let frame = match parent_id {
            None => Frame::new_root(run_id, frame_type, name, inputs),
            Some(parent_id) => {
                let parent = queries::frame::get(tx, parent_id)?
                    .ok_or_else(|| framestack_index::Error::Query(format!("parent frame {parent_id} vanished mid-transaction")))?;
                Frame::new_child(&parent, frame_type, name, inputs)
            }
        };
        queries::frame::insert(tx, &frame)?;
        Ok(frame)
    })
    .map_err(Into::into)
}

/// `close(frame_id, outputs, digest) -> ()`.
///
/// Rejects with `NotFound` if `frame_id` is unknown (§7); rejects with
/// `Conflict` unless every descendant is already closed (§4.2). `embedding`
/// is the digest's embedding vector, if an oracle produced one.
pub fn close(
    db: &mut Database,
    frame_id: FrameId,
    outputs: Value,
    digest: Digest,
    embedding: Option<Vec<f32>>,
) -> Result<Frame> {
    if queries::frame::get(db.conn(), frame_id)?.is_none() {
        return Err(Error::not_found(format!("unknown frame {frame_id}")));
    }

    db.in_transaction(|tx| {
        let mut frame = queries::frame::get(tx, frame_id)?
            .ok_or_else(|| framestack_index::Error::Query(format!("frame {frame_id} vanished mid-transaction")))?;
        if !frame.is_open() {
            return Err(framestack_index::Error::Query(format!("frame {frame_id} is already closed")));
        }
        let open_children = queries::frame::count_open_children(tx, frame_id)?;
        if open_children > 0 {
            return Err(framestack_index::Error::Query(format!(
                "frame {frame_id} has {open_children} open descendant(s)"
            )));
        }
        let digest_json = serde_json::to_value(&digest)?;
        frame.close(outputs, digest.as_text(), digest_json);
        frame.digest_embedding = embedding;
        queries::frame::update(tx, &frame)?;
        Ok(frame)
    })
    .map_err(|e: framestack_index::Error| match e {
        framestack_index::Error::Query(msg) => Error::conflict(msg),
        other => other.into(),
    })
}

pub fn lookup(db: &Database, id: FrameId) -> Result<Frame> {
    queries::frame::get(db.conn(), id)?
        .ok_or_else(|| Error::not_found(format!("frame {id} not found")))
}

/// `active_path(run) -> ordered sequence root->leaf`.
///
/// If multiple open leaves exist (branching), follows the most recently
/// created leaf, tie-broken by id (§4.2).
pub fn active_path(db: &Database, run_id: RunId) -> Result<Vec<Frame>> {
    let frames = queries::frame::list_by_run(db.conn(), run_id)?;
    if frames.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: std::collections::HashMap<FrameId, &Frame> = frames.iter().map(|f| (f.id, f)).collect();
    let has_open_child: std::collections::HashSet<FrameId> = frames
        .iter()
        .filter_map(|f| f.parent_id)
        .filter(|parent| by_id.get(parent).is_some_and(|p| p.is_open()))
        .collect();

    let mut leaves: Vec<&Frame> = frames.iter().filter(|f| f.is_open() && !has_open_child.contains(&f.id)).collect();
    if leaves.is_empty() {
        return Ok(Vec::new());
    }
    leaves.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
    let leaf = leaves[0];

    let mut chain = vec![leaf.clone()];
    let mut cursor = leaf.parent_id;
    while let Some(parent_id) = cursor {
        let parent = by_id.get(&parent_id).ok_or_else(|| Error::internal("dangling parent reference"))?;
        chain.push((*parent).clone());
        cursor = parent.parent_id;
    }
    chain.reverse();
    Ok(chain)
}

/// Transition every frame under `run_id` with no activity for `window` to
/// `Stalled`. Still considered active for `active_path` purposes (§4.2).
pub fn apply_stall_window(db: &mut Database, run_id: RunId, window: ChronoDuration, now: DateTime<Utc>) -> Result<u64> {
    let frames = queries::frame::list_by_run(db.conn(), run_id)?;
    let mut transitioned = 0u64;
    db.in_transaction(|tx| {
        for mut frame in frames {
            if frame.state == FrameState::Active && now - frame.last_activity_at > window {
                frame.mark_stalled();
                queries::frame::update(tx, &frame)?;
                transitioned += 1;
            }
        }
        Ok(())
    })?;
    Ok(transitioned)
}

/// Bulk-delete a frame's events, anchors, and row in one transaction.
/// Only legal once the frame is closed (tombstoning, §4.1).
pub fn tombstone(db: &mut Database, frame_id: FrameId) -> Result<()> {
    db.in_transaction(|tx| {
        let frame = queries::frame::get(tx, frame_id)?
            .ok_or_else(|| framestack_index::Error::Query(format!("unknown frame {frame_id}")))?;
        if frame.is_open() {
            return Err(framestack_index::Error::Query(format!("cannot tombstone open frame {frame_id}")));
        }
        queries::event::delete_by_frame(tx, frame_id)?;
        queries::anchor::delete_by_frame(tx, frame_id)?;
        queries::frame::delete(tx, frame_id)?;
        Ok(())
    })
    .map_err(|e: framestack_index::Error| match e {
        framestack_index::Error::Query(msg) => Error::conflict(msg),
        other => other.into(),
    })
}

/// Touch a frame's `last_activity_at`, reactivating it if stalled. Called
/// whenever an event is appended under it.
pub fn touch(db: &mut Database, frame_id: FrameId, at: DateTime<Utc>) -> Result<()> {
    db.in_transaction(|tx| {
        let mut frame = queries::frame::get(tx, frame_id)?
            .ok_or_else(|| framestack_index::Error::Query(format!("unknown frame {frame_id}")))?;
        frame.touch(at);
        queries::frame::update(tx, &frame)?;
        Ok(())
    })?;
    Ok(())
}

pub fn start_run(db: &mut Database, run: &Run) -> Result<()> {
    db.in_transaction(|tx| {
        queries::run::insert(tx, run)?;
        Ok(())
    })?;
    Ok(())
}

pub fn finish_run(db: &mut Database, run: &Run) -> Result<()> {
    db.in_transaction(|tx| {
        queries::run::update_state(tx, run)?;
        Ok(())
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_types::{Project, ProjectId, RunState};

    fn setup() -> (Database, RunId) {
        let mut db = Database::open_in_memory().unwrap();
        let project = Project::new(ProjectId::from_source("/tmp/store-test"), "store-test");
        queries::project::upsert(db.conn(), &project).unwrap();
        let run = Run::start(project.id);
        start_run(&mut db, &run).unwrap();
        (db, run.id)
    }

    #[test]
    fn create_rejects_child_under_closed_parent() {
        let (mut db, run_id) = setup();
        let root = create(&mut db, run_id, None, FrameType::Task, "root", Value::Null).unwrap();
        close(&mut db, root.id, Value::Null, Digest::default(), None).unwrap();

        let err = create(&mut db, run_id, Some(root.id), FrameType::Subtask, "child", Value::Null).unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::Conflict);
    }

    #[test]
    fn create_under_unknown_parent_is_not_found() {
        let (mut db, run_id) = setup();
        let err = create(&mut db, run_id, Some(FrameId::new()), FrameType::Subtask, "orphan", Value::Null).unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::NotFound);
    }

    #[test]
    fn close_rejects_while_children_are_open() {
        let (mut db, run_id) = setup();
        let root = create(&mut db, run_id, None, FrameType::Task, "root", Value::Null).unwrap();
        create(&mut db, run_id, Some(root.id), FrameType::Subtask, "child", Value::Null).unwrap();

        let err = close(&mut db, root.id, Value::Null, Digest::default(), None).unwrap_err();
        assert_eq!(err.kind(), framestack_types::ErrorKind::Conflict);
    }

    #[test]
    fn active_path_follows_most_recently_created_open_leaf() {
        let (mut db, run_id) = setup();
        let root = create(&mut db, run_id, None, FrameType::Task, "root", Value::Null).unwrap();
        let a = create(&mut db, run_id, Some(root.id), FrameType::Subtask, "a", Value::Null).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = create(&mut db, run_id, Some(root.id), FrameType::Subtask, "b", Value::Null).unwrap();

        let path = active_path(&db, run_id).unwrap();
        assert_eq!(path.iter().map(|f| f.id).collect::<Vec<_>>(), vec![root.id, b.id]);
        let _ = a;
    }

    #[test]
    fn depth_is_computed_on_insert() {
        let (mut db, run_id) = setup();
        let root = create(&mut db, run_id, None, FrameType::Task, "root", Value::Null).unwrap();
        let child = create(&mut db, run_id, Some(root.id), FrameType::Subtask, "child", Value::Null).unwrap();
        assert_eq!(root.depth, 0);
        assert_eq!(child.depth, 1);
    }

    #[test]
    fn tombstone_removes_frame_events_and_anchors() {
        let (mut db, run_id) = setup();
        let root = create(&mut db, run_id, None, FrameType::Task, "root", Value::Null).unwrap();
        close(&mut db, root.id, Value::Null, Digest::default(), None).unwrap();
        tombstone(&mut db, root.id).unwrap();
        assert!(lookup(&db, root.id).is_err());
    }

    #[test]
    fn finish_run_persists_terminal_state() {
        let (mut db, run_id) = setup();
        let mut run = queries::run::get(db.conn(), run_id).unwrap().unwrap();
        run.finish(RunState::Completed);
        finish_run(&mut db, &run).unwrap();
        let reloaded = queries::run::get(db.conn(), run_id).unwrap().unwrap();
        assert_eq!(reloaded.state, RunState::Completed);
    }
}
