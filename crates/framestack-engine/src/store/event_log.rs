use chrono::Utc;

use framestack_core::Clock;
use framestack_index::{queries, Database};
use framestack_types::{Event, EventId, EventPayload, FrameId, Result};

use super::frame_store;

/// `append(frame_id, event) -> (shard, seq)`. Touches the owning frame's
/// `last_activity_at` in the same transaction, so stall detection and
/// event appends never disagree about recency.
pub fn append(db: &mut Database, clock: &Clock, frame_id: FrameId, payload: EventPayload) -> Result<Event> {
    let position = clock.next_position(frame_id);
    let event = Event { id: EventId::new(), frame_id, position, payload, timestamp: Utc::now() };
    db.in_transaction(|tx| {
        queries::event::append(tx, &event)?;
        Ok(())
    })?;
    frame_store::touch(db, frame_id, event.timestamp)?;
    Ok(event)
}

/// `range(frame_id, from_seq, limit) -> ordered events`. Returns an empty
/// sequence for an unknown frame rather than an error (§4.1).
pub fn range(db: &Database, frame_id: FrameId, from_seq: u64, limit: usize) -> Result<Vec<Event>> {
    Ok(queries::event::range(db.conn(), frame_id, from_seq, limit)?)
}

/// `tail(frame_id, n) -> n most recent events in per-frame order`.
pub fn tail(db: &Database, frame_id: FrameId, n: usize) -> Result<Vec<Event>> {
    Ok(queries::event::tail(db.conn(), frame_id, n)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use framestack_types::{Frame, FrameType, Project, ProjectId, Run};
    use serde_json::Value;

    fn setup() -> (Database, Clock, FrameId) {
        let mut db = Database::open_in_memory().unwrap();
        let project = Project::new(ProjectId::from_source("/tmp/event-log-test"), "event-log-test");
        queries::project::upsert(db.conn(), &project).unwrap();
        let run = Run::start(project.id);
        queries::run::insert(db.conn(), &run).unwrap();
        let root = Frame::new_root(run.id, FrameType::Task, "root", Value::Null);
        queries::frame::insert(db.conn(), &root).unwrap();
        (db, Clock::default(), root.id)
    }

    #[test]
    fn append_then_tail_n_retrieves_last_n_in_order() {
        let (mut db, clock, frame_id) = setup();
        for i in 0..5 {
            append(
                &mut db,
                &clock,
                frame_id,
                EventPayload::Observation { text: format!("event {i}"), extra: Value::Null },
            )
            .unwrap();
        }
        let last_two = tail(&db, frame_id, 2).unwrap();
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].payload.as_text(), "event 3");
        assert_eq!(last_two[1].payload.as_text(), "event 4");
    }

    #[test]
    fn range_on_unknown_frame_is_empty_not_an_error() {
        let (db, _clock, _frame_id) = setup();
        let events = range(&db, FrameId::new(), 0, 0).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn append_touches_owning_frame_activity() {
        let (mut db, clock, frame_id) = setup();
        let before = frame_store::lookup(&db, frame_id).unwrap().last_activity_at;
        std::thread::sleep(std::time::Duration::from_millis(2));
        append(&mut db, &clock, frame_id, EventPayload::Observation { text: "x".into(), extra: Value::Null }).unwrap();
        let after = frame_store::lookup(&db, frame_id).unwrap().last_activity_at;
        assert!(after > before);
    }

    #[test]
    fn seq_strictly_increases_within_a_frame() {
        let (mut db, clock, frame_id) = setup();
        let a = append(&mut db, &clock, frame_id, EventPayload::Observation { text: "a".into(), extra: Value::Null }).unwrap();
        let b = append(&mut db, &clock, frame_id, EventPayload::Observation { text: "b".into(), extra: Value::Null }).unwrap();
        assert!(b.position.seq > a.position.seq);
    }
}
