// Unit tests for domain models

use super::*;

fn starts(queue: &ClipQueue) -> Vec<f64> {
    queue.iter().map(|c| c.start).collect()
}

#[test]
fn test_clip_rejects_start_not_before_end() {
    assert!(Clip::new(10.0, 10.0).is_err());
    assert!(Clip::new(12.0, 10.0).is_err());
    assert!(Clip::new(-1.0, 10.0).is_err());
    assert!(Clip::new(f64::NAN, 10.0).is_err());
    assert!(Clip::new(0.0, f64::INFINITY).is_err());
}

#[test]
fn test_clip_duration() {
    let clip = Clip::new(5.0, 12.5).unwrap();
    assert_eq!(clip.duration(), 7.5);
}

#[test]
fn test_queue_sorted_after_insert() {
    let mut queue = ClipQueue::new();
    queue.insert_range(20.0, 25.0).unwrap();
    queue.insert_range(5.0, 10.0).unwrap();
    queue.insert_range(12.0, 14.0).unwrap();

    assert_eq!(starts(&queue), vec![5.0, 12.0, 20.0]);
}

#[test]
fn test_queue_equal_starts_keep_insertion_order() {
    let mut queue = ClipQueue::new();
    let first = queue.insert_range(5.0, 8.0).unwrap();
    queue.insert_range(1.0, 2.0).unwrap();
    let second = queue.insert_range(5.0, 6.0).unwrap();
    let third = queue.insert_range(5.0, 30.0).unwrap();

    let ids: Vec<ClipId> = queue.iter().skip(1).map(|c| c.id).collect();
    assert_eq!(ids, vec![first.id, second.id, third.id]);
}

#[test]
fn test_rejected_insert_leaves_queue_unchanged() {
    let mut queue = ClipQueue::new();
    let kept = queue.insert_range(5.0, 10.0).unwrap();
    let before = queue.clone();

    assert!(queue.insert_range(10.0, 5.0).is_err());
    assert!(queue.insert_range(7.0, 7.0).is_err());
    assert!(queue.insert_range(f64::NAN, 3.0).is_err());

    let duplicate = Clip::with_id(kept.id, 1.0, 2.0).unwrap();
    assert_eq!(
        queue.insert(duplicate),
        Err(DomainError::DuplicateClip(kept.id.to_string()))
    );

    assert_eq!(queue, before);
}

#[test]
fn test_remove_and_clear() {
    let mut queue = ClipQueue::new();
    let a = queue.insert_range(1.0, 2.0).unwrap();
    let b = queue.insert_range(3.0, 4.0).unwrap();

    let removed = queue.remove(&a.id).unwrap();
    assert_eq!(removed, a);
    assert_eq!(queue.len(), 1);
    assert!(queue.contains(&b.id));
    assert!(matches!(
        queue.remove(&a.id),
        Err(DomainError::ClipNotFound(_))
    ));

    queue.clear();
    assert!(queue.is_empty());
}

#[test]
fn test_snapshot_is_isolated_from_later_edits() {
    let mut queue = ClipQueue::new();
    queue.insert_range(5.0, 10.0).unwrap();
    queue.insert_range(20.0, 25.0).unwrap();

    let snapshot = queue.snapshot();
    queue.insert_range(0.0, 1.0).unwrap();
    queue.clear();

    assert_eq!(snapshot.len(), 2);
    let snap_starts: Vec<f64> = snapshot.iter().map(|c| c.start).collect();
    assert_eq!(snap_starts, vec![5.0, 20.0]);
    assert_eq!(snapshot.total_duration(), 10.0);
}

#[test]
fn test_clip_id_parse() {
    let id = ClipId::new();
    let parsed: ClipId = id.to_string().parse().unwrap();
    assert_eq!(parsed, id);
    assert!("not-an-id".parse::<ClipId>().is_err());
}

#[test]
fn test_artifact_concatenates_in_order() {
    let chunks = vec![vec![1, 2], vec![3], vec![4, 5, 6]];
    let artifact = Artifact::from_chunks(chunks).unwrap();

    assert_eq!(artifact.bytes, vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(artifact.size(), 6);
    assert_eq!(artifact.chunk_count, 3);
    assert_eq!(artifact.file_name("dQw4w9WgXcQ"), "dQw4w9WgXcQ-clips.webm");
}

#[test]
fn test_artifact_from_no_chunks() {
    assert!(Artifact::from_chunks(Vec::new()).is_none());
}

#[test]
fn test_progress_message() {
    let clip = Clip::new(65.0, 70.0).unwrap();
    let progress = ClipProgress {
        index: 1,
        total: 2,
        clip,
    };
    assert_eq!(progress.to_string(), "Recording clip 1 of 2 (1:05–1:10)");
}

#[test]
fn test_saved_state_serde() {
    let mut queue = ClipQueue::new();
    queue.insert_range(20.0, 25.0).unwrap();
    queue.insert_range(5.0, 10.0).unwrap();

    let state = SavedState::new("abcdefghijk", &queue);
    let json = serde_json::to_string(&state).unwrap();
    let restored: SavedState = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, state);
    assert_eq!(restored.queue().unwrap(), queue);
}

#[test]
fn test_session_status_terminal() {
    assert!(!SessionStatus::Recording.is_terminal());
    assert!(!SessionStatus::Finalizing.is_terminal());
    assert!(SessionStatus::Done.is_terminal());
    assert!(SessionStatus::Aborted.is_terminal());
    assert!(SessionStatus::Failed.is_terminal());
}
