//! Truncation semantics across segment boundaries and reopens.

mod common;

use common::{fill, open_shared, payload};
use ferrite_fs::InMemoryFilesystem;
use ferrite_wal::{Options, WalError};

#[test]
fn truncate_front_survives_reopen() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 10);

    log.truncate_front(5).unwrap();
    assert_eq!(log.first_index().unwrap(), 5);
    assert!(matches!(log.read(4), Err(WalError::NotFound)));
    assert_eq!(log.read(5).unwrap(), payload(5));

    log.close().unwrap();
    let log = open_shared(&fs, Options::default());
    assert_eq!(log.first_index().unwrap(), 5);
    assert_eq!(log.last_index().unwrap(), 9);
    assert!(matches!(log.read(4), Err(WalError::NotFound)));
    for i in 5..10 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }
}

#[test]
fn truncate_back_survives_reopen_then_empties() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 10);

    log.truncate_back(3).unwrap();
    assert_eq!(log.last_index().unwrap(), 3);
    assert!(matches!(log.read(4), Err(WalError::NotFound)));

    log.close().unwrap();
    let log = open_shared(&fs, Options::default());
    assert_eq!(log.last_index().unwrap(), 3);
    assert_eq!(log.read(3).unwrap(), payload(3));

    // Truncating back past the first entry empties the log while keeping
    // its anchor offset.
    let anchor = log.first_index().unwrap();
    log.truncate_back(anchor - 1).unwrap();
    assert_eq!(log.first_index().unwrap(), anchor);
    assert_eq!(log.last_index().unwrap(), anchor - 1);
    assert!(matches!(log.read(anchor), Err(WalError::NotFound)));
}

#[test]
fn empty_after_truncate_all_survives_reopen() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 6);

    log.truncate_back(-1).unwrap();
    log.close().unwrap();

    let log = open_shared(&fs, Options::default());
    assert_eq!(log.first_index().unwrap(), 0);
    assert_eq!(log.last_index().unwrap(), -1);

    log.write(0, b"after recovery").unwrap();
    assert_eq!(log.read(0).unwrap(), b"after recovery");
}

#[test]
fn truncate_front_idempotent_at_first_index() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 8);
    log.truncate_front(4).unwrap();

    // Truncating to the current first index changes nothing.
    log.truncate_front(log.first_index().unwrap()).unwrap();
    assert_eq!(log.first_index().unwrap(), 4);
    assert_eq!(log.last_index().unwrap(), 7);
    for i in 4..8 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }
}

#[test]
fn truncate_back_idempotent_at_last_index() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 8);
    log.truncate_back(5).unwrap();

    log.truncate_back(log.last_index().unwrap()).unwrap();
    assert_eq!(log.last_index().unwrap(), 5);
    assert_eq!(log.read(5).unwrap(), payload(5));
}

#[test]
fn truncate_front_across_segments() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::new().segment_size(24));
    fill(&log, 30);

    // The cut lands in a middle segment; everything before it goes.
    log.truncate_front(17).unwrap();
    assert_eq!(log.first_index().unwrap(), 17);
    assert_eq!(log.last_index().unwrap(), 29);
    assert!(matches!(log.read(16), Err(WalError::NotFound)));
    for i in 17..30 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }

    log.close().unwrap();
    let log = open_shared(&fs, Options::new().segment_size(24));
    for i in 17..30 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }
}

#[test]
fn truncate_back_across_segments() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::new().segment_size(24));
    fill(&log, 30);

    log.truncate_back(11).unwrap();
    assert_eq!(log.last_index().unwrap(), 11);
    assert!(matches!(log.read(12), Err(WalError::NotFound)));
    for i in 0..12 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }

    // The surviving boundary segment is the new tail and accepts appends.
    log.write(12, b"replacement").unwrap();
    assert_eq!(log.read(12).unwrap(), b"replacement");

    log.close().unwrap();
    let log = open_shared(&fs, Options::new().segment_size(24));
    assert_eq!(log.last_index().unwrap(), 12);
    assert_eq!(log.read(12).unwrap(), b"replacement");
}

#[test]
fn alternating_truncations_converge() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::new().segment_size(24));
    fill(&log, 40);

    log.truncate_front(10).unwrap();
    log.truncate_back(30).unwrap();
    log.truncate_front(20).unwrap();
    log.truncate_back(25).unwrap();

    assert_eq!(log.first_index().unwrap(), 20);
    assert_eq!(log.last_index().unwrap(), 25);
    for i in 20..=25 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }

    log.close().unwrap();
    let log = open_shared(&fs, Options::new().segment_size(24));
    assert_eq!(log.first_index().unwrap(), 20);
    assert_eq!(log.last_index().unwrap(), 25);
}

#[test]
fn truncate_to_single_entry() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 10);

    log.truncate_front(6).unwrap();
    log.truncate_back(6).unwrap();

    assert_eq!(log.first_index().unwrap(), 6);
    assert_eq!(log.last_index().unwrap(), 6);
    assert_eq!(log.read(6).unwrap(), payload(6));
}

#[test]
fn writes_resume_after_truncate_back() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::default());
    fill(&log, 10);

    log.truncate_back(4).unwrap();
    log.write(5, b"rewritten").unwrap();

    assert_eq!(log.last_index().unwrap(), 5);
    assert_eq!(log.read(5).unwrap(), b"rewritten");
    assert_eq!(log.read(4).unwrap(), payload(4));
}

#[test]
fn clear_discards_everything_including_offsets() {
    let fs = InMemoryFilesystem::new();
    let log = open_shared(&fs, Options::new().segment_size(24));
    fill(&log, 30);
    log.truncate_front(12).unwrap();

    log.clear().unwrap();
    assert_eq!(log.first_index().unwrap(), 0);
    assert_eq!(log.last_index().unwrap(), -1);

    log.write(0, b"restart").unwrap();
    assert_eq!(log.read(0).unwrap(), b"restart");

    log.close().unwrap();
    let log = open_shared(&fs, Options::new().segment_size(24));
    assert_eq!(log.first_index().unwrap(), 0);
    assert_eq!(log.read(0).unwrap(), b"restart");
}

#[test]
fn truncations_on_disk_backed_log() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wal");

    let log = ferrite_wal::Log::open(&path, Options::new().segment_size(24)).unwrap();
    fill(&log, 20);
    log.truncate_front(5).unwrap();
    log.truncate_back(15).unwrap();
    log.close().unwrap();

    let log = ferrite_wal::Log::open(&path, Options::default()).unwrap();
    assert_eq!(log.first_index().unwrap(), 5);
    assert_eq!(log.last_index().unwrap(), 15);
    for i in 5..=15 {
        assert_eq!(log.read(i).unwrap(), payload(i));
    }

    // No marker or temp files remain after clean truncations.
    let leftovers: Vec<String> = std::fs::read_dir(&path)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.len() != 20)
        .collect();
    assert!(leftovers.is_empty(), "unexpected files: {leftovers:?}");
}
