use byteorder::{BigEndian, ByteOrder};
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use salvager::{callback, ErrorKind, Notifier, Pager, Severity};

#[test]
fn empty_file_classifies_as_empty() {
    let path = unique_path("empty");
    fs::write(&path, b"").unwrap();

    let notifier = Notifier::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let _sub = {
        let seen = seen.clone();
        notifier.subscribe(callback(move |e| seen.lock().unwrap().push(e.clone())))
    };

    let mut pager = Pager::new(&path, notifier);
    let err = pager.initialize().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Empty);
    assert_eq!(err.severity, Severity::Ignore);
    assert_eq!(pager.last_error().unwrap().kind, ErrorKind::Empty);

    // classified failures are published
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].kind, ErrorKind::Empty);
}

#[test]
fn missing_file_is_unclassified_io() {
    let path = unique_path("missing");

    let notifier = Notifier::new();
    let published = Arc::new(AtomicUsize::new(0));
    let _sub = {
        let published = published.clone();
        notifier.subscribe(callback(move |_| {
            published.fetch_add(1, Ordering::SeqCst);
        }))
    };

    let mut pager = Pager::new(&path, notifier);
    let err = pager.initialize().unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
    assert_eq!(err.severity, Severity::Fatal);

    // unclassified I/O failures stay local; nothing is published
    assert_eq!(published.load(Ordering::SeqCst), 0);
}

#[test]
fn bad_signature_is_not_a_database() {
    let path = unique_path("badsig");
    let mut body = vec![0u8; 4096];
    body[..16].copy_from_slice(b"definitely nope!");
    BigEndian::write_u16(&mut body[16..18], 4096);
    fs::write(&path, &body).unwrap();

    let mut pager = Pager::new(&path, Notifier::new());
    let err = pager.initialize().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotADatabase);
}

#[test]
fn signature_checked_for_any_nonzero_length() {
    // shorter than a page but long enough for a (wrong) signature probe
    let path = unique_path("badsig-short");
    let mut body = vec![0x42u8; 100];
    body[..16].copy_from_slice(b"not a db at all!");
    fs::write(&path, &body).unwrap();

    let mut pager = Pager::new(&path, Notifier::new());
    let err = pager.initialize().unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotADatabase);
}

fn unique_path(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("salvager-{}-{}-{}.db", prefix, pid, t))
}
