use filetime::FileTime;
use hardlink::linker::{backup_path, reduce, LinkPolicy, LinkStats, ReducerConfig};
use hardlink::scanner::{FingerprintConfig, PathFilter, Walker, WalkerConfig};
use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_600_000_000, 0)).unwrap();
    path
}

fn ino(path: &Path) -> u64 {
    fs::symlink_metadata(path).unwrap().ino()
}

fn run(dir: &Path, walker: WalkerConfig, reducer: &ReducerConfig) -> (usize, LinkStats) {
    let scan = Walker::new(vec![dir.to_path_buf()], walker).scan();
    let files = scan.stats.files;
    (files, reduce(scan.buckets, reducer).unwrap())
}

#[test]
fn test_two_identical_files_are_linked() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", &[b'X'; 100]);
    let b = write(dir.path(), "b", &[b'X'; 100]);

    let (files, stats) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());

    assert_eq!(files, 2);
    assert_eq!(stats.compared, 1);
    assert_eq!(stats.linked, 1);
    assert_eq!(stats.saved, 100);
    assert_eq!(ino(&a), ino(&b));
    assert_eq!(fs::metadata(&a).unwrap().nlink(), 2);
    assert!(!backup_path(&b).exists());
}

#[test]
fn test_different_content_stays_distinct() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", &[b'X'; 100]);
    let b = write(dir.path(), "b", &[b'Y'; 100]);

    let (_, stats) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());

    assert_eq!(stats.compared, 1);
    assert_eq!(stats.linked, 0);
    assert_ne!(ino(&a), ino(&b));
}

#[test]
fn test_respect_name_prevents_link() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"payload");
    let b = write(dir.path(), "b", b"payload");
    let walker = WalkerConfig::default().with_fingerprint(FingerprintConfig {
        respect_name: true,
        ..Default::default()
    });

    let (_, stats) = run(dir.path(), walker, &ReducerConfig::default());

    assert_eq!(stats.compared, 0);
    assert_ne!(ino(&a), ino(&b));
}

#[test]
fn test_zero_size_files_never_linked() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"");
    let b = write(dir.path(), "b", b"");

    let (files, stats) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());

    assert_eq!(files, 2);
    assert_eq!(stats.compared, 0);
    assert_eq!(stats.linked, 0);
    assert_ne!(ino(&a), ino(&b));
}

#[test]
fn test_second_run_compares_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a", b"payload");
    write(dir.path(), "b", b"payload");
    write(dir.path(), "c", b"payload");

    let (_, first) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());
    assert_eq!(first.linked, 2);

    let (_, second) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());
    assert_eq!(second.compared, 0);
    assert_eq!(second.linked, 0);
}

#[test]
fn test_dry_run_matches_real_run() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", &[b'X'; 100]);
    let b = write(dir.path(), "b", &[b'X'; 100]);
    let (ia, ib) = (ino(&a), ino(&b));

    let (_, dry) = run(
        dir.path(),
        WalkerConfig::default(),
        &ReducerConfig::default().with_dry_run(true),
    );
    assert_eq!((ino(&a), ino(&b)), (ia, ib));
    assert!(!backup_path(&b).exists());

    let (_, real) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());
    assert_eq!(dry, real);
    assert_eq!(ino(&a), ino(&b));
}

#[test]
fn test_existing_backup_blocks_link() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"payload");
    let b = write(dir.path(), "b", b"payload");
    let backup = backup_path(&b);
    fs::write(&backup, "not ours").unwrap();

    // Keep the stray backup out of the scan itself.
    let walker = WalkerConfig::default()
        .with_filter(PathFilter::new::<&str>(&[], &[r"\.hardlink-\d+$"]).unwrap());
    let (_, stats) = run(dir.path(), walker, &ReducerConfig::default());

    assert_eq!(stats.compared, 1);
    assert_eq!(stats.linked, 0);
    assert_eq!(stats.failed, 1);
    assert_ne!(ino(&a), ino(&b));
    assert_eq!(fs::read_to_string(&b).unwrap(), "payload");
    assert_eq!(fs::read_to_string(&backup).unwrap(), "not ours");
}

#[test]
fn test_symlink_is_left_alone() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"payload");
    write(dir.path(), "b", b"payload");
    let link = dir.path().join("link");
    std::os::unix::fs::symlink(&a, &link).unwrap();

    let (files, stats) = run(dir.path(), WalkerConfig::default(), &ReducerConfig::default());

    assert_eq!(files, 2);
    assert_eq!(stats.linked, 1);
    assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
}

#[test]
fn test_newer_file_survives_when_time_ignored() {
    let dir = tempdir().unwrap();
    let old = write(dir.path(), "a_old", b"payload");
    let new = write(dir.path(), "b_new", b"payload");
    filetime::set_file_mtime(&new, FileTime::from_unix_time(1_700_000_000, 0)).unwrap();
    let newest_inode = ino(&new);

    let walker = WalkerConfig::default().with_fingerprint(FingerprintConfig {
        respect_time: false,
        ..Default::default()
    });
    let (_, stats) = run(dir.path(), walker, &ReducerConfig::default());

    assert_eq!(stats.linked, 1);
    assert_eq!(ino(&old), newest_inode);
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&old).unwrap());
    assert_eq!(mtime.unix_seconds(), 1_700_000_000);
}

#[test]
fn test_minimize_keeps_single_link_inode() {
    let dir = tempdir().unwrap();
    let single = write(dir.path(), "a", b"payload");
    let shared = write(dir.path(), "b", b"payload");
    let outside = tempdir().unwrap();
    // Only works when the temp dirs share a device; skip otherwise.
    if fs::hard_link(&shared, outside.path().join("elsewhere")).is_err() {
        return;
    }
    let single_inode = ino(&single);

    let (_, stats) = run(
        dir.path(),
        WalkerConfig::default(),
        &ReducerConfig::default().with_policy(LinkPolicy::Minimize),
    );

    assert_eq!(stats.linked, 1);
    assert_eq!(ino(&shared), single_inode);
    // The replaced inode still has a name outside the tree.
    assert_eq!(stats.saved, 0);
}
