use super::*;

#[test]
fn create_makes_a_unique_directory() {
    let a = ScratchDir::create().unwrap();
    let b = ScratchDir::create().unwrap();
    assert!(a.path().is_dir());
    assert!(b.path().is_dir());
    assert_ne!(a.path(), b.path());
}

#[test]
fn well_known_paths_live_under_the_root() {
    let scratch = ScratchDir::create().unwrap();
    assert_eq!(scratch.audio_path(), scratch.path().join("audio_mix.m4a"));
    assert_eq!(scratch.manifest_path(), scratch.path().join("concat.txt"));
}

#[test]
fn segment_paths_are_zero_padded_for_lexical_order() {
    let scratch = ScratchDir::create().unwrap();
    let p0 = scratch.segment_path(0);
    let p12 = scratch.segment_path(12);
    assert!(p0.ends_with("segment_00000.mp4"));
    assert!(p12.ends_with("segment_00012.mp4"));
    assert!(p0 < p12);
}

#[test]
fn drop_removes_the_directory_and_contents() {
    let scratch = ScratchDir::create().unwrap();
    let root = scratch.path().to_path_buf();
    std::fs::write(scratch.segment_path(0), b"segment bytes").unwrap();
    drop(scratch);
    assert!(!root.exists());
}

#[test]
fn drop_tolerates_an_already_removed_root() {
    let scratch = ScratchDir::create().unwrap();
    std::fs::remove_dir_all(scratch.path()).unwrap();
    drop(scratch); // must not panic
}
