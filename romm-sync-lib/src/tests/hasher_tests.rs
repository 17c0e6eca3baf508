use std::io::Cursor;

use super::*;

#[test]
fn sha1_of_known_input() {
    let mut data = Cursor::new(b"abc".to_vec());
    assert_eq!(
        sha1_reader(&mut data).unwrap(),
        "a9993e364706816aba3e25717850c26c9cd0d89d"
    );
}

#[test]
fn md5_of_known_input() {
    let mut data = Cursor::new(b"abc".to_vec());
    assert_eq!(md5_reader(&mut data).unwrap(), "900150983cd24fb0d6963f7d28e17f72");
    assert_eq!(md5_bytes(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
}

#[test]
fn streaming_matches_one_shot_across_chunks() {
    let data: Vec<u8> = (0..(CHUNK_SIZE * 3 + 17)).map(|i| (i % 251) as u8).collect();
    let streamed = md5_reader(&mut Cursor::new(data.clone())).unwrap();
    assert_eq!(streamed, md5_bytes(&data));
}

#[test]
fn file_hashes_read_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rom.bin");
    std::fs::write(&path, b"abc").unwrap();
    assert_eq!(
        sha1_file(&path).unwrap(),
        "a9993e364706816aba3e25717850c26c9cd0d89d"
    );
    assert!(md5_file(&dir.path().join("missing")).is_err());
}
