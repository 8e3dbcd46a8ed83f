//! Filesystem blob store and reassembly on real files.

use rangefetch::merge::reassemble;
use rangefetch::{part_path, BlobStore, LocalBlobStore};
use tempfile::tempdir;

#[tokio::test]
async fn save_truncates_existing_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("blob");
    let store = LocalBlobStore::new();

    store.save(&path, b"a much longer first write").await.unwrap();
    store.save(&path, b"short").await.unwrap();

    assert_eq!(store.read(&path).await.unwrap(), b"short");
}

#[tokio::test]
async fn append_creates_and_extends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sub").join("blob");
    let store = LocalBlobStore::new();

    store.append(&path, b"head").await.unwrap();
    store.append(&path, b"tail").await.unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"headtail");
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nope");
    let store = LocalBlobStore::new();

    assert!(store.read(&path).await.unwrap_err().is_not_found());
    assert!(store.delete(&path).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn reassembly_twice_fails_cleanly() {
    let dir = tempdir().unwrap();
    let dest = dir.path().join("file.bin");
    let store = LocalBlobStore::new();
    for (i, data) in [&b"AAAAAAAAAA"[..], b"BBBBBBBBBB", b"CCCCC"].iter().enumerate() {
        store.save(&part_path(&dest, i), data).await.unwrap();
    }

    reassemble(&store, &dest, 3, None).await.unwrap();
    let err = reassemble(&store, &dest, 3, None).await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(std::fs::read(&dest).unwrap(), b"AAAAAAAAAABBBBBBBBBBCCCCC");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}
