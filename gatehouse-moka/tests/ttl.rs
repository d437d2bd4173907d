use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use gatehouse_core::{CacheKey, ResponseHead};
use gatehouse_moka::MokaStore;
use gatehouse_store::CacheStore;
use http::StatusCode;

fn head() -> ResponseHead {
    ResponseHead::new(StatusCode::OK)
}

fn put_entry(store: &MokaStore, key: &CacheKey, body: &'static [u8], ttl: Duration) {
    let mut writer = store.put(key.clone(), head(), ttl).unwrap();
    writer.write(Bytes::from_static(body)).unwrap();
    writer.end().unwrap();
}

#[tokio::test]
async fn committed_entries_are_readable_until_expiry() {
    let store = MokaStore::new(16);
    let key = CacheKey::from("k1");
    put_entry(&store, &key, b"cached", Duration::from_secs(1));

    let entry = store.get(&key).await.unwrap().expect("entry should be live");
    let (entry_head, mut body) = entry.into_parts();
    assert_eq!(entry_head.status(), StatusCode::OK);
    assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"cached"));

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn an_unended_writer_leaves_no_entry() {
    let store = MokaStore::new(16);
    let key = CacheKey::from("k2");

    let mut writer = store
        .put(key.clone(), head(), Duration::from_secs(60))
        .unwrap();
    writer.write(Bytes::from_static(b"partial")).unwrap();
    drop(writer);

    assert!(store.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn rewriting_a_key_replaces_the_entry_and_its_ttl() {
    let store = MokaStore::new(16);
    let key = CacheKey::from("k3");
    put_entry(&store, &key, b"first", Duration::from_millis(200));
    put_entry(&store, &key, b"second", Duration::from_secs(60));

    // The old entry's remaining lifetime must not carry over.
    tokio::time::sleep(Duration::from_millis(400)).await;
    let entry = store.get(&key).await.unwrap().expect("rewritten entry");
    let (_, mut body) = entry.into_parts();
    assert_eq!(body.next().await.unwrap().unwrap(), Bytes::from_static(b"second"));
}
