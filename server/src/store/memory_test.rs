use super::*;

#[tokio::test]
async fn ids_start_at_one_and_increase() {
    let store = MemoryStore::new();
    assert_eq!(store.insert_file("png", "a.png", 10).await.unwrap(), 1);
    assert_eq!(store.insert_file("gif", "b.gif", 11).await.unwrap(), 2);

    let file = store.find_file(2).await.unwrap().unwrap();
    assert_eq!(file.ctype, "gif");
    assert_eq!(file.name, "b.gif");
    assert!(store.find_file(3).await.unwrap().is_none());
}

#[tokio::test]
async fn post_requires_existing_file() {
    let store = MemoryStore::new();
    let result = store.insert_post(9, "cats", "hi", 0).await;
    assert!(matches!(result, Err(StoreError::UnknownFile(9))));
}

#[tokio::test]
async fn post_is_joined_with_file_ctype() {
    let store = MemoryStore::new();
    let fid = store.insert_file("jpeg", "c.jpg", 0).await.unwrap();
    let pid = store.insert_post(fid, "cats", "hello", 42).await.unwrap();

    let post = store.find_post(pid).await.unwrap().unwrap();
    assert_eq!(post.fid, fid);
    assert_eq!(post.ctype, "jpeg");
    assert_eq!(post.topic, "cats");
    assert_eq!(post.text, "hello");
    assert_eq!(post.time, 42);
}

#[tokio::test]
async fn posts_by_topic_filters_and_keeps_order() {
    let store = MemoryStore::new();
    let fid = store.insert_file("png", "a.png", 0).await.unwrap();
    let first = store.insert_post(fid, "cats", "one", 0).await.unwrap();
    store.insert_post(fid, "dogs", "two", 0).await.unwrap();
    let third = store.insert_post(fid, "cats", "three", 0).await.unwrap();

    let pids: Vec<i64> = store.posts_by_topic("cats").await.unwrap().iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![first, third]);
    assert!(store.posts_by_topic("fish").await.unwrap().is_empty());
}

#[tokio::test]
async fn comments_are_scoped_to_post() {
    let store = MemoryStore::new();
    let fid = store.insert_file("png", "a.png", 0).await.unwrap();
    let a = store.insert_post(fid, "cats", "a", 0).await.unwrap();
    let b = store.insert_post(fid, "cats", "b", 0).await.unwrap();

    store.insert_comment(a, 1, "first").await.unwrap();
    store.insert_comment(b, 2, "elsewhere").await.unwrap();
    store.insert_comment(a, 3, "second").await.unwrap();

    let texts: Vec<String> = store.comments_for_post(a).await.unwrap().into_iter().map(|c| c.text).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(matches!(store.insert_comment(99, 0, "x").await, Err(StoreError::UnknownPost(99))));
}
