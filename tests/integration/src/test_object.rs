//! Single-object integration tests.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use ufile_core::BufferList;

    use crate::{test_bucket, test_bucket_name, test_key, ufile_client};

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_put_and_remove_object() {
        let cloud = ufile_client();
        let bucket = test_bucket();
        let key = test_key("put");

        let data: BufferList = [Bytes::from_static(b"hello "), Bytes::from_static(b"ufile")]
            .into_iter()
            .collect();
        cloud
            .put_object(&bucket, &key, data, 11)
            .await
            .expect("put_object");

        cloud.remove_object(&bucket, &key).await.expect("remove_object");
    }

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_put_empty_object() {
        let cloud = ufile_client();
        let bucket = test_bucket();
        let key = test_key("empty");

        cloud
            .put_object(&bucket, &key, BufferList::new(), 0)
            .await
            .expect("put_object");
        cloud.remove_object(&bucket, &key).await.expect("remove_object");
    }

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_create_missing_bucket_on_put() {
        let cloud = ufile_client();
        let bucket = test_bucket_name("autocreate");
        let key = test_key("put");

        cloud
            .put_object(&bucket, &key, BufferList::from(b"data".to_vec()), 4)
            .await
            .expect("put_object into a new bucket");
        cloud.remove_object(&bucket, &key).await.expect("remove_object");
    }

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_reject_short_body() {
        let cloud = ufile_client();
        let bucket = test_bucket();
        let key = test_key("short");

        let result = cloud
            .put_object(&bucket, &key, BufferList::from(b"abc".to_vec()), 10)
            .await;
        assert!(result.is_err());
    }
}
