//! Multipart upload integration tests.

#[cfg(test)]
mod tests {
    use ufile_core::{BufferList, UfileError};

    use crate::{test_bucket, test_key, ufile_client};

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_complete_multipart_upload() {
        let mut cloud = ufile_client();
        let bucket = test_bucket();
        let key = test_key("mpu");

        cloud.begin_multipart(&bucket, &key).await.expect("begin_multipart");
        let block_size = cloud
            .session()
            .map(ufile_core::TransferSession::block_size)
            .expect("session");
        let block_size = usize::try_from(block_size).expect("block size fits usize");

        let part1 = vec![0xAAu8; block_size];
        cloud
            .upload_part(&bucket, &key, BufferList::from(part1), block_size as u64)
            .await
            .expect("upload part 1");

        let part2 = vec![0xBBu8; 1024];
        cloud
            .upload_part(&bucket, &key, BufferList::from(part2), 1024)
            .await
            .expect("upload part 2");

        cloud.finish_multipart(&bucket, &key).await.expect("finish_multipart");
        assert!(cloud.session().is_none());

        cloud.remove_object(&bucket, &key).await.expect("remove_object");
    }

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_abort_multipart_upload() {
        let mut cloud = ufile_client();
        let bucket = test_bucket();
        let key = test_key("mpu-abort");

        cloud.begin_multipart(&bucket, &key).await.expect("begin_multipart");
        cloud
            .upload_part(&bucket, &key, BufferList::from(vec![1u8; 512]), 512)
            .await
            .expect("upload part");

        cloud.abort_multipart(&bucket, &key).await.expect("abort_multipart");
        assert!(cloud.session().is_none());
    }

    #[tokio::test]
    #[ignore = "requires UFile credentials"]
    async fn test_should_refuse_finish_without_parts() {
        let mut cloud = ufile_client();
        let bucket = test_bucket();
        let key = test_key("mpu-empty");

        cloud.begin_multipart(&bucket, &key).await.expect("begin_multipart");

        let err = cloud.finish_multipart(&bucket, &key).await.unwrap_err();
        assert!(matches!(err, UfileError::NoParts));

        cloud.abort_multipart(&bucket, &key).await.expect("abort_multipart");
    }
}
