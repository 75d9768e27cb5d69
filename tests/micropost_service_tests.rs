use microblog::{
    models::CreateMicropostRequest,
    services::MicropostServiceError,
    test_utils::test_helpers,
};

#[tokio::test]
async fn test_post_and_delete_micropost() {
    let state = test_helpers::create_test_state().await.unwrap();
    let user_id = test_helpers::insert_test_user(&state.pool, "Poster", "poster@example.com", "foobar")
        .await
        .unwrap();

    let micropost = state
        .micropost_service
        .post(CreateMicropostRequest {
            user_id,
            content: "Lorem ipsum".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(micropost.user_id, user_id);
    assert_eq!(micropost.content, "Lorem ipsum");

    let found = state.micropost_service.find(micropost.id).await.unwrap();
    assert!(found.is_some());

    state.micropost_service.delete(micropost.id).await.unwrap();
    assert!(state
        .micropost_service
        .find(micropost.id)
        .await
        .unwrap()
        .is_none());
    assert!(matches!(
        state.micropost_service.delete(micropost.id).await,
        Err(MicropostServiceError::MicropostNotFound)
    ));
}

#[tokio::test]
async fn test_post_content_limits() {
    let state = test_helpers::create_test_state().await.unwrap();
    let user_id = test_helpers::insert_test_user(&state.pool, "Poster", "poster@example.com", "foobar")
        .await
        .unwrap();

    let too_long = state
        .micropost_service
        .post(CreateMicropostRequest {
            user_id,
            content: "a".repeat(141),
        })
        .await;
    assert!(matches!(
        too_long,
        Err(MicropostServiceError::Validation(ref errors)) if errors.contains("content")
    ));

    assert!(state
        .micropost_service
        .post(CreateMicropostRequest {
            user_id,
            content: "a".repeat(140),
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn test_post_for_unknown_user() {
    let state = test_helpers::create_test_state().await.unwrap();

    let result = state
        .micropost_service
        .post(CreateMicropostRequest {
            user_id: 404,
            content: "Anyone there?".to_string(),
        })
        .await;

    assert!(matches!(result, Err(MicropostServiceError::UserNotFound)));
}
