use microblog::{
    models::{CreateMicropostRequest, UpdateUserRequest, User},
    test_utils::test_helpers,
    AppState,
};

async fn user(state: &AppState, name: &str, email: &str) -> User {
    let id = test_helpers::insert_test_user(&state.pool, name, email, "foobar")
        .await
        .unwrap();
    state.user_service.find_user_by_id(id).await.unwrap().unwrap()
}

async fn post(state: &AppState, author: &User, content: &str) -> i64 {
    state
        .micropost_service
        .post(CreateMicropostRequest {
            user_id: author.id,
            content: content.to_string(),
        })
        .await
        .unwrap()
        .id
}

fn names(users: &[User]) -> Vec<&str> {
    users.iter().map(|u| u.name.as_str()).collect()
}

#[tokio::test]
async fn test_search_users_by_name() {
    let state = test_helpers::create_test_state().await.unwrap();
    user(&state, "Anna", "anna@example.com").await;
    user(&state, "LIANNE", "lianne@example.com").await;
    user(&state, "Bob", "bob@example.com").await;

    let service = &state.user_service;

    let everyone = service
        .fetch_users(&User::search(None), None, None)
        .await
        .unwrap();
    assert_eq!(names(&everyone), vec!["Anna", "LIANNE", "Bob"]);

    let matches = service
        .fetch_users(&User::search(Some("ann")), None, None)
        .await
        .unwrap();
    assert_eq!(names(&matches), vec!["Anna", "LIANNE"]);

    let padded = service
        .fetch_users(&User::search(Some("  ANN  ")), None, None)
        .await
        .unwrap();
    assert_eq!(names(&padded), vec!["Anna", "LIANNE"]);

    assert_eq!(service.count_users(&User::search(Some(""))).await.unwrap(), 3);
    assert_eq!(
        service.count_users(&User::search(Some("zed"))).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_search_treats_wildcards_literally() {
    let state = test_helpers::create_test_state().await.unwrap();
    user(&state, "100% Real", "real@example.com").await;
    user(&state, "1000 Fake", "fake@example.com").await;
    user(&state, "snake_case", "snake@example.com").await;
    user(&state, "snakeXcase", "camel@example.com").await;

    let service = &state.user_service;

    let percent = service
        .fetch_users(&User::search(Some("100%")), None, None)
        .await
        .unwrap();
    assert_eq!(names(&percent), vec!["100% Real"]);

    let underscore = service
        .fetch_users(&User::search(Some("e_c")), None, None)
        .await
        .unwrap();
    assert_eq!(names(&underscore), vec!["snake_case"]);
}

#[tokio::test]
async fn test_user_pagination() {
    let state = test_helpers::create_test_state().await.unwrap();
    for i in 0..5 {
        user(&state, &format!("User {}", i), &format!("user{}@example.com", i)).await;
    }

    let service = &state.user_service;
    let all = User::search(None);

    assert_eq!(service.fetch_users(&all, Some(3), None).await.unwrap().len(), 3);
    assert_eq!(
        names(&service.fetch_users(&all, Some(10), Some(2)).await.unwrap()),
        vec!["User 2", "User 3", "User 4"]
    );
    assert_eq!(service.fetch_users(&all, None, Some(4)).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_filtered_microposts() {
    let state = test_helpers::create_test_state().await.unwrap();
    let author = user(&state, "Author", "author@example.com").await;
    let other = user(&state, "Other", "other@example.com").await;

    post(&state, &author, "hi there").await;
    post(&state, &author, "Oh HI Mark").await;
    post(&state, &author, "hello world").await;
    post(&state, &other, "hi from someone else").await;

    let service = &state.user_service;

    let all = service
        .fetch_microposts(&author.filtered_microposts(None), None, None)
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|m| m.user_id == author.id));

    let blank = service
        .count_microposts(&author.filtered_microposts(Some("")))
        .await
        .unwrap();
    assert_eq!(blank, 3);

    let hi = service
        .fetch_microposts(&author.filtered_microposts(Some("Hi")), None, None)
        .await
        .unwrap();
    let contents: Vec<&str> = hi.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Oh HI Mark", "hi there"]);
}

#[tokio::test]
async fn test_micropost_scope_is_lazy_and_restartable() {
    let state = test_helpers::create_test_state().await.unwrap();
    let author = user(&state, "Author", "author@example.com").await;
    let service = &state.user_service;

    let scope = author.filtered_microposts(Some("rust"));
    assert_eq!(service.count_microposts(&scope).await.unwrap(), 0);

    post(&state, &author, "Learning Rust").await;
    assert_eq!(service.count_microposts(&scope).await.unwrap(), 1);

    post(&state, &author, "More RUST").await;
    let first_run = service.fetch_microposts(&scope, None, None).await.unwrap();
    let second_run = service.fetch_microposts(&scope, None, None).await.unwrap();
    assert_eq!(first_run.len(), 2);
    assert_eq!(
        first_run.iter().map(|m| m.id).collect::<Vec<_>>(),
        second_run.iter().map(|m| m.id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_feed_contains_own_and_followed_posts() {
    let state = test_helpers::create_test_state().await.unwrap();
    let reader = user(&state, "Reader", "reader@example.com").await;
    let followed = user(&state, "Followed", "followed@example.com").await;
    let unfollowed = user(&state, "Unfollowed", "unfollowed@example.com").await;

    let service = &state.user_service;
    service.follow(&reader, &followed).await.unwrap();

    let own = post(&state, &reader, "my own post").await;
    let theirs = post(&state, &followed, "followed post").await;
    let hidden = post(&state, &unfollowed, "not in the feed").await;
    let latest = post(&state, &followed, "another followed post").await;

    let feed = service
        .fetch_microposts(&reader.feed(), None, None)
        .await
        .unwrap();
    let feed_ids: Vec<i64> = feed.iter().map(|m| m.id).collect();

    assert_eq!(feed_ids, vec![latest, theirs, own]);
    assert!(!feed_ids.contains(&hidden));

    let page = service
        .fetch_microposts(&reader.feed(), Some(1), None)
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, latest);

    // The followed user's feed does not see the reader's posts
    let other_feed = service
        .fetch_microposts(&followed.feed(), None, None)
        .await
        .unwrap();
    assert!(other_feed.iter().all(|m| m.user_id == followed.id));
}

#[tokio::test]
async fn test_search_folds_non_ascii_case() {
    let state = test_helpers::create_test_state().await.unwrap();
    let emile = user(&state, "Émile Zola", "emile@example.com").await;
    user(&state, "Ødegaard", "odegaard@example.com").await;
    user(&state, "Emile Plain", "plain@example.com").await;

    let service = &state.user_service;

    for phrase in ["Émile", "ÉMILE", "émile", "  éMiLe zOLA "] {
        let found = service
            .fetch_users(&User::search(Some(phrase)), None, None)
            .await
            .unwrap();
        assert_eq!(names(&found), vec!["Émile Zola"], "phrase {:?}", phrase);
    }

    assert_eq!(
        service.count_users(&User::search(Some("øDE"))).await.unwrap(),
        1
    );

    // A rename through the service is searchable under the new name
    service
        .update_user(UpdateUserRequest {
            user_id: emile.id,
            name: "ÉTIENNE".to_string(),
            email: emile.email.clone(),
            password: "foobar".to_string(),
            password_confirm: None,
        })
        .await
        .unwrap();
    assert_eq!(
        service.count_users(&User::search(Some("étienne"))).await.unwrap(),
        1
    );
    assert_eq!(
        service.count_users(&User::search(Some("émile"))).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn test_filtered_microposts_fold_non_ascii_case() {
    let state = test_helpers::create_test_state().await.unwrap();
    let author = user(&state, "Author", "author@example.com").await;

    post(&state, &author, "ÉTÉ À PARIS").await;
    post(&state, &author, "Größe zählt").await;
    post(&state, &author, "ete a paris").await;

    let service = &state.user_service;

    let summer = service
        .fetch_microposts(&author.filtered_microposts(Some("été")), None, None)
        .await
        .unwrap();
    let contents: Vec<&str> = summer.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["ÉTÉ À PARIS"]);

    assert_eq!(
        service
            .count_microposts(&author.filtered_microposts(Some("ÉTÉ À")))
            .await
            .unwrap(),
        1
    );
    assert_eq!(
        service
            .count_microposts(&author.filtered_microposts(Some("GRÖSSE")))
            .await
            .unwrap(),
        0
    );
    assert_eq!(
        service
            .count_microposts(&author.filtered_microposts(Some("ZÄHLT")))
            .await
            .unwrap(),
        1
    );
}
