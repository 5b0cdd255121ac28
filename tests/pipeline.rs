//! End-to-end exercises of the authorization pipeline and room policy
//! against a real on-disk SQLite database.

use axum::extract::FromRequestParts;
use axum::http::{Request, header};
use tempfile::TempDir;
use time::Duration;

use quietroom::auth::{self, AuthUser, TokenCodec};
use quietroom::rooms::{membership, policy, store};
use quietroom::{AppError, AppState, db, identity};

const TEST_SECRET: &[u8] = b"test-secret-for-pipeline-tests";

async fn test_state() -> (AppState, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let db_pool = db::connect(&url).await.unwrap();

    let state = AppState {
        db_pool,
        tokens: TokenCodec::new(TEST_SECRET),
        token_ttl: Duration::minutes(30),
    };
    (state, dir)
}

async fn signup_and_login(state: &AppState, email: &str) -> auth::LoginOutcome {
    identity::create(&state.db_pool, email, "someuser", "password")
        .await
        .unwrap();
    auth::login(&state.db_pool, &state.tokens, state.token_ttl, email, "password")
        .await
        .unwrap()
}

/// Run the full middleware pipeline for a bearer token.
async fn authorize(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let request = Request::builder()
        .uri("/rooms")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(())
        .unwrap();
    let (mut parts, _) = request.into_parts();
    AuthUser::from_request_parts(&mut parts, state).await
}

#[tokio::test]
async fn login_token_passes_full_pipeline() {
    let (state, _dir) = test_state().await;

    let outcome = signup_and_login(&state, "a@qa.team").await;
    let verified = authorize(&state, &outcome.access_token).await.unwrap();

    assert_eq!(verified.user_id.to_string(), outcome.user.id);
}

#[tokio::test]
async fn missing_header_is_unauthenticated() {
    let (state, _dir) = test_state().await;

    let request = Request::builder().uri("/rooms").body(()).unwrap();
    let (mut parts, _) = request.into_parts();
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthenticated(_)));
    assert_eq!(err.to_string(), "token could not be found");
}

#[tokio::test]
async fn forged_token_is_unauthenticated() {
    let (state, _dir) = test_state().await;
    signup_and_login(&state, "a@qa.team").await;

    let err = authorize(&state, "definitely-not-a-token").await.unwrap_err();

    assert!(matches!(err, AppError::Unauthenticated(_)));
    assert_eq!(err.to_string(), "token is invalid");
}

#[tokio::test]
async fn logout_invalidates_token_despite_valid_signature() {
    let (state, _dir) = test_state().await;

    let outcome = signup_and_login(&state, "a@qa.team").await;
    let verified = authorize(&state, &outcome.access_token).await.unwrap();

    auth::logout(&state.db_pool, verified.session_id, verified.user_id)
        .await
        .unwrap();

    // The codec alone still accepts the token; only the store cross-check
    // rejects it.
    assert!(state.tokens.verify(&outcome.access_token).is_ok());
    let err = authorize(&state, &outcome.access_token).await.unwrap_err();
    assert_eq!(err.to_string(), "session is invalid");

    // Revoking an already-revoked session is a no-op success.
    auth::logout(&state.db_pool, verified.session_id, verified.user_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn relogin_leaves_existing_session_live() {
    let (state, _dir) = test_state().await;

    let first = signup_and_login(&state, "a@qa.team").await;
    let second = auth::login(
        &state.db_pool,
        &state.tokens,
        state.token_ttl,
        "a@qa.team",
        "password",
    )
    .await
    .unwrap();

    // Multi-session per user: both tokens remain valid independently.
    assert!(authorize(&state, &first.access_token).await.is_ok());
    assert!(authorize(&state, &second.access_token).await.is_ok());
}

#[tokio::test]
async fn wrong_password_and_unknown_email_are_indistinguishable() {
    let (state, _dir) = test_state().await;
    identity::create(&state.db_pool, "real@qa.team", "someuser", "password")
        .await
        .unwrap();

    let wrong_password = auth::login(
        &state.db_pool,
        &state.tokens,
        state.token_ttl,
        "real@qa.team",
        "not-the-password",
    )
    .await
    .unwrap_err();
    let unknown_email = auth::login(
        &state.db_pool,
        &state.tokens,
        state.token_ttl,
        "ghost@qa.team",
        "password",
    )
    .await
    .unwrap_err();

    assert!(matches!(wrong_password, AppError::InvalidCredentials));
    assert!(matches!(unknown_email, AppError::InvalidCredentials));
    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
}

#[tokio::test]
async fn concurrent_joins_leave_exactly_one_membership() {
    let (state, _dir) = test_state().await;

    let owner = signup_and_login(&state, "owner@qa.team").await;
    let joiner = signup_and_login(&state, "joiner@qa.team").await;
    let room = policy::create_room(&state.db_pool, &owner.user.id, "racy-room", "")
        .await
        .unwrap();

    let (pool_a, pool_b) = (state.db_pool.clone(), state.db_pool.clone());
    let (room_a, room_b) = (room.id.clone(), room.id.clone());
    let (user_a, user_b) = (joiner.user.id.clone(), joiner.user.id.clone());

    let first = tokio::spawn(async move {
        policy::join_room(&pool_a, &room_a, &user_a, "joiner").await
    });
    let second = tokio::spawn(async move {
        policy::join_room(&pool_b, &room_b, &user_b, "joiner").await
    });

    let results = [first.await.unwrap(), second.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::AlreadyMember)))
        .count();

    assert_eq!(successes, 1, "exactly one join must win");
    assert_eq!(conflicts, 1, "the loser must observe AlreadyMember");
    assert_eq!(
        membership::count(&state.db_pool, &room.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn join_validates_room_and_user_existence() {
    let (state, _dir) = test_state().await;
    let owner = signup_and_login(&state, "owner@qa.team").await;
    let room = policy::create_room(&state.db_pool, &owner.user.id, "a-room", "")
        .await
        .unwrap();

    let no_user = policy::join_room(&state.db_pool, &room.id, "not-a-user", "x")
        .await
        .unwrap_err();
    assert!(matches!(no_user, AppError::UserNotFound));

    let no_room = policy::join_room(&state.db_pool, "not-a-room", &owner.user.id, "x")
        .await
        .unwrap_err();
    assert!(matches!(no_room, AppError::RoomNotFound));
}

#[tokio::test]
async fn delete_room_cascades_memberships_and_messages() {
    let (state, _dir) = test_state().await;

    let owner = signup_and_login(&state, "owner@qa.team").await;
    let member = signup_and_login(&state, "member@qa.team").await;
    let room = policy::create_room(&state.db_pool, &owner.user.id, "doomed", "")
        .await
        .unwrap();

    policy::join_room(&state.db_pool, &room.id, &owner.user.id, "owner")
        .await
        .unwrap();
    policy::join_room(&state.db_pool, &room.id, &member.user.id, "member")
        .await
        .unwrap();
    policy::post_message(&state.db_pool, &room.id, &member.user.id, "hello")
        .await
        .unwrap();

    // A non-owner member cannot delete; nothing is removed.
    let err = policy::delete_room(&state.db_pool, &room.id, &member.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
    assert_eq!(
        membership::count(&state.db_pool, &room.id).await.unwrap(),
        2
    );

    policy::delete_room(&state.db_pool, &room.id, &owner.user.id)
        .await
        .unwrap();

    assert!(store::get(&state.db_pool, &room.id).await.unwrap().is_none());
    assert_eq!(
        membership::count(&state.db_pool, &room.id).await.unwrap(),
        0
    );
    let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE room_id = ?")
        .bind(&room.id)
        .fetch_one(&state.db_pool)
        .await
        .unwrap();
    assert_eq!(orphaned, 0);
}

#[tokio::test]
async fn non_owner_rename_is_forbidden_for_every_other_identity() {
    let (state, _dir) = test_state().await;

    let owner = signup_and_login(&state, "owner@qa.team").await;
    let member = signup_and_login(&state, "member@qa.team").await;
    let outsider = signup_and_login(&state, "outsider@qa.team").await;
    let room = policy::create_room(&state.db_pool, &owner.user.id, "r1", "desc")
        .await
        .unwrap();
    policy::join_room(&state.db_pool, &room.id, &member.user.id, "member")
        .await
        .unwrap();

    for caller in [&member.user.id, &outsider.user.id] {
        let err = policy::update_room(&state.db_pool, &room.id, caller, "r2", "desc")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    let unchanged = store::get(&state.db_pool, &room.id).await.unwrap().unwrap();
    assert_eq!(unchanged.name, "r1");
}

#[tokio::test]
async fn room_lifecycle_scenario() {
    let (state, _dir) = test_state().await;

    // A logs in and creates R1. Creating does not join A to it.
    let a = signup_and_login(&state, "a@qa.team").await;
    let room = policy::create_room(&state.db_pool, &a.user.id, "R1", "the first room")
        .await
        .unwrap();
    assert!(
        !membership::is_member(&state.db_pool, &room.id, &a.user.id)
            .await
            .unwrap()
    );

    // B logs in, joins R1, posts a message.
    let b = signup_and_login(&state, "b@qa.team").await;
    policy::join_room(&state.db_pool, &room.id, &b.user.id, "b-in-r1")
        .await
        .unwrap();
    policy::post_message(&state.db_pool, &room.id, &b.user.id, "hi from b")
        .await
        .unwrap();

    let messages = policy::room_messages(&state.db_pool, &room.id, &b.user.id)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "hi from b");

    // B leaves; posting and reading now fail as a non-member.
    policy::leave_room(&state.db_pool, &room.id, &b.user.id)
        .await
        .unwrap();
    let err = policy::post_message(&state.db_pool, &room.id, &b.user.id, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotMember));
    let err = policy::room_messages(&state.db_pool, &room.id, &b.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotMember));

    // A, the owner, renames R1 to R2; B may not, member or not.
    let renamed = policy::update_room(&state.db_pool, &room.id, &a.user.id, "R2", "")
        .await
        .unwrap();
    assert_eq!(renamed.name, "R2");
    let err = policy::update_room(&state.db_pool, &room.id, &b.user.id, "R3", "")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));
}

#[tokio::test]
async fn membership_ledger_bookkeeping() {
    let (state, _dir) = test_state().await;

    let owner = signup_and_login(&state, "owner@qa.team").await;
    let member = signup_and_login(&state, "member@qa.team").await;
    let room = policy::create_room(&state.db_pool, &owner.user.id, "ledger", "")
        .await
        .unwrap();

    // Count on an unknown room is 0, not an error.
    assert_eq!(
        membership::count(&state.db_pool, "no-such-room").await.unwrap(),
        0
    );

    policy::join_room(&state.db_pool, &room.id, &owner.user.id, "first")
        .await
        .unwrap();
    policy::join_room(&state.db_pool, &room.id, &member.user.id, "second")
        .await
        .unwrap();

    let members = membership::list_by_room(&state.db_pool, &room.id)
        .await
        .unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].username, "first");
    assert_eq!(members[1].username, "second");

    policy::update_username(&state.db_pool, &room.id, &member.user.id, "renamed")
        .await
        .unwrap();
    let members = membership::list_by_room(&state.db_pool, &room.id)
        .await
        .unwrap();
    assert_eq!(members[1].username, "renamed");

    // Leaving twice: the second attempt is NotMember.
    policy::leave_room(&state.db_pool, &room.id, &member.user.id)
        .await
        .unwrap();
    let err = policy::leave_room(&state.db_pool, &room.id, &member.user.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotMember));
    let err = policy::update_username(&state.db_pool, &room.id, &member.user.id, "x")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotMember));
}

#[tokio::test]
async fn duplicate_email_and_room_name_conflict() {
    let (state, _dir) = test_state().await;

    identity::create(&state.db_pool, "a@qa.team", "someuser", "password")
        .await
        .unwrap();
    let err = identity::create(&state.db_pool, "A@QA.TEAM", "other", "password")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let a = auth::login(
        &state.db_pool,
        &state.tokens,
        state.token_ttl,
        "a@qa.team",
        "password",
    )
    .await
    .unwrap();
    policy::create_room(&state.db_pool, &a.user.id, "taken", "")
        .await
        .unwrap();
    let err = policy::create_room(&state.db_pool, &a.user.id, "taken", "")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}
