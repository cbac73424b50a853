mod common;

use clashlands::error::EngineError;

#[tokio::test]
async fn daily_claim_is_idempotent_within_the_window() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;

    let reward = engine.claim_daily(1).await.expect("first claim");
    // level 1 scale is (1 + 1): base 500/400/5 doubles.
    assert_eq!(reward.coins, 1000);
    assert_eq!(reward.elixir, 800);
    assert_eq!(reward.gems, 10);

    let err = engine.claim_daily(1).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyClaimed));

    // The rejected claim granted nothing.
    let snap = engine.sync_and_get(1).await.expect("sync");
    assert_eq!(snap.player.coins, 1000 + reward.coins);
    assert_eq!(snap.player.gems, 50 + reward.gems);
}

#[tokio::test]
async fn daily_claim_reopens_after_the_window() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;

    engine.claim_daily(1).await.expect("first claim");
    common::backdate(&engine, 1, "last_daily_claim", 86_400 + 1).await;
    engine.claim_daily(1).await.expect("claim after window");
}

#[tokio::test]
async fn daily_reward_scales_with_level() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    sqlx::query("UPDATE users SET level = 5 WHERE user_id = 1")
        .execute(engine.store().pool())
        .await
        .expect("set level");

    let reward = engine.claim_daily(1).await.expect("claim");
    assert_eq!(reward.coins, 500 * 6);
    assert_eq!(reward.elixir, 400 * 6);
    assert_eq!(reward.gems, 5 * 6);
}

#[tokio::test]
async fn daily_claim_for_unknown_player_is_not_found() {
    let engine = common::engine().await;
    let err = engine.claim_daily(7).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}
