mod common;

use clashlands::config::Tuning;
use clashlands::db::models::MissionKind;
use clashlands::error::EngineError;
use clashlands::game::moderation;

#[test]
fn check_matches_case_insensitive_substrings() {
    let terms: Vec<String> = ["cheater", "free gems"].iter().map(|s| s.to_string()).collect();
    assert!(moderation::check(&terms, "what a CHEATER you are").contains(&"cheater".to_string()));
    assert!(moderation::check(&terms, "good game").is_empty());
    assert_eq!(moderation::check(&terms, "FREE GEMS here, cheater").len(), 2);
}

#[tokio::test]
async fn three_flagged_messages_escalate_to_a_mute() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    let clan_id = engine.create_clan("warband", None, "", 1).await.expect("clan");

    for expected in 1..=2 {
        let posted = engine
            .post_clan_message(clan_id, 1, "you cheater")
            .await
            .expect("flagged post");
        assert!(posted.flagged);
        assert_eq!(posted.warnings, expected);
        assert!(posted.muted_until.is_none());
    }

    let third = engine
        .post_clan_message(clan_id, 1, "CHEATER again")
        .await
        .expect("third flagged post");
    assert!(third.flagged);
    assert_eq!(third.warnings, 3);
    assert!(third.muted_until.is_some());

    // Muted now: the next post is rejected outright.
    let err = engine.post_clan_message(clan_id, 1, "hello").await.unwrap_err();
    assert!(matches!(err, EngineError::Muted(r) if r > 0));

    // All three flagged messages were stored for audit.
    let messages = engine.clan_messages(clan_id, 50).await.expect("messages");
    assert_eq!(messages.len(), 3);
}

#[tokio::test]
async fn flagged_messages_do_not_advance_the_chat_mission() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    let clan_id = engine.create_clan("warband", None, "", 1).await.expect("clan");

    engine.post_clan_message(clan_id, 1, "cheater").await.expect("flagged");
    engine.post_clan_message(clan_id, 1, "clean words").await.expect("clean");

    let missions = engine.missions(1).await.expect("missions");
    let chat = missions
        .iter()
        .find(|m| m.kind == MissionKind::SendClanMessages)
        .expect("chat mission");
    assert_eq!(chat.current_value, 1);
}

#[tokio::test]
async fn posting_requires_membership() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    common::register(&engine, 2, "bob").await;
    let clan_id = engine.create_clan("warband", None, "", 1).await.expect("clan");

    let err = engine.post_clan_message(clan_id, 2, "hi").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

#[tokio::test]
async fn forbidden_names_are_rejected_outright() {
    let engine = common::engine().await;
    let err = engine.register(1, "pro cheater", None).await.unwrap_err();
    assert!(matches!(err, EngineError::ForbiddenContent));

    common::register(&engine, 1, "alice").await;
    let err = engine.create_clan("free gems clan", None, "", 1).await.unwrap_err();
    assert!(matches!(err, EngineError::ForbiddenContent));
}

#[tokio::test]
async fn reports_stay_pending_until_resolved() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    common::register(&engine, 2, "bob").await;
    let clan_id = engine.create_clan("warband", None, "", 1).await.expect("clan");
    let posted = engine.post_clan_message(clan_id, 1, "hi there").await.expect("post");

    let report_id = engine
        .report(2, 1, Some(posted.message_id), "spam")
        .await
        .expect("report");

    let pending = engine.pending_reports().await.expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].report_id, report_id);
    assert_eq!(pending[0].reporter_id, 2);

    // The referenced message's report counter moved.
    let messages = engine.clan_messages(clan_id, 10).await.expect("messages");
    assert_eq!(messages[0].report_count, 1);

    engine.resolve_report(report_id).await.expect("resolve");
    assert!(engine.pending_reports().await.expect("pending").is_empty());

    // Resolving twice fails: the report is no longer pending.
    let err = engine.resolve_report(report_id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

#[tokio::test]
async fn reporting_an_unknown_message_fails() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    common::register(&engine, 2, "bob").await;

    let err = engine.report(2, 1, Some(999), "spam").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound));
}

#[test]
fn custom_forbidden_terms_are_honored() {
    let mut t = Tuning::default();
    t.forbidden_terms = vec!["bananas".to_string()];
    assert!(!moderation::is_clean(&t.forbidden_terms, "totally BANANAS"));
    assert!(moderation::is_clean(&t.forbidden_terms, "cheater"));
}
