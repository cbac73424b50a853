mod common;

use clashlands::db::models::MissionKind;

async fn mission(engine: &clashlands::GameEngine, id: i64, kind: MissionKind) -> clashlands::db::models::Mission {
    engine
        .missions(id)
        .await
        .expect("missions")
        .into_iter()
        .find(|m| m.kind == kind)
        .expect("mission of kind")
}

#[tokio::test]
async fn registration_generates_the_daily_set() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;

    let missions = engine.missions(1).await.expect("missions");
    assert_eq!(missions.len(), 4);
    assert!(missions.iter().all(|m| !m.completed && m.current_value == 0));

    // Listing again does not regenerate or duplicate.
    let again = engine.missions(1).await.expect("missions again");
    assert_eq!(again.len(), 4);
}

#[tokio::test]
async fn fifth_message_completes_the_mission_exactly_once() {
    let engine = common::engine().await;
    common::register(&engine, 1, "alice").await;
    let clan_id = engine.create_clan("warband", None, "", 1).await.expect("clan");

    for n in 1..=4 {
        engine
            .post_clan_message(clan_id, 1, &format!("hello {n}"))
            .await
            .expect("post");
        let m = mission(&engine, 1, MissionKind::SendClanMessages).await;
        assert_eq!(m.current_value, n);
        assert!(!m.completed);
    }

    let gems_before = engine.sync_and_get(1).await.expect("sync").player.gems;
    engine.post_clan_message(clan_id, 1, "hello 5").await.expect("post 5");

    let m = mission(&engine, 1, MissionKind::SendClanMessages).await;
    assert!(m.completed);
    assert_eq!(m.current_value, 5);
    let gems_after_fifth = engine.sync_and_get(1).await.expect("sync").player.gems;
    assert_eq!(gems_after_fifth, gems_before + 3);

    // A sixth qualifying message leaves the completed mission untouched.
    engine.post_clan_message(clan_id, 1, "hello 6").await.expect("post 6");
    let m = mission(&engine, 1, MissionKind::SendClanMessages).await;
    assert!(m.completed);
    assert_eq!(m.current_value, 5);
    let gems_after_sixth = engine.sync_and_get(1).await.expect("sync").player.gems;
    assert_eq!(gems_after_sixth, gems_after_fifth);
}

#[tokio::test]
async fn win_attack_mission_counts_only_wins() {
    use clashlands::config::Tuning;
    use common::ScriptedRng;

    // First attack loses (draw 0.999), the next ones win (0.0 cycles back).
    let engine = common::engine_with_rng(
        Tuning::default(),
        Box::new(ScriptedRng::new(&[0.999, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0])),
    )
    .await;
    common::register(&engine, 1, "alice").await;
    common::register(&engine, 2, "bob").await;

    engine.attack(1, 2).await.expect("losing attack");
    let m = mission(&engine, 1, MissionKind::WinAttacks).await;
    assert_eq!(m.current_value, 0);

    common::backdate(&engine, 1, "last_attack_time", 301).await;
    engine.attack(1, 2).await.expect("winning attack");
    let m = mission(&engine, 1, MissionKind::WinAttacks).await;
    assert_eq!(m.current_value, 1);
    assert!(!m.completed);
}
