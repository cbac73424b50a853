pub mod attack_repo;
pub mod clan_repo;
pub mod leaderboard_repo;
pub mod models;
pub mod player_repo;
pub mod report_repo;
pub mod schema;
