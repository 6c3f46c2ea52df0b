pub mod achievement_list;
pub mod cook_through;
pub mod daily_mission_card;
pub mod data_settings;
pub mod mastery_tree;
pub mod profile_stats;
pub mod recipe_browser;
pub mod recipe_card;
pub mod xp_progress_bar;
