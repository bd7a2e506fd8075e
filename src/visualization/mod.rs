//! Guided visualizations: the script catalog and the timed player.

pub mod catalog;
pub mod player;

pub use catalog::{
    SceneType, VisualizationScript, get_script, list_scripts, script_for_emotion,
    validate_catalog,
};
pub use player::VisualizationPlayer;
