pub mod algo;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod ops;

#[cfg(feature = "plugin")]
pub mod commands;

#[cfg(feature = "plugin")]
use nu_plugin::{Plugin, PluginCommand};

#[cfg(feature = "plugin")]
pub struct SurveyPlugin;

#[cfg(feature = "plugin")]
impl Plugin for SurveyPlugin {
    fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").into()
    }

    fn commands(&self) -> Vec<Box<dyn PluginCommand<Plugin = Self>>> {
        vec![
            Box::new(commands::Normalize),
            Box::new(commands::Region),
            Box::new(commands::Sentiment),
            Box::new(commands::Cluster),
        ]
    }
}
