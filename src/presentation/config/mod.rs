mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    ClassifierSettings, DatabaseSettings, LoggingSettings, ServerSettings, Settings,
};
