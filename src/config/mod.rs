//! Configuration: output dialect, page bounds, filter parsing and the record store.

mod settings;

pub use settings::{
    expand_env_vars, FilterSettings, Settings, SettingsError, StoreSettings, CONFIG_ENV,
    CONFIG_FILE,
};
