use config::{Config, ConfigError, Environment, File};
use dailynote_models::settings::Settings;

/// Reads `appsettings.toml`, then `appsettings.local.toml`, then `APP__*`
/// environment variables (for example `APP__SCHEDULER__TIMEZONE`).
pub fn load() -> Result<Settings, ConfigError> {
    let settings = Config::builder()
        .add_source(File::with_name("appsettings").required(false))
        .add_source(File::with_name("appsettings.local").required(false))
        .add_source(
            Environment::with_prefix("APP")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
