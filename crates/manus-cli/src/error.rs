use thiserror::Error;

pub const ENV_PREFIX: &str = "MANUS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required setting. Set the {env_var} environment variable or add it to the config file")]
    MissingEnvVar { env_var: String },

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// The environment variable that sets a field. Bare field names are looked up in the
/// provider section, the only one with required fields.
pub fn to_env_var(field: &str) -> String {
    let path = if field.contains('.') {
        field.to_string()
    } else {
        format!("provider.{}", field)
    };
    format!("{}_{}", ENV_PREFIX, path.replace('.', "__").to_uppercase())
}
