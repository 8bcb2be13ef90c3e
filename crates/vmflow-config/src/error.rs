use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Searched:\n\
        - current directory: vmflow.local.yaml, .vmflow.local.yaml, vmflow.yaml, .vmflow.yaml\n\
        - ./.vmflow/ directory\n\
        - ~/.config/vmflow/vmflow.yaml\n\
        A path can also be given with the VMFLOW_CONFIG_PATH environment variable"
    )]
    ConfigNotFound,

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("YAML error in {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
