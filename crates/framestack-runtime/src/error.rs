use framestack_types::{Error, ErrorKind};

/// Wraps the ambient config/IO failure sources (`toml`, `std::io`) into the
/// shared error taxonomy (§7), so every public `Engine` method returns
/// `framestack_types::Result` like the rest of the workspace.
pub fn config_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidArgument, message)
}

pub fn io_error(err: std::io::Error) -> Error {
    Error::internal(err.to_string())
}

pub fn toml_de_error(err: toml::de::Error) -> Error {
    config_error(err.to_string())
}

pub fn toml_ser_error(err: toml::ser::Error) -> Error {
    config_error(err.to_string())
}
