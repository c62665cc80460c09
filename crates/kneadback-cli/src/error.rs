use anyhow::Error;
use kneadback_client::ClientError;
use kneadback_config::ConfigError;
use kneadback_core::{CoreError, ValidationErrors};
use std::process::ExitCode;
use thiserror::Error as ThisError;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_NOT_FOUND: u8 = 2;
pub const EXIT_INVALID_INPUT: u8 = 3;

#[derive(Debug, ThisError)]
pub enum CliError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub fn invalid_input(message: impl Into<String>) -> Error {
    CliError::InvalidInput(message.into()).into()
}

pub fn report_error(err: &Error, verbose: bool) {
    if verbose {
        eprintln!("error: {:#}", err);
    } else {
        eprintln!("error: {}", err);
    }
}

pub fn exit_code_for(err: &Error) -> ExitCode {
    for cause in err.chain() {
        if let Some(cli_err) = cause.downcast_ref::<CliError>() {
            return ExitCode::from(match cli_err {
                CliError::InvalidInput(_) => EXIT_INVALID_INPUT,
            });
        }
        if let Some(client_err) = cause.downcast_ref::<ClientError>() {
            return ExitCode::from(client_exit_code(client_err));
        }
        if let Some(config_err) = cause.downcast_ref::<ConfigError>() {
            return ExitCode::from(config_exit_code(config_err));
        }
        if cause.downcast_ref::<ValidationErrors>().is_some()
            || cause.downcast_ref::<CoreError>().is_some()
        {
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    }
    ExitCode::from(EXIT_FAILURE)
}

fn client_exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Precondition(_) | ClientError::Url(_) | ClientError::InvalidDataPath(_) => {
            EXIT_INVALID_INPUT
        }
        ClientError::Status { status: 404, .. } => EXIT_NOT_FOUND,
        ClientError::Status { status, .. } if (400..500).contains(status) => EXIT_INVALID_INPUT,
        ClientError::Status { .. }
        | ClientError::Io(_)
        | ClientError::Http(_)
        | ClientError::Decode(_)
        | ClientError::Json(_)
        | ClientError::Lock { .. }
        | ClientError::MissingHomeDir => EXIT_FAILURE,
    }
}

fn config_exit_code(err: &ConfigError) -> u8 {
    match err {
        ConfigError::MissingHomeDir => EXIT_FAILURE,
        ConfigError::InvalidConfigPath(_)
        | ConfigError::MissingConfigFile(_)
        | ConfigError::InvalidApiUrl { .. }
        | ConfigError::InvalidTimeout(_)
        | ConfigError::InvalidBackoff(_)
        | ConfigError::InvalidPort(_)
        | ConfigError::InvalidListLimit(_)
        | ConfigError::InvalidEnv { .. }
        | ConfigError::Read { .. }
        | ConfigError::Parse { .. } => EXIT_INVALID_INPUT,
    }
}

#[cfg(test)]
mod tests {
    use super::{client_exit_code, EXIT_FAILURE, EXIT_INVALID_INPUT, EXIT_NOT_FOUND};
    use kneadback_client::ClientError;

    fn status(status: u16) -> ClientError {
        ClientError::Status {
            status,
            body: String::new(),
        }
    }

    #[test]
    fn status_codes_map_to_exit_codes() {
        assert_eq!(client_exit_code(&status(404)), EXIT_NOT_FOUND);
        assert_eq!(client_exit_code(&status(422)), EXIT_INVALID_INPUT);
        assert_eq!(client_exit_code(&status(503)), EXIT_FAILURE);
    }
}
