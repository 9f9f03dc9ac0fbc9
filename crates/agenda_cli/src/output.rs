//! JSON envelope and exit-code mapping for CLI responses.

use serde::Serialize;
use std::fmt::Display;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
pub struct CliResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<CliError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CliError {
    pub code: &'static str,
    pub message: String,
}

impl CliError {
    pub fn new(code: &'static str, err: impl Display) -> Self {
        Self {
            code,
            message: err.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.code {
            "invalid_argument" | "config_invalid" => 2,
            _ => 1,
        }
    }
}

impl<T: Serialize> CliResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl CliResponse<()> {
    pub fn failure(error: CliError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Writes one compact JSON line to stdout; a closed pipe is not an error.
pub fn print_line<T: Serialize>(value: &T) -> Result<(), CliError> {
    let payload =
        serde_json::to_string(value).map_err(|err| CliError::new("internal_json", err))?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match writeln!(handle, "{payload}").and_then(|()| handle.flush()) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(CliError::new("internal_io", err)),
    }
}

/// Prints the final envelope for `result` and returns the process exit code.
pub fn finish<T: Serialize>(result: Result<T, CliError>) -> i32 {
    match result {
        Ok(data) => match print_line(&CliResponse::success(data)) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("{}", err.message);
                1
            }
        },
        Err(err) => {
            let code = err.exit_code();
            if print_line(&CliResponse::failure(err.clone())).is_err() {
                eprintln!("{}", err.message);
            }
            code
        }
    }
}
