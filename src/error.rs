use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a run. Malformed report lines are not represented
/// here; the parser drops them silently.
#[derive(Debug, Error)]
pub enum Error {
    /// The scan report file could not be opened or read.
    #[error("cannot read scan report '{path}': {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The requested profile name is not in the configured profile table.
    #[error("unknown scan profile '{0}'")]
    UnknownProfile(String),

    /// nmap could not be launched, or exited nonzero.
    #[error("scan invocation failed: {0}")]
    ScanInvocation(String),

    /// Any failure while synthesizing or writing the report document.
    #[error("report generation failed: {0}")]
    Report(#[from] anyhow::Error),
}

impl Error {
    /// Process exit status for this error, per the command contract:
    /// 1 = unreadable input, 2 = processing error, 3 = scan failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::FileAccess { .. } => 1,
            Error::UnknownProfile(_) | Error::ScanInvocation(_) => 3,
            Error::Report(_) => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_command_contract() {
        let err = Error::FileAccess {
            path: PathBuf::from("scan.txt"),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), 1);
        assert_eq!(Error::UnknownProfile("warp".into()).exit_code(), 3);
        assert_eq!(Error::ScanInvocation("exit code 1".into()).exit_code(), 3);
        assert_eq!(
            Error::Report(anyhow::anyhow!("disk full")).exit_code(),
            2
        );
    }
}
