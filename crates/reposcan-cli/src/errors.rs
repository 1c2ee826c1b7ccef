// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to [`ScanError`] and adds actionable hints.
//! The structured error data stays in the core; presentation lives here.

use anyhow::Error;
use reposcan_core::error::ScanError;

/// Formats an error for CLI display with helpful hints.
///
/// If the error is not a [`ScanError`], returns the original message.
pub fn format_error(error: &Error) -> String {
    if let Some(scan_err) = error.downcast_ref::<ScanError>() {
        match scan_err {
            ScanError::NotAuthenticated => {
                "Authentication required - set GITHUB_TOKEN or run `gh auth login` first"
                    .to_string()
            }
            ScanError::JobAlreadyRunning { .. } => {
                format!("{scan_err}\n\nTip: Only one scan runs at a time.")
            }
            ScanError::ListingUnavailable { .. } | ScanError::GitHub { .. } => {
                format!("{scan_err}\n\nTip: Check your GitHub token and network connection.")
            }
            ScanError::Config { .. } => {
                let path = reposcan_core::config::config_file_path()
                    .map_or_else(|| "~/.config/reposcan/config.toml".to_string(), |p| {
                        p.display().to_string()
                    });
                format!("{scan_err}\n\nTip: Check your config file at {path}")
            }
            ScanError::NoActiveJob => scan_err.to_string(),
        }
    } else {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_not_authenticated_error() {
        let err = anyhow::Error::new(ScanError::NotAuthenticated);
        let formatted = format_error(&err);
        assert!(formatted.contains("Authentication required"));
        assert!(formatted.contains("gh auth login"));
    }

    #[test]
    fn test_format_listing_error_includes_hint() {
        let err = anyhow::Error::new(ScanError::ListingUnavailable {
            message: "connection refused".to_string(),
        });
        let formatted = format_error(&err);
        assert!(formatted.contains("connection refused"));
        assert!(formatted.contains("Tip:"));
    }

    #[test]
    fn test_format_generic_error_passthrough() {
        let err = anyhow::anyhow!("Some generic error");
        assert_eq!(format_error(&err), "Some generic error");
    }
}
