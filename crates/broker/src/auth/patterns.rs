// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Azure CLI output patterns.
//!
//! The CLI's human-readable output is not a stable contract. Every pattern the
//! broker depends on lives here so a format change is a one-file fix.

use regex::Regex;

/// Verification page the CLI sends users to.
pub const DEVICE_LOGIN_URL: &str = "https://microsoft.com/devicelogin";

const PROMPT_LEAD: &str = "To sign in, use a web browser to open the page";
const DEVICE_CODE: &str = r"enter the code (\S+) to authenticate";
const NOT_LOGGED_IN: &str = r"Please run 'az login'.*to setup account";
const VERSION: &str = r"azure-cli\s+(\S+)";

/// A matched device-code prompt line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub line: String,
}

/// Prompt pattern, anchored on the fixed verification page.
fn prompt_pattern() -> String {
    let url = regex::escape(DEVICE_LOGIN_URL);
    format!(r"{PROMPT_LEAD} {url} and enter the code (.*) to authenticate")
}

/// Compiled patterns for CLI output classification.
pub struct CliPatterns {
    prompt: Regex,
    device_code: Regex,
    not_logged_in: Regex,
    version: Regex,
}

impl std::fmt::Debug for CliPatterns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliPatterns")
            .field("prompt", &self.prompt.as_str())
            .field("device_code", &self.device_code.as_str())
            .finish()
    }
}

impl CliPatterns {
    pub fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            prompt: Regex::new(&prompt_pattern())?,
            device_code: Regex::new(DEVICE_CODE)?,
            not_logged_in: Regex::new(NOT_LOGGED_IN)?,
            version: Regex::new(VERSION)?,
        })
    }

    /// Match a single output line against the device-code prompt.
    pub fn match_prompt(&self, line: &str) -> Option<Prompt> {
        self.prompt.is_match(line).then(|| Prompt { line: line.to_owned() })
    }

    /// Isolate the device code from a prompt line.
    pub fn extract_device_code(&self, text: &str) -> Option<String> {
        self.device_code.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().to_owned())
    }

    /// Whether stderr from a token request says no account is set up.
    pub fn needs_login(&self, stderr: &str) -> bool {
        self.not_logged_in.is_match(stderr)
    }

    /// Pull the CLI version out of `az --version` output.
    pub fn extract_version(&self, stdout: &str) -> Option<String> {
        self.version.captures(stdout).and_then(|c| c.get(1)).map(|m| m.as_str().to_owned())
    }
}

/// Whether CLI error text asks the user to (re-)run the interactive login.
pub fn signals_sign_in(text: &str) -> bool {
    text.to_ascii_lowercase().contains("az login")
}

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod tests;
