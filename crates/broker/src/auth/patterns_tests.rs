// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;

use super::{signals_sign_in, CliPatterns, DEVICE_LOGIN_URL};

const PROMPT_LINE: &str = "WARNING: To sign in, use a web browser to open the page \
    https://microsoft.com/devicelogin and enter the code ABC123 to authenticate.";

#[test]
fn extracts_code_from_prompt_tail() -> anyhow::Result<()> {
    let patterns = CliPatterns::compile()?;
    let code = patterns.extract_device_code("...enter the code ABC123 to authenticate");
    assert_eq!(code.as_deref(), Some("ABC123"));
    Ok(())
}

#[test]
fn matches_full_prompt_line() -> anyhow::Result<()> {
    let patterns = CliPatterns::compile()?;
    let prompt = patterns
        .match_prompt(PROMPT_LINE)
        .ok_or_else(|| anyhow::anyhow!("no match"))?;
    assert_eq!(patterns.extract_device_code(&prompt.line).as_deref(), Some("ABC123"));
    Ok(())
}

#[test]
fn prompt_with_blank_code_matches_but_does_not_extract() -> anyhow::Result<()> {
    let patterns = CliPatterns::compile()?;
    let line = "To sign in, use a web browser to open the page https://microsoft.com/devicelogin \
                and enter the code   to authenticate.";
    assert!(patterns.match_prompt(line).is_some());
    assert_eq!(patterns.extract_device_code(line), None);
    Ok(())
}

#[test]
fn prompt_must_name_the_verification_page() -> anyhow::Result<()> {
    let patterns = CliPatterns::compile()?;
    let line = PROMPT_LINE.replace(DEVICE_LOGIN_URL, "https://example.com/phish");
    assert!(patterns.match_prompt(&line).is_none());
    Ok(())
}

#[yare::parameterized(
    banner   = { "Retrieving tenants and subscriptions for the selection..." },
    json     = { "[{\"cloudName\": \"AzureCloud\"}]" },
    empty    = { "" },
)]
fn unrelated_lines_are_not_prompts(line: &str) {
    let patterns = CliPatterns::compile().map_err(|e| e.to_string());
    assert!(matches!(patterns, Ok(ref p) if p.match_prompt(line).is_none()));
}

#[test]
fn detects_missing_account() -> anyhow::Result<()> {
    let patterns = CliPatterns::compile()?;
    assert!(patterns.needs_login("ERROR: Please run 'az login' to setup account."));
    assert!(!patterns.needs_login("ERROR: AADSTS50076: multi-factor authentication required"));
    Ok(())
}

#[test]
fn parses_version_table() -> anyhow::Result<()> {
    let patterns = CliPatterns::compile()?;
    let stdout = "azure-cli                         2.61.0\n\ncore        2.61.0\n";
    assert_eq!(patterns.extract_version(stdout).as_deref(), Some("2.61.0"));
    assert_eq!(patterns.extract_version("no version here"), None);
    Ok(())
}

#[test]
fn sign_in_signal_is_case_insensitive() {
    assert!(signals_sign_in("Please run 'AZ LOGIN' to setup account."));
    assert!(!signals_sign_in("token request timed out"));
}

proptest! {
    #[test]
    fn any_code_token_round_trips(code in "[A-Z0-9]{6,12}") {
        let patterns = CliPatterns::compile().map_err(|e| TestCaseError::fail(e.to_string()))?;
        let line = format!(
            "To sign in, use a web browser to open the page {DEVICE_LOGIN_URL} \
             and enter the code {code} to authenticate."
        );
        prop_assert!(patterns.match_prompt(&line).is_some());
        prop_assert_eq!(patterns.extract_device_code(&line), Some(code));
    }
}
