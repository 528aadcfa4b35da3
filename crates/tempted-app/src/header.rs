// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::keymap::KeyHelp;

pub const LOGO: &str = "tempted";
pub const DEFAULT_LOGO_COLOR: &str = "#7b61ff";
pub const NO_VERSION: &str = "no version";

/// Top banner: logo, version, server target and key help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub logo: String,
    pub logo_color: String,
    pub target: String,
    pub version: String,
    pub key_help: KeyHelp,
}

impl Header {
    pub fn new(logo_color: &str, target: &str, version: &str, sha: &str) -> Self {
        let logo_color = if logo_color.trim().is_empty() {
            DEFAULT_LOGO_COLOR
        } else {
            logo_color.trim()
        };
        Self {
            logo: LOGO.to_owned(),
            logo_color: logo_color.to_owned(),
            target: target.to_owned(),
            version: version_string(version, sha),
            key_help: KeyHelp::default(),
        }
    }

    pub fn set_key_help(&mut self, key_help: KeyHelp) {
        self.key_help = key_help;
    }

    /// Lines the header occupies: the banner line plus key help.
    pub fn view_height(&self) -> u16 {
        let help = u16::try_from(self.key_help.line_count()).unwrap_or(u16::MAX);
        help.saturating_add(1)
    }
}

/// `"<version> (<short sha>)"`, or just the version when no sha is known.
pub fn version_string(version: &str, sha: &str) -> String {
    let version = version.trim();
    if version.is_empty() {
        return NO_VERSION.to_owned();
    }
    let short = sha.chars().take(7).collect::<String>();
    if short.is_empty() {
        version.to_owned()
    } else {
        format!("{version} ({short})")
    }
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_LOGO_COLOR, Header, NO_VERSION, version_string};
    use crate::keymap::page_key_help;
    use crate::pages::Page;

    #[test]
    fn version_string_truncates_sha() {
        assert_eq!(version_string("0.1.0", "abcdef0123456"), "0.1.0 (abcdef0)");
        assert_eq!(version_string("0.1.0", "abc"), "0.1.0 (abc)");
        assert_eq!(version_string("0.1.0", ""), "0.1.0");
    }

    #[test]
    fn missing_version_uses_placeholder() {
        assert_eq!(version_string("", ""), NO_VERSION);
        assert_eq!(version_string("", "abcdef0123456"), NO_VERSION);
        assert_eq!(version_string("  ", "abc"), NO_VERSION);
        let header = Header::new("", "target", "", "abcdef0");
        assert_eq!(header.version, "no version");
    }

    #[test]
    fn blank_logo_color_falls_back() {
        let header = Header::new("  ", "http://localhost:7243", "0.1.0", "");
        assert_eq!(header.logo_color, DEFAULT_LOGO_COLOR);
        let header = Header::new("#ff0000", "http://localhost:7243", "0.1.0", "");
        assert_eq!(header.logo_color, "#ff0000");
    }

    #[test]
    fn view_height_tracks_key_help() {
        let mut header = Header::new("", "target", "0.1.0", "");
        assert_eq!(header.view_height(), 1);
        header.set_key_help(page_key_help(Page::Workflows, false, false, false, false));
        assert_eq!(header.view_height(), 5);
        header.set_key_help(page_key_help(Page::Workflows, true, false, false, false));
        assert_eq!(header.view_height(), 3);
    }
}
