// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Compiled pattern catalogue and ANSI stripper.
//!
//! Signal-phrase classification follows the shape of
//! `driver/claude/screen_detect.rs::classify_interactive_dialog`, but
//! generalizes those fixed screens into compiled regexes so the
//! coordinator can recognise arbitrary provider wording rather than one
//! specific assistant's exact strings.

use std::sync::LazyLock;

use regex::Regex;

/// Recognised output categories, in descending match precedence.
///
/// `LoginSuccess > LoginFailed > OAuthURL / PastePrompt > SelectMethod >
/// RateLimit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    LoginSuccess,
    LoginFailed,
    OAuthUrl,
    PastePrompt,
    SelectMethod,
    OptionOne,
    RateLimit,
    CompactingBanner,
}

impl Category {
    /// Relative match precedence; lower sorts first (wins) when several
    /// categories match the same scraped output.
    fn precedence(self) -> u8 {
        match self {
            Self::LoginSuccess => 0,
            Self::LoginFailed => 1,
            Self::OAuthUrl => 2,
            Self::PastePrompt => 2,
            Self::SelectMethod => 3,
            Self::OptionOne => 3,
            Self::RateLimit => 4,
            Self::CompactingBanner => 5,
        }
    }
}

/// One compiled catalogue entry: a category paired with its pattern.
struct CatalogueEntry {
    category: Category,
    pattern: Regex,
}

/// Compiled patterns and ANSI stripper used to classify scraped pane text.
///
/// The single process-wide instance is built once via [`catalogue`] and is
/// read-only thereafter.
pub struct PatternCatalogue {
    entries: Vec<CatalogueEntry>,
    oauth_url: Regex,
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid pattern catalogue regex: {e}"))
}

impl PatternCatalogue {
    fn build() -> Self {
        let entries = vec![
            CatalogueEntry {
                category: Category::LoginSuccess,
                pattern: compile(r"(?i)(logged in as|login successful|welcome back)"),
            },
            CatalogueEntry {
                category: Category::LoginFailed,
                pattern: compile(r"(?i)(login failed|auth(entication)? error|session expired|code expired)"),
            },
            CatalogueEntry {
                category: Category::OAuthUrl,
                pattern: compile(r"https://[a-zA-Z0-9.-]+/oauth/authorize\?[^\s]*"),
            },
            CatalogueEntry {
                category: Category::PastePrompt,
                pattern: compile(r"(?i)paste (the )?code here"),
            },
            CatalogueEntry {
                category: Category::SelectMethod,
                pattern: compile(r"(?i)select (a |your )?login method"),
            },
            CatalogueEntry {
                category: Category::OptionOne,
                pattern: compile(r"(?m)^\s*[•❯>]\s*1[.)]"),
            },
            CatalogueEntry {
                category: Category::RateLimit,
                pattern: compile(r"(?i)(you'?ve hit your limit|rate limit exceeded|quota exhausted)(.*resets? [^\n]*)?"),
            },
            CatalogueEntry {
                category: Category::CompactingBanner,
                pattern: compile(r"(?i)conversation compacted.*ctrl\+o"),
            },
        ];
        let oauth_url = compile(r"https://[a-zA-Z0-9.-]+/oauth/authorize\?[^\s]*");
        Self { entries, oauth_url }
    }

    /// Return the highest-precedence category matching `stripped`, if any.
    pub fn classify(&self, stripped: &str) -> Option<Category> {
        self.entries
            .iter()
            .filter(|e| e.pattern.is_match(stripped))
            .min_by_key(|e| e.category.precedence())
            .map(|e| e.category)
    }

    /// Whether any pattern of `category` matches `stripped`.
    pub fn matches(&self, stripped: &str, category: Category) -> bool {
        self.entries.iter().any(|e| e.category == category && e.pattern.is_match(stripped))
    }

    /// Extract the first OAuth URL substring from `raw` (unstripped) text.
    ///
    /// Matching decisions happen against the ANSI-stripped form, but the
    /// URL itself is extracted from the original text because query
    /// strings may contain characters the stripper could disturb.
    pub fn extract_oauth_url(&self, raw: &str) -> Option<String> {
        self.oauth_url.find(raw).map(|m| clean_url(m.as_str()))
    }
}

/// Process-wide, read-only pattern catalogue, initialised on first use.
pub fn catalogue() -> &'static PatternCatalogue {
    static CATALOGUE: LazyLock<PatternCatalogue> = LazyLock::new(PatternCatalogue::build);
    &CATALOGUE
}

/// Trailing punctuation that may be greedily captured by the URL regex or
/// left over from surrounding prose.
const TRAILING_JUNK: &[char] = &['.', ')', '>', ','];

/// Deterministically and idempotently trim trailing junk from an extracted
/// OAuth URL. The extraction regex has ambiguous trailing-character
/// semantics, so this cleanup step resolves it.
///
/// Strips one character at a time from the set above until a fixed point
/// is reached, so repeated calls never change an already-clean URL.
pub fn clean_url(raw: &str) -> String {
    let mut s = raw.trim().to_string();
    loop {
        // A trailing ANSI reset (`\x1b[0m`) must be removed as a whole
        // unit before falling back to single-character trimming, or the
        // char-class strip below would leave a dangling `\x1b[`.
        if let Some(stripped) = s.strip_suffix("\x1b[0m") {
            s = stripped.to_string();
            continue;
        }
        let trimmed = s.trim_end_matches(TRAILING_JUNK);
        if trimmed.len() == s.len() {
            break;
        }
        s = trimmed.to_string();
    }
    s
}

/// Strip ANSI CSI escape sequences (cursor motion, SGR including
/// 256-colour and truecolour forms, screen-clear codes) from `text`.
///
/// Matching in [`PatternCatalogue`] is always performed against this
/// stripped form.
pub fn strip_ansi(text: &str) -> String {
    static CSI: LazyLock<Regex> = LazyLock::new(|| {
        // ESC '[' parameter bytes (0x30-0x3f) intermediate bytes (0x20-0x2f)
        // final byte (0x40-0x7e) — covers SGR, cursor motion, and erase
        // sequences, including 256-colour (`38;5;n`) and truecolour
        // (`38;2;r;g;b`) SGR parameter lists.
        compile(r"\x1b\[[0-9;:?]*[ -/]*[@-~]")
    });
    static OSC: LazyLock<Regex> = LazyLock::new(|| {
        // Operating System Command sequences, terminated by BEL or ST.
        compile(r"\x1b\][^\x07\x1b]*(\x07|\x1b\\)")
    });
    let no_csi = CSI.replace_all(text, "");
    OSC.replace_all(&no_csi, "").into_owned()
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
