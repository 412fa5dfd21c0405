//! Mention scanning over comment bodies.
//!
//! A command mention is the bot's handle at the start of a line, optionally
//! followed by a time phrase; a trailing "to ..." clause is free-text
//! reminder content and is stripped before resolution. A looser
//! any-position match backs the orchestrator's coarse screening filter.

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::resolve::DateResolver;
use crate::PhraseCapture;

/// Per-handle compiled mention patterns plus the date resolver.
pub struct MentionScanner {
    line_re: Regex,
    anywhere_re: Regex,
    resolver: DateResolver,
}

impl MentionScanner {
    /// Compile the mention patterns for the given handle (no leading `@`).
    ///
    /// The handle is matched case-insensitively. Panics only on a handle
    /// that breaks the regex size limit, which no real login can.
    pub fn new(handle: &str) -> Self {
        let escaped = regex::escape(handle);
        let line_re = Regex::new(&format!(
            r"(?im)^[ \t]*@{escaped}(?:[ \t]+([^\r\n]+?)(?:[ \t]+to(?:[ \t][^\r\n]*)?)?)?[ \t]*\r?$",
        ))
        .expect("mention line pattern");
        let anywhere_re =
            Regex::new(&format!(r"(?i)@{escaped}")).expect("mention anywhere pattern");
        Self {
            line_re,
            anywhere_re,
            resolver: DateResolver::new(),
        }
    }

    /// Coarse screen: does the body mention the handle at all, anywhere?
    pub fn mentions_anywhere(&self, body: &str) -> bool {
        self.anywhere_re.is_match(body)
    }

    /// Extract one capture per command-mention line, in body order.
    ///
    /// A line with only the bare handle (or the handle followed by nothing
    /// but whitespace) yields an introductory capture; every other phrase
    /// goes through the date resolver.
    pub fn extract(&self, body: &str, now: DateTime<Utc>) -> Vec<PhraseCapture> {
        self.line_re
            .captures_iter(body)
            .map(|caps| match caps.get(1) {
                Some(m) => {
                    let phrase = m.as_str().trim();
                    if phrase.is_empty() {
                        PhraseCapture::Intro
                    } else {
                        match self.resolver.resolve(phrase, now) {
                            Some(instant) => PhraseCapture::Valid(instant),
                            None => PhraseCapture::Invalid(phrase.to_string()),
                        }
                    }
                }
                None => PhraseCapture::Intro,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Monday 2016-08-01 12:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 8, 1, 12, 0, 0).unwrap()
    }

    fn scanner() -> MentionScanner {
        MentionScanner::new("RemindMe")
    }

    fn extract(body: &str) -> Vec<PhraseCapture> {
        scanner().extract(body, fixed_now())
    }

    #[test]
    fn test_valid_phrase_extracted() {
        let captures = extract("@RemindMe in 2 hours");
        assert_eq!(captures.len(), 1);
        assert!(captures[0].is_valid());
    }

    #[test]
    fn test_invalid_phrase_kept_verbatim() {
        let captures = extract("@RemindMe next sometime");
        assert_eq!(
            captures,
            vec![PhraseCapture::Invalid("next sometime".to_string())]
        );
    }

    #[test]
    fn test_bare_mention_is_intro() {
        assert_eq!(extract("@RemindMe"), vec![PhraseCapture::Intro]);
        // Trailing whitespace still counts as bare.
        assert_eq!(extract("@RemindMe   "), vec![PhraseCapture::Intro]);
    }

    #[test]
    fn test_handle_is_case_insensitive() {
        let captures = extract("@remindme tomorrow");
        assert!(captures[0].is_valid());
    }

    #[test]
    fn test_leading_whitespace_allowed() {
        let captures = extract("  \t@RemindMe tomorrow");
        assert_eq!(captures.len(), 1);
    }

    #[test]
    fn test_mid_sentence_mention_is_not_a_command() {
        let body = "please @RemindMe tomorrow";
        assert!(extract(body).is_empty());
        assert!(scanner().mentions_anywhere(body));
    }

    #[test]
    fn test_trailing_to_clause_is_stripped() {
        let captures = extract("@RemindMe in 4 hours to check up on this PR.");
        assert_eq!(captures.len(), 1);
        assert_eq!(
            captures[0],
            PhraseCapture::Valid(fixed_now() + chrono::Duration::hours(4))
        );
    }

    #[test]
    fn test_from_today_is_not_mistaken_for_to_clause() {
        // "to" only delimits a reminder clause as a whole word; the "to"
        // inside "today" must stay part of the phrase.
        let captures = extract("@RemindMe a year from today to update the copyright notice.");
        assert!(captures[0].is_valid());
    }

    #[test]
    fn test_multiple_mention_lines_in_body_order() {
        let captures = extract("@RemindMe in 2 hours\n@RemindMe thanks!");
        assert_eq!(captures.len(), 2);
        assert!(captures[0].is_valid());
        assert_eq!(captures[1], PhraseCapture::Invalid("thanks!".to_string()));
    }

    #[test]
    fn test_crlf_line_endings() {
        let captures = extract("@RemindMe tomorrow\r\n@RemindMe\r\n");
        assert_eq!(captures.len(), 2);
        assert!(captures[0].is_valid());
        assert_eq!(captures[1], PhraseCapture::Intro);
    }

    #[test]
    fn test_longer_handle_is_not_matched() {
        let body = "@RemindMeNow tomorrow";
        assert!(extract(body).is_empty());
    }

    #[test]
    fn test_non_mention_lines_ignored() {
        let body = "Some discussion.\n@RemindMe on saturday\nMore discussion.";
        let captures = extract(body);
        assert_eq!(captures.len(), 1);
        assert!(captures[0].is_valid());
    }

    #[test]
    fn test_past_phrase_is_invalid_capture() {
        assert_eq!(
            extract("@RemindMe yesterday"),
            vec![PhraseCapture::Invalid("yesterday".to_string())]
        );
    }

    #[test]
    fn test_mentions_anywhere_is_loose() {
        let s = scanner();
        assert!(s.mentions_anywhere("thanks @remindme!"));
        assert!(s.mentions_anywhere("@RemindMeNow")); // coarse screen accepts prefix matches
        assert!(!s.mentions_anywhere("no mention here"));
    }
}
