//! Action derivation.
//!
//! Classifies a comment's parse captures into a symbolic action: a set of
//! reactions and an optional reply body. Pure fold over the captures, no
//! I/O, total over any input.

use rand::Rng;

use remind_core::Reaction;
use remind_parse::PhraseCapture;

/// The action derived for one comment in one cycle.
///
/// An action with no reactions and no reply is a no-op and is never
/// dispatched; the comment is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentAction {
    pub reactions: Vec<Reaction>,
    pub reply: Option<String>,
}

impl CommentAction {
    pub fn is_noop(&self) -> bool {
        self.reactions.is_empty() && self.reply.is_none()
    }
}

/// Canned openings for the "I didn't understand" reply. Keep them cordial.
const LEAD_INS: [&str; 4] = [
    "I didn't quite catch that. :frowning:",
    "Terribly sorry, but I didn't understand that. :flushed:",
    "Hmm, not sure what you meant there. :no_mouth:",
    "Hmm, something's not right there. :persevere:",
];

/// Picks an index into the lead-in list. Injectable so tests are
/// deterministic; the default draws at random.
pub type LeadInSelector = Box<dyn Fn(usize) -> usize + Send + Sync>;

/// Rule-based classifier from phrase captures to a [`CommentAction`].
pub struct ActionDeriver {
    handle: String,
    select_lead_in: LeadInSelector,
}

impl ActionDeriver {
    /// Create a deriver for the given bot handle with random lead-in
    /// selection.
    pub fn new(handle: &str) -> Self {
        Self::with_selector(handle, Box::new(|len| rand::rng().random_range(0..len)))
    }

    /// Create a deriver with a custom lead-in selector.
    pub fn with_selector(handle: &str, select_lead_in: LeadInSelector) -> Self {
        Self {
            handle: handle.to_string(),
            select_lead_in,
        }
    }

    /// Derive the action for one comment.
    ///
    /// `author` is the comment author's login, used to address the
    /// onboarding reply.
    pub fn derive(&self, author: &str, captures: &[PhraseCapture]) -> CommentAction {
        let mut thumbs_up = false;
        let mut thumbs_down = false;
        let mut heart = false;
        let mut confused = false;
        let mut party = false;
        let mut intro = false;

        let mut valid_count = 0usize;
        let mut truly_invalid: Vec<&str> = Vec::new();

        for capture in captures {
            match capture {
                PhraseCapture::Valid(_) => {
                    thumbs_up = true;
                    valid_count += 1;
                }
                PhraseCapture::Intro => intro = true,
                // Recognized non-command phrases double as easter eggs and
                // keep thank-you comments out of the invalid bucket.
                PhraseCapture::Invalid(phrase) => match phrase.trim().to_lowercase().as_str() {
                    "i love you" => heart = true,
                    "you rock!" | "you're awesome!" => party = true,
                    "thanks" | "thanks!" => party = true,
                    _ => {
                        thumbs_down = true;
                        truly_invalid.push(phrase.trim());
                    }
                },
            }
        }

        // A mix of valid and nonsensical phrases reads as confusion, not as
        // a thumbs-up-and-down pair.
        if thumbs_up && thumbs_down {
            thumbs_up = false;
            thumbs_down = false;
            confused = true;
        }

        let reply = if !truly_invalid.is_empty() {
            Some(self.unparsed_reply(&truly_invalid, valid_count))
        } else if intro && valid_count == 0 {
            party = true;
            Some(self.onboarding_reply(author))
        } else {
            None
        };

        let mut reactions = Vec::new();
        if thumbs_up {
            reactions.push(Reaction::ThumbsUp);
        }
        if thumbs_down {
            reactions.push(Reaction::ThumbsDown);
        }
        if confused {
            reactions.push(Reaction::Confused);
        }
        if heart {
            reactions.push(Reaction::Heart);
        }
        if party {
            reactions.push(Reaction::Party);
        }

        CommentAction { reactions, reply }
    }

    fn unparsed_reply(&self, invalid: &[&str], valid_count: usize) -> String {
        let idx = (self.select_lead_in)(LEAD_INS.len()) % LEAD_INS.len();
        let mut lines = vec![LEAD_INS[idx].to_string(), String::new()];

        if let [only] = invalid {
            lines.push(format!(
                "I don't quite understand _\"{only}\"_. Care to try again?"
            ));
        } else {
            lines.push("The following didn't make sense to me:".to_string());
            for phrase in invalid {
                lines.push(format!("- {phrase}"));
            }
        }

        if valid_count > 0 {
            let phrasing = if valid_count == 1 {
                "reminder".to_string()
            } else {
                format!("{valid_count} reminders")
            };
            lines.push(String::new());
            lines.push(format!(
                "However, I scheduled the other {phrasing} for you! :dancer:"
            ));
        }

        lines.join("\n")
    }

    fn onboarding_reply(&self, author: &str) -> String {
        let handle = &self.handle;
        format!(
            "Hey there, @{author}! I'm __{handle}__, a robot that helps you remember to do things here on GitHub.\n\
             \n\
             If you need to remember something, mention me with a time and (optionally) a reminder.\n\
             \n\
             Some examples of things I respond to:\n\
             - _@{handle} in 4 hours to check up on this PR._\n\
             - _@{handle} tomorrow to come back to this issue._\n\
             - _@{handle} on July 3rd to do a release._\n\
             - _@{handle} a year from today to update the copyright notice._\n\
             \n\
             If all of the reminders in your comment are OK, I'll simply respond with a :+1: thumbs up. \
             Otherwise, I'll let you know what I didn't understand.\n\
             \n\
             Then when the time comes, I'll ping and remind you to come back and have a look! :metal:"
        )
    }
}
