//! Comment deduplication.
//!
//! Overlapping notification threads can surface the same comment more than
//! once in a single cycle; everything downstream assumes one record per
//! comment id.

use std::collections::HashSet;

use remind_core::Comment;

/// Collapse a pooled comment list to one record per id.
///
/// The first occurrence in fetch order wins; later duplicates are dropped
/// wholesale, body included.
pub fn dedupe(comments: Vec<Comment>) -> Vec<Comment> {
    let mut seen = HashSet::new();
    comments.into_iter().filter(|c| seen.insert(c.id)).collect()
}
