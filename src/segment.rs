//! Splits one raw model reply into bubble-sized segments.
//!
//! A boundary is sentence-ending punctuation (`.`, `!`, `?`) followed by
//! whitespace; the punctuation stays with the preceding segment. Segments
//! come out trimmed, non-empty, in original order, and anything at or over
//! the length cap is dropped rather than re-split.

/// Upper bound on one chat bubble.
pub const MAX_SEGMENT_LEN: usize = 200;

/// Lazily segment a reply. A reply with no terminal punctuation yields
/// exactly one segment: the trimmed whole reply.
pub fn segment_reply(reply: &str) -> Segments<'_> {
    Segments { rest: reply }
}

pub struct Segments<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            if self.rest.is_empty() {
                return None;
            }

            let (raw, rest) = match find_boundary(self.rest) {
                Some(cut) => self.rest.split_at(cut),
                None => (self.rest, ""),
            };
            self.rest = rest;

            let segment = raw.trim();
            if !segment.is_empty() && segment.len() < MAX_SEGMENT_LEN {
                return Some(segment);
            }
            // Empty or oversized pieces are skipped, not returned.
        }
    }
}

/// Byte offset just past the first `[.!?]` that is followed by whitespace,
/// or `None` when the text has no such boundary.
fn find_boundary(text: &str) -> Option<usize> {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(_, next)) = chars.peek() {
                if next.is_whitespace() {
                    return Some(i + c.len_utf8());
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(reply: &str) -> Vec<&str> {
        segment_reply(reply).collect()
    }

    #[test]
    fn splits_on_sentence_punctuation() {
        assert_eq!(
            collect("Hi! How are you? I'm good."),
            vec!["Hi!", "How are you?", "I'm good."]
        );
    }

    #[test]
    fn no_terminal_punctuation_yields_whole_reply() {
        assert_eq!(collect("just vibing rn"), vec!["just vibing rn"]);
    }

    #[test]
    fn trims_and_drops_empty_pieces() {
        assert_eq!(collect("  hey!   \n  what's up?  "), vec!["hey!", "what's up?"]);
        assert!(collect("   ").is_empty());
    }

    #[test]
    fn consecutive_punctuation_stays_together() {
        assert_eq!(collect("no way?! fr tho."), vec!["no way?!", "fr tho."]);
    }

    #[test]
    fn mid_sentence_dots_do_not_split() {
        assert_eq!(collect("lol v2.0 dropped. wild"), vec!["lol v2.0 dropped.", "wild"]);
    }

    #[test]
    fn oversized_segment_is_dropped() {
        let long = "a".repeat(MAX_SEGMENT_LEN + 5);
        let reply = format!("short one. {long}");
        assert_eq!(collect(&reply), vec!["short one."]);
    }

    #[test]
    fn order_is_preserved_without_dedup() {
        assert_eq!(collect("same. same. same."), vec!["same.", "same.", "same."]);
    }
}
