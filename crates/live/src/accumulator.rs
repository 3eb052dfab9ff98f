//! Utterance accumulators
//!
//! One mutable buffer per speaking role, holding the in-progress utterance
//! until a final signal flushes it into the turn history.

/// Accumulates text fragments for one role
///
/// User speech fragments arrive as separate recognition results and are
/// space-joined; model fragments are contiguous stream chunks and are
/// appended verbatim.
#[derive(Debug, Default)]
pub struct UtteranceAccumulator {
    buffer: String,
    space_joined: bool,
}

impl UtteranceAccumulator {
    /// Accumulator that joins fragments with a single space
    pub fn space_joined() -> Self {
        Self {
            buffer: String::new(),
            space_joined: true,
        }
    }

    /// Accumulator that appends fragments verbatim
    pub fn contiguous() -> Self {
        Self {
            buffer: String::new(),
            space_joined: false,
        }
    }

    /// Append one fragment
    ///
    /// In space-joined mode fragments are trimmed so that recognition
    /// results arriving with their own padding still join with exactly one
    /// space.
    pub fn push(&mut self, fragment: &str) {
        let fragment = if self.space_joined {
            fragment.trim()
        } else {
            fragment
        };
        if fragment.is_empty() {
            return;
        }
        if self.space_joined && !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(fragment);
    }

    /// Current accumulated text
    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// Length of the accumulated text in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take the accumulated text, leaving the buffer empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_joined_accumulation() {
        let mut acc = UtteranceAccumulator::space_joined();
        acc.push("hello");
        acc.push("world");
        assert_eq!(acc.as_str(), "hello world");
    }

    #[test]
    fn test_space_joined_ignores_empty_fragments() {
        let mut acc = UtteranceAccumulator::space_joined();
        acc.push("");
        acc.push("hello");
        acc.push("   ");
        assert_eq!(acc.as_str(), "hello");
    }

    #[test]
    fn test_space_joined_trims_padded_fragments() {
        let mut acc = UtteranceAccumulator::space_joined();
        acc.push("hello");
        acc.push(" world");
        assert_eq!(acc.as_str(), "hello world");
    }

    #[test]
    fn test_contiguous_accumulation() {
        let mut acc = UtteranceAccumulator::contiguous();
        acc.push("Good ");
        acc.push("morning");
        assert_eq!(acc.as_str(), "Good morning");
    }

    #[test]
    fn test_take_clears_buffer() {
        let mut acc = UtteranceAccumulator::space_joined();
        acc.push("hello");
        assert_eq!(acc.take(), "hello");
        assert!(acc.is_empty());

        // After a take, joining starts fresh.
        acc.push("again");
        assert_eq!(acc.as_str(), "again");
    }
}
