//! Conversation transcript
//!
//! An ordered list of entries shown top-to-bottom. Entries are only ever
//! appended, except pending placeholders, which are removed when their
//! request settles.

/// Identifier of a transcript entry, unique for the lifetime of a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

/// Who authored an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

/// A single transcript item
#[derive(Debug, Clone)]
pub struct MessageEntry {
    pub id: EntryId,
    pub role: ChatRole,
    pub text: String,
    /// Waiting on a reply; rendered as a progress indicator instead of text.
    pub pending: bool,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<MessageEntry>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[MessageEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&MessageEntry> {
        self.entries.last()
    }

    pub fn get(&self, id: EntryId) -> Option<&MessageEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| e.pending).count()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> EntryId {
        self.push(ChatRole::User, text.into(), false)
    }

    pub fn push_assistant(&mut self, text: impl Into<String>) -> EntryId {
        self.push(ChatRole::Assistant, text.into(), false)
    }

    /// Append an assistant placeholder awaiting a reply.
    pub fn push_pending(&mut self) -> EntryId {
        self.push(ChatRole::Assistant, String::new(), true)
    }

    /// Remove the pending entry `id` and append an assistant entry with `text`.
    ///
    /// Returns the new entry's id, or `None` when `id` is not a pending entry
    /// (already settled or never existed). In that case nothing changes.
    pub fn settle(&mut self, id: EntryId, text: impl Into<String>) -> Option<EntryId> {
        let idx = self.entries.iter().position(|e| e.id == id && e.pending)?;
        self.entries.remove(idx);
        Some(self.push_assistant(text))
    }

    fn push(&mut self, role: ChatRole, text: String, pending: bool) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(MessageEntry {
            id,
            role,
            text,
            pending,
        });
        id
    }
}
