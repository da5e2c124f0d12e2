//! Conversation history.

use debt_chat_model::ChatMessage;

/// The ordered history of one session.
///
/// The first message is always the system instructions, which survive a
/// [`Conversation::reset`].
#[derive(Clone, Debug)]
pub struct Conversation {
    system_prompt: String,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Creates a conversation holding only the system instructions.
    pub fn new<S: Into<String>>(system_prompt: S) -> Self {
        let system_prompt = system_prompt.into();
        let messages = vec![ChatMessage::system(system_prompt.clone())];
        Self {
            system_prompt,
            messages,
        }
    }

    /// Returns the system instructions.
    #[inline]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Returns all messages, system instructions first.
    #[inline]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: ChatMessage) {
        self.messages.push(msg);
    }

    #[inline]
    pub(crate) fn extend(&mut self, msgs: impl IntoIterator<Item = ChatMessage>) {
        self.messages.extend(msgs);
    }

    /// Drops everything but a fresh copy of the system instructions.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.messages
            .push(ChatMessage::system(self.system_prompt.clone()));
    }
}
