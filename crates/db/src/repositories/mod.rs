//! Repositories wrapping the store queries.

pub mod community_message;

pub use community_message::{
    CommunityMessageRepository, CreateMessageInput, ListMessagesQuery, MessagePage,
    MessageSummary, MessageThread, MessageWithAuthor, ReportMessageInput,
};
