//! Database entities.

pub mod community_message;
pub mod message_report;
pub mod user;

pub use community_message::Entity as CommunityMessage;
pub use message_report::Entity as MessageReport;
pub use user::Entity as User;
