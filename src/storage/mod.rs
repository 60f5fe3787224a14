pub mod discussion_doc;
pub mod store;

pub use discussion_doc::{DiscussionDocument, ItemDiscussion};
pub use store::{merge, Store, StoreFile, StoreLocation};
