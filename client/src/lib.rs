//! Client flows for the Quadrangles image board.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two unrelated flows live here:
//! - `submit` uploads an image, creates a post referencing it, then navigates
//!   to the new post.
//! - `chat` holds one websocket open to a post's comment channel, appending
//!   every inbound text frame to a message log and sending input verbatim.
//!
//! Neither flow touches a UI directly. The surfaces they read and write are
//! passed in through the seams in `page`, so a terminal, a test recorder or a
//! browser binding can all drive the same code.

pub mod chat;
pub mod config;
pub mod page;
pub mod submit;

pub use chat::{ChatClient, ChatError, ChatReceiver, ChatSender};
pub use config::{ClientConfig, ConfigError};
pub use page::{FileUpload, MessageLog, Navigator, PostForm, StatusLine};
pub use submit::{FileId, PostId, SubmitError, Submitter};
