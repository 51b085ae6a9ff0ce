/// Conversation state machine and its collaborators
pub mod conversation;
/// Teloxide update handlers wiring events into the conversation
pub mod handlers;
/// Keyboard presenters and fixed option lists
pub mod keyboards;
/// Menu state and scratch-column encoding
pub mod menu;
/// User-facing message texts
pub mod strings;
