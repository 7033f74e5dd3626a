//! Core chat client components
//!
//! This module contains the conversation state machine and the dispatch of
//! questions to the answering service.

mod dispatch;
mod session;

#[cfg(test)]
mod proptests;

pub use dispatch::{Dispatcher, InFlight, Settlement};
pub use session::{
    fallback_message, ConversationSession, RequestState, SessionOptions, SessionView, ViewEntry,
    FALLBACK_MESSAGE,
};
