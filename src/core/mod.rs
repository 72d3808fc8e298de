//! # Core Application Logic
//!
//! This module contains termchat's business logic.
//! It knows nothing about any specific UI technology.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • State (app data)     │
//!                    │  • Action (events)      │
//!                    │  • update() (reducer)   │
//!                    │                         │
//!                    │  No terminal. No HTTP.  │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┼───────────────────┐
//!            ▼                   ▼                   ▼
//!     ┌────────────┐      ┌────────────┐      ┌────────────┐
//!     │    TUI     │      │   Store    │      │ Inference  │
//!     │  Adapter   │      │ (ChatStore)│      │ (provider) │
//!     │ (ratatui)  │      │            │      │            │
//!     └────────────┘      └────────────┘      └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`conversation`]: `ConversationLog`, `Message`, title derivation
//! - [`history`]: the summaries shown in the history list
//! - [`store`]: the `ChatStore` persistence port and its JSON implementation
//! - [`request`]: request truncation and the background completion task
//! - [`state`]: the `App` struct, all controller state in one place
//! - [`action`]: the `Action` enum and the `update()` state machine
//! - [`view`]: pane layout and render-ready projections of `App`
//! - [`config`]: layered configuration

pub mod action;
pub mod config;
pub mod conversation;
pub mod history;
pub mod request;
pub mod state;
pub mod store;
pub mod view;
