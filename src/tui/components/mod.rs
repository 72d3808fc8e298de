//! # TUI Components
//!
//! ## Component Architecture
//!
//! Components follow two patterns:
//!
//! ### Stateless Components (Props-Based Rendering)
//!
//! - `TitleBar`: model name and the current notice
//! - `Spinner`: busy indicator while a reply is pending
//!
//! ### Stateful Components (Event-Driven)
//!
//! - `InputBox`: message editor, emits `InputEvent`
//! - `Transcript`: scrollable conversation view (`TranscriptState`)
//! - `HistoryList`: saved conversations with a filter (`HistoryListState`),
//!   emits `HistoryEvent`
//!
//! Persistent state lives in `TuiState`; the render wrappers are created
//! per frame with props borrowed from the core `App`.
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── spinner.rs
//! ├── transcript.rs
//! ├── history_list.rs
//! └── input_box/
//! ```

mod title_bar;
pub use title_bar::TitleBar;

pub mod history_list;
pub mod input_box;
pub mod spinner;
pub mod transcript;
pub use history_list::{HistoryEvent, HistoryList, HistoryListState, ListEntry};
pub use input_box::{InputBox, InputEvent};
pub use spinner::{Spinner, SpinnerState};
pub use transcript::{Transcript, TranscriptState};
