/// State management module
///
/// This module handles all library state, including:
/// - The blob store the images live in (store.rs)
/// - Shared data structures (data.rs)
/// - The ordered image collection and identity generation (collection.rs)
/// - The single-selection state machine (selection.rs)
/// - The one-shot continuity transition latch (transition.rs)
/// - The cross-session handoff of the in-memory sequence (handoff.rs)

pub mod collection;
pub mod data;
pub mod handoff;
pub mod selection;
pub mod store;
pub mod transition;
