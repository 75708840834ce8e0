pub mod ai;
pub mod conversation;
pub mod dialogue;
pub mod extractor;
pub mod normalizer;
pub mod reconcile;
pub mod sessions;
pub mod slots;
