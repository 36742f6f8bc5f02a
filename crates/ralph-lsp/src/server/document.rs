//! Open-document tracking.

use ropey::Rope;

/// A document the editor currently has open.
#[derive(Debug, Clone)]
pub struct Document {
    /// Current text, as a rope: cheap clones and edits at any position.
    pub content: Rope,

    /// Version from the editor, incremented on every change. Used to spot
    /// out-of-order updates.
    pub version: i32,
}
