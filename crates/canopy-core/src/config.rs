use crate::vnode::ElementType;

/// Tunables for an [`Engine`](crate::Engine).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Run a structural comparison whenever two structural hashes match.
    ///
    /// Hash equality alone decides "unchanged" by default; a 64-bit collision
    /// then skips an update. With this flag a collision degrades into a full
    /// patch instead, at the cost of a deep compare on every reuse.
    pub verify_hash_matches: bool,
    /// Element type constructed for placeholders.
    pub placeholder_type: ElementType,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            verify_hash_matches: false,
            placeholder_type: ElementType::VIEW,
        }
    }
}

impl EngineConfig {
    pub fn with_verify_hash_matches(mut self, verify: bool) -> Self {
        self.verify_hash_matches = verify;
        self
    }

    pub fn with_placeholder_type(mut self, ty: ElementType) -> Self {
        self.placeholder_type = ty;
        self
    }
}
