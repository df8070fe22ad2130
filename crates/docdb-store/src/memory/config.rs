use docdb_db::SupportedFeatures;

#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Capabilities this store honors. Calls needing a disabled capability
    /// fail with `DbError::Unsupported` instead of running.
    pub features: SupportedFeatures,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            features: SupportedFeatures::all(),
        }
    }
}
