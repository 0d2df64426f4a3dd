//! Model context window registry.
//!
//! Maps model names to context window sizes. The registry is an ordinary value
//! that callers construct and share (usually behind an `Arc`); registration and
//! lookup are safe from any number of threads.

use dashmap::DashMap;

/// Known model context window sizes, seeded into every registry built with
/// [`ContextWindowRegistry::with_defaults`].
pub const KNOWN_CONTEXT_WINDOWS: &[(&str, u32)] = &[
    // OpenAI models
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-4-turbo", 128_000),
    ("gpt-4.1", 1_047_576),
    ("gpt-4", 8_192),
    ("gpt-3.5-turbo", 16_385),
    ("o1", 200_000),
    ("o3", 200_000),
    ("o4-mini", 200_000),
    // Anthropic models
    ("claude-3-5-sonnet", 200_000),
    ("claude-3-5-haiku", 200_000),
    ("claude-3-opus", 200_000),
    ("claude-3-sonnet", 200_000),
    ("claude-3-haiku", 200_000),
    ("claude-sonnet-4", 200_000),
    ("claude-opus-4", 200_000),
    // Google models
    ("gemini-1.5-pro", 2_097_152),
    ("gemini-1.5-flash", 1_048_576),
    ("gemini-2.0-flash", 1_048_576),
    // Open-weight models
    ("deepseek-chat", 64_000),
    ("llama3", 8_192),
    ("qwen2.5", 32_768),
];

/// Window used when nothing matches.
pub const DEFAULT_CONTEXT_WINDOW: u32 = 128_000;

/// Concurrency-safe name → context window store.
#[derive(Debug)]
pub struct ContextWindowRegistry {
    windows: DashMap<String, u32>,
    fallback: u32,
}

impl ContextWindowRegistry {
    /// Empty registry; every lookup resolves to `fallback`.
    pub fn empty(fallback: u32) -> Self {
        Self {
            windows: DashMap::new(),
            fallback,
        }
    }

    /// Registry seeded with [`KNOWN_CONTEXT_WINDOWS`].
    pub fn with_defaults() -> Self {
        let registry = Self::empty(DEFAULT_CONTEXT_WINDOW);
        for (name, size) in KNOWN_CONTEXT_WINDOWS {
            registry.register(*name, *size);
        }
        registry
    }

    /// Add or replace the window for `name`.
    pub fn register(&self, name: impl Into<String>, size: u32) {
        let name = name.into();
        tracing::debug!("Registering context window {} = {}", name, size);
        self.windows.insert(name, size);
    }

    /// Context window for `model`.
    ///
    /// # Matching Strategy
    /// 1. Exact match
    /// 2. Longest registered name contained in the model name
    ///    (e.g. "gpt-4o-2024-08-06" matches "gpt-4o")
    /// 3. The registry fallback
    pub fn resolve(&self, model: &str) -> u32 {
        if let Some(size) = self.windows.get(model) {
            return *size;
        }

        self.windows
            .iter()
            .filter(|entry| model.contains(entry.key().as_str()))
            .max_by(|a, b| {
                a.key()
                    .len()
                    .cmp(&b.key().len())
                    .then_with(|| b.key().cmp(a.key()))
            })
            .map(|entry| *entry.value())
            .unwrap_or(self.fallback)
    }

    pub fn fallback(&self) -> u32 {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

impl Default for ContextWindowRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn defaults_contain_common_models() {
        let registry = ContextWindowRegistry::with_defaults();
        assert_eq!(registry.resolve("gpt-4o"), 128_000);
        assert_eq!(registry.resolve("gpt-4"), 8_192);
        assert_eq!(registry.len(), KNOWN_CONTEXT_WINDOWS.len());
    }

    #[test]
    fn resolves_by_longest_contained_name() {
        let registry = ContextWindowRegistry::with_defaults();
        // contains both "gpt-4" and "gpt-4o"
        assert_eq!(registry.resolve("gpt-4o-2024-08-06"), 128_000);
        assert_eq!(registry.resolve("claude-3-5-sonnet-20241022"), 200_000);
        assert_eq!(registry.resolve("openrouter/gpt-4-0613"), 8_192);
    }

    #[test]
    fn unknown_model_uses_fallback() {
        let registry = ContextWindowRegistry::with_defaults();
        assert_eq!(registry.resolve("unknown-model-xyz"), DEFAULT_CONTEXT_WINDOW);

        let registry = ContextWindowRegistry::empty(4_096);
        assert!(registry.is_empty());
        assert_eq!(registry.resolve("gpt-4o"), 4_096);
    }

    #[test]
    fn register_overrides_default() {
        let registry = ContextWindowRegistry::with_defaults();
        registry.register("gpt-4o", 64_000);
        assert_eq!(registry.resolve("gpt-4o"), 64_000);
        assert_eq!(registry.resolve("gpt-4o-mini"), 128_000);
    }

    #[test]
    fn concurrent_register_and_resolve() {
        let registry = Arc::new(ContextWindowRegistry::with_defaults());

        let handles: Vec<_> = (0..8u32)
            .map(|i| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for j in 0..100u32 {
                        registry.register(format!("model-{i}-{j}"), 1_000 + j);
                        assert_eq!(registry.resolve("gpt-4o"), 128_000);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.resolve("model-7-99"), 1_099);
        assert_eq!(registry.len(), KNOWN_CONTEXT_WINDOWS.len() + 800);
    }
}
