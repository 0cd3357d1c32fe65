use std::sync::Arc;
use std::time::Duration;

use crate::errors::ProviderError;
use crate::registry::EngineRegistry;
use crate::{claude_code::ClaudeCodeEngine, ReviewEngine};

#[test]
fn test_builtin_engines_resolve() {
    let registry =
        EngineRegistry::with_builtin_engines("claude", "codex", Duration::from_secs(60));

    assert!(registry.resolve("claude_code").is_ok());
    assert!(registry.resolve("codex_cli").is_ok());
    assert_eq!(
        registry.engine_names(),
        vec!["claude_code".to_string(), "codex_cli".to_string()]
    );
}

#[test]
fn test_unknown_engine_fails_with_available_names() {
    let registry =
        EngineRegistry::with_builtin_engines("claude", "codex", Duration::from_secs(60));

    let result = registry.resolve("no_such_engine");

    match result {
        Err(ProviderError::UnknownEngine { name, available }) => {
            assert_eq!(name, "no_such_engine");
            assert_eq!(available.len(), 2);
        }
        other => panic!("Expected UnknownEngine, got {:?}", other.map(|e| e.name())),
    }
}

#[test]
fn test_registering_same_name_replaces_factory() {
    let mut registry = EngineRegistry::new();
    registry.register("custom", || Arc::new(ClaudeCodeEngine::new("first")));
    registry.register("custom", || Arc::new(ClaudeCodeEngine::new("second")));

    assert_eq!(registry.engine_names(), vec!["custom".to_string()]);
    assert!(registry.resolve("custom").is_ok());
}

#[test]
fn test_resolution_builds_a_fresh_instance_per_call() {
    let registry =
        EngineRegistry::with_builtin_engines("claude", "codex", Duration::from_secs(60));

    let a = registry.resolve("claude_code").unwrap();
    let b = registry.resolve("claude_code").unwrap();

    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.name(), b.name());
}
