use thiserror::Error;

use crate::model::EntityId;

/// Errors raised while turning a snapshot into source text. Every variant
/// carries enough identifiers to locate the offending record; none of them
/// is ever skipped or auto-corrected.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("schema violation: {detail}")]
    SchemaViolation { detail: String },

    #[error("{entity} property '{property}': dangling reference to {target}")]
    DanglingReference {
        entity: String,
        property: String,
        target: String,
    },

    #[error("screen {screen}: widget {widget} is part of a parent cycle")]
    CyclicHierarchy { screen: EntityId, widget: EntityId },

    #[error("screen {screen}: widget {widget} has parent {parent} on another screen")]
    CrossScreenReference {
        screen: EntityId,
        widget: EntityId,
        parent: EntityId,
    },

    #[error("screen {screen}: expected exactly one root widget, found {count}")]
    MultipleRoots { screen: EntityId, count: usize },

    #[error("widget {widget}: unsupported widget type '{kind}'")]
    UnsupportedWidgetType { widget: EntityId, kind: String },

    #[error("widget {widget} property '{property}': unsupported property type '{kind}'")]
    UnsupportedPropertyType {
        widget: EntityId,
        property: String,
        kind: String,
    },

    #[error("action {action} '{name}': unsupported action kind '{kind}'")]
    UnsupportedActionKind {
        action: EntityId,
        name: String,
        kind: String,
    },

    #[error("dependency conflict on '{package}': {existing} vs {declared}")]
    DependencyConflict {
        package: String,
        existing: String,
        declared: String,
    },

    #[error("template render failed: {0}")]
    Template(#[from] minijinja::Error),
}

/// Errors from the build submission client and status tracker.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("transport failure: {detail}")]
    Transport { detail: String },

    #[error("remote build failed: {detail}")]
    RemoteBuild { detail: String },

    #[error("invalid transition: {from} is terminal")]
    TerminalState { from: crate::build::BuildState },

    #[error("archive error: {0}")]
    Archive(String),
}
