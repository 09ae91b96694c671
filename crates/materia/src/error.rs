//! Error taxonomy for scene construction, loading and hydration.
//!
//! Only [`SceneError::MalformedDocument`] (and the I/O wrappers used by the
//! file helpers) fail a whole load. Everything else is contained at the
//! entity or component it concerns: the loader logs it, records it in a
//! [`LoadReport`](crate::scene::LoadReport) and carries on.

use crate::ecs::EntityId;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("entity {entity}: unknown component type '{type_name}'")]
    UnknownComponentType { entity: EntityId, type_name: String },

    #[error("entity {entity}: no custom component definition named '{definition}'")]
    UnresolvedCustomComponentDefinition { entity: EntityId, definition: String },

    #[error("cannot make {child} a child of {parent}: {child} is an ancestor of {parent}")]
    CyclicOwnership { parent: EntityId, child: EntityId },

    #[error("entity {entity}: failed to load '{path}': {reason}")]
    ResourceLoadFailure {
        entity: EntityId,
        path: String,
        reason: String,
    },

    #[error("materia record {index}: {message}; record skipped")]
    InvalidEntityRecord { index: usize, message: String },

    #[error("scene has run out of entity ids")]
    IdsExhausted,

    #[error("malformed scene document: {0}")]
    MalformedDocument(String),

    #[error("entity {0} does not exist")]
    EntityNotFound(EntityId),

    #[error("entity {entity}: invalid '{type_name}' data: {message}")]
    InvalidComponentData {
        entity: EntityId,
        type_name: String,
        message: String,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Whether the loader can skip past this error and keep going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SceneError::MalformedDocument(_)
                | SceneError::IdsExhausted
                | SceneError::Json(_)
                | SceneError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = SceneError::UnknownComponentType {
            entity: EntityId(7),
            type_name: "DoesNotExist".into(),
        };
        assert_eq!(err.to_string(), "entity #7: unknown component type 'DoesNotExist'");
        assert!(err.is_recoverable());
        assert!(!SceneError::MalformedDocument("no materias".into()).is_recoverable());
        assert!(!SceneError::IdsExhausted.is_recoverable());

        let skipped = SceneError::InvalidEntityRecord { index: 2, message: "no usable id".into() };
        assert_eq!(skipped.to_string(), "materia record 2: no usable id; record skipped");
        assert!(skipped.is_recoverable());
    }
}
