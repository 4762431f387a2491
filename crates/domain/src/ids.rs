use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a host identifier, rejecting blank values.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(concat!(
                        stringify!($name),
                        " cannot be empty"
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Host document IDs (the short id inside a uuid)
define_id!(SceneId);
define_id!(TokenId);
define_id!(ActorId);
define_id!(ItemId);

// Participants
define_id!(UserId);

// Caller-supplied correlation token, passed through untouched
define_id!(InteractionId);

/// Document types that can appear as a segment of a [`DocumentUuid`].
const DOCUMENT_TYPES: &[&str] = &["Scene", "Token", "Actor", "Item"];

/// Opaque host reference such as `Scene.abc.Token.def` or `Actor.xyz`.
///
/// A uuid is a sequence of `Type.id` pairs. Only the pair shapes the
/// coordinator can act on are accepted: a world actor, a token inside a
/// scene, or an embedded item of either.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentUuid(String);

/// What kind of document a [`DocumentUuid`] points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    Token,
    Actor,
}

impl DocumentUuid {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let parts: Vec<&str> = value.split('.').collect();
        if parts.len() < 2 || parts.len() % 2 != 0 {
            return Err(DomainError::invalid_id(format!(
                "malformed document uuid: {value:?}"
            )));
        }
        for pair in parts.chunks(2) {
            let (doc_type, id) = (pair[0], pair[1]);
            if !DOCUMENT_TYPES.contains(&doc_type) {
                return Err(DomainError::invalid_id(format!(
                    "unknown document type {doc_type:?} in uuid {value:?}"
                )));
            }
            if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
                return Err(DomainError::invalid_id(format!(
                    "invalid id segment {id:?} in uuid {value:?}"
                )));
            }
        }
        let shape: Vec<&str> = parts.iter().step_by(2).copied().collect();
        match shape.as_slice() {
            ["Actor"] | ["Scene", "Token"] | ["Actor", "Item"] | ["Scene", "Token", "Item"] => {
                Ok(Self(value.to_string()))
            }
            _ => Err(DomainError::invalid_id(format!(
                "unsupported document uuid: {value:?}"
            ))),
        }
    }

    pub fn for_token(scene: &SceneId, token: &TokenId) -> Self {
        Self(format!("Scene.{scene}.Token.{token}"))
    }

    pub fn for_actor(actor: &ActorId) -> Self {
        Self(format!("Actor.{actor}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn segments(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }

    /// Kind of the top-level document (embedded item uuids report their owner).
    pub fn kind(&self) -> DocumentKind {
        match self.segments().first() {
            Some(&"Scene") => DocumentKind::Token,
            _ => DocumentKind::Actor,
        }
    }

    pub fn scene_id(&self) -> Option<SceneId> {
        let segments = self.segments();
        match segments.as_slice() {
            ["Scene", scene, ..] => SceneId::new(*scene).ok(),
            _ => None,
        }
    }

    pub fn embedded_item(&self) -> Option<ItemId> {
        let segments = self.segments();
        match segments.as_slice() {
            [.., "Item", id] => ItemId::new(*id).ok(),
            _ => None,
        }
    }

    /// The owning document, for an embedded item uuid. Returns itself otherwise.
    pub fn owner(&self) -> DocumentUuid {
        let segments = self.segments();
        match segments.as_slice() {
            [head @ .., "Item", _] => Self(head.join(".")),
            _ => self.clone(),
        }
    }
}

impl fmt::Display for DocumentUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for DocumentUuid {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentUuid> for String {
    fn from(value: DocumentUuid) -> Self {
        value.0
    }
}

impl std::str::FromStr for DocumentUuid {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
