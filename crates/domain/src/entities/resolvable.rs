//! Anything a caller can point at a pile with.
//!
//! Callers hand the API a placed token, a fetched token document, an actor,
//! or a raw uuid. Each adapter resolves to the single reference type the
//! coordinator consumes.

use itempiles_domain::{ActorId, DocumentKind, DocumentUuid, PileDocument, SceneId, TokenId};

pub trait Resolvable {
    /// The document the coordinator reads and writes.
    fn to_uuid(&self) -> DocumentUuid;

    /// The world actor behind the reference, when one is known.
    fn to_actor_ref(&self) -> Option<ActorId>;

    fn document_kind(&self) -> DocumentKind {
        self.to_uuid().kind()
    }
}

/// A token placed on a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef {
    pub scene: SceneId,
    pub token: TokenId,
    pub actor: Option<ActorId>,
}

impl Resolvable for TokenRef {
    fn to_uuid(&self) -> DocumentUuid {
        DocumentUuid::for_token(&self.scene, &self.token)
    }

    fn to_actor_ref(&self) -> Option<ActorId> {
        self.actor.clone()
    }
}

/// A token document the caller already fetched.
#[derive(Debug, Clone, Copy)]
pub struct TokenDocumentRef<'a>(pub &'a PileDocument);

impl Resolvable for TokenDocumentRef<'_> {
    fn to_uuid(&self) -> DocumentUuid {
        self.0.uuid.clone()
    }

    fn to_actor_ref(&self) -> Option<ActorId> {
        self.0.actor_id.clone()
    }
}

/// A world actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRef(pub ActorId);

impl Resolvable for ActorRef {
    fn to_uuid(&self) -> DocumentUuid {
        DocumentUuid::for_actor(&self.0)
    }

    fn to_actor_ref(&self) -> Option<ActorId> {
        Some(self.0.clone())
    }
}

impl Resolvable for DocumentUuid {
    fn to_uuid(&self) -> DocumentUuid {
        self.clone()
    }

    fn to_actor_ref(&self) -> Option<ActorId> {
        match self.kind() {
            DocumentKind::Actor => self
                .owner()
                .as_str()
                .strip_prefix("Actor.")
                .and_then(|id| ActorId::new(id).ok()),
            DocumentKind::Token => None,
        }
    }
}

impl<T: Resolvable + ?Sized> Resolvable for &T {
    fn to_uuid(&self) -> DocumentUuid {
        (**self).to_uuid()
    }

    fn to_actor_ref(&self) -> Option<ActorId> {
        (**self).to_actor_ref()
    }
}
