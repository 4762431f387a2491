//! Forwarded mutations: validate, pre-hook, dispatch.
//!
//! A veto returns `Ok(None)`; nothing is sent to the executor.

use serde_json::{Map, Value};

use itempiles_domain::{
    AttributeAmounts, DocumentUuid, InteractionId, ItemDelta, RemoveRequest, Resolvable,
    TokenOverrides, TransferRecord,
};
use itempiles_shared::{
    CreatePileData, HandlerName, HookName, HookPayload, PileRequest, PileResponse,
};

use crate::infrastructure::ports::RpcError;

use super::validation::{require_pile, validate_additions, validate_attributes, validate_removals};
use super::{ApiError, ItemPilesApi};

pub(super) fn unexpected(handler: HandlerName) -> ApiError {
    RpcError::UnexpectedResponse {
        handler: handler.as_str(),
    }
    .into()
}

fn item_records(
    response: PileResponse,
    handler: HandlerName,
) -> Result<Vec<TransferRecord>, ApiError> {
    match response {
        PileResponse::Items { records } => Ok(records),
        _ => Err(unexpected(handler)),
    }
}

fn attribute_records(
    response: PileResponse,
    handler: HandlerName,
) -> Result<AttributeAmounts, ApiError> {
    match response {
        PileResponse::Attributes { records } => Ok(records),
        _ => Err(unexpected(handler)),
    }
}

impl ItemPilesApi {
    // =========================================================================
    // Pile lifecycle
    // =========================================================================

    pub async fn create_pile(&self, data: CreatePileData) -> Result<Option<DocumentUuid>, ApiError> {
        validate_additions(&data.items, &self.schema().await?)?;
        let payload = self.payload(
            HookPayload {
                adding: data.items.clone(),
                data: data.pile_patch.clone(),
                ..HookPayload::default()
            },
            None,
        );
        if self.vetoed(HookName::PreCreate, &payload) {
            return Ok(None);
        }
        match self.privileged(PileRequest::CreatePile(data), None).await? {
            PileResponse::Created { uuid } => Ok(Some(uuid)),
            _ => Err(unexpected(HandlerName::CreatePile)),
        }
    }

    pub async fn turn_into_pile<R: Resolvable>(
        &self,
        targets: &[R],
        pile_patch: Map<String, Value>,
        token_overrides: TokenOverrides,
    ) -> Result<Option<Vec<DocumentUuid>>, ApiError> {
        let mut uuids = Vec::with_capacity(targets.len());
        for target in targets {
            uuids.push(self.document(target).await?.uuid);
        }
        let payload = self.payload(
            HookPayload {
                targets: uuids.clone(),
                data: pile_patch.clone(),
                ..HookPayload::default()
            },
            None,
        );
        if self.vetoed(HookName::PreTurnInto, &payload) {
            return Ok(None);
        }
        let request = PileRequest::TurnIntoPile {
            targets: uuids,
            pile_patch,
            token_overrides,
        };
        match self.privileged(request, None).await? {
            PileResponse::Converted { uuids } => Ok(Some(uuids)),
            _ => Err(unexpected(HandlerName::TurnIntoPile)),
        }
    }

    pub async fn revert_from_pile<R: Resolvable>(
        &self,
        targets: &[R],
        token_overrides: TokenOverrides,
    ) -> Result<Option<Vec<DocumentUuid>>, ApiError> {
        let mut uuids = Vec::with_capacity(targets.len());
        for target in targets {
            let document = self.document(target).await?;
            require_pile(&document)?;
            uuids.push(document.uuid);
        }
        let payload = self.payload(
            HookPayload {
                targets: uuids.clone(),
                ..HookPayload::default()
            },
            None,
        );
        if self.vetoed(HookName::PreRevertFrom, &payload) {
            return Ok(None);
        }
        let request = PileRequest::RevertFromPile {
            targets: uuids,
            token_overrides,
        };
        match self.privileged(request, None).await? {
            PileResponse::Converted { uuids } => Ok(Some(uuids)),
            _ => Err(unexpected(HandlerName::RevertFromPile)),
        }
    }

    /// Returns the keys that actually changed.
    pub async fn update_pile(
        &self,
        target: &impl Resolvable,
        patch: Map<String, Value>,
        interacting: Option<DocumentUuid>,
        token_overrides: TokenOverrides,
    ) -> Result<Option<Map<String, Value>>, ApiError> {
        let document = self.document(target).await?;
        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                interacting: interacting.clone(),
                data: patch.clone(),
                ..HookPayload::default()
            },
            None,
        );
        if self.vetoed(HookName::PreUpdate, &payload) {
            return Ok(None);
        }
        let request = PileRequest::UpdatePile {
            target: document.uuid,
            patch,
            interacting,
            token_overrides,
        };
        match self.privileged(request, None).await? {
            PileResponse::Updated { diff } => Ok(Some(diff)),
            _ => Err(unexpected(HandlerName::UpdatePile)),
        }
    }

    /// Returns false when vetoed.
    pub async fn delete_pile(&self, target: &impl Resolvable) -> Result<bool, ApiError> {
        let document = self.document(target).await?;
        require_pile(&document)?;
        let payload = self.payload(HookPayload::for_target(document.uuid.clone()), None);
        if self.vetoed(HookName::PreDelete, &payload) {
            return Ok(false);
        }
        self.privileged(
            PileRequest::DeletePile {
                target: document.uuid,
            },
            None,
        )
        .await?;
        Ok(true)
    }

    /// Returns true when the token's appearance changed.
    pub async fn refresh_pile(&self, target: &impl Resolvable) -> Result<bool, ApiError> {
        let request = PileRequest::RefreshPile {
            target: target.to_uuid(),
        };
        match self.privileged(request, None).await? {
            PileResponse::Refreshed { changed } => Ok(changed),
            _ => Err(unexpected(HandlerName::RefreshPile)),
        }
    }

    // =========================================================================
    // Items
    // =========================================================================

    pub async fn add_items(
        &self,
        target: &impl Resolvable,
        items: Vec<ItemDelta>,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<Vec<TransferRecord>>, ApiError> {
        let document = self.document(target).await?;
        validate_additions(&items, &self.schema().await?)?;
        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                adding: items.clone(),
                ..HookPayload::default()
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreAddItems, &payload) {
            return Ok(None);
        }
        let request = PileRequest::AddItems {
            target: document.uuid,
            items,
        };
        let response = self.privileged(request, interaction_id).await?;
        item_records(response, HandlerName::AddItems).map(Some)
    }

    pub async fn remove_items(
        &self,
        target: &impl Resolvable,
        items: Vec<RemoveRequest>,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<Vec<TransferRecord>>, ApiError> {
        let document = self.document(target).await?;
        validate_removals(&document, &items, &self.schema().await?)?;
        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                removing: items.clone(),
                ..HookPayload::default()
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreRemoveItems, &payload) {
            return Ok(None);
        }
        let request = PileRequest::RemoveItems {
            target: document.uuid,
            items,
        };
        let response = self.privileged(request, interaction_id).await?;
        item_records(response, HandlerName::RemoveItems).map(Some)
    }

    /// Returns what the target received.
    pub async fn transfer_items(
        &self,
        source: &impl Resolvable,
        target: &impl Resolvable,
        items: Vec<RemoveRequest>,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<Vec<TransferRecord>>, ApiError> {
        let source = self.document(source).await?;
        let target = self.document(target).await?;
        validate_removals(&source, &items, &self.schema().await?)?;
        let payload = self.payload(
            HookPayload {
                removing: items.clone(),
                ..HookPayload::between(source.uuid.clone(), target.uuid.clone())
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreTransferItems, &payload) {
            return Ok(None);
        }
        let request = PileRequest::TransferItems {
            source: source.uuid,
            target: target.uuid,
            items,
        };
        let response = self.privileged(request, interaction_id).await?;
        item_records(response, HandlerName::TransferItems).map(Some)
    }

    /// `item_type_filters` of `None` uses the source pile's filters.
    pub async fn transfer_all_items(
        &self,
        source: &impl Resolvable,
        target: &impl Resolvable,
        item_type_filters: Option<Vec<String>>,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<Vec<TransferRecord>>, ApiError> {
        let source = self.document(source).await?;
        let target = self.document(target).await?;
        let payload = self.payload(
            HookPayload::between(source.uuid.clone(), target.uuid.clone()),
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreTransferAllItems, &payload) {
            return Ok(None);
        }
        let request = PileRequest::TransferAllItems {
            source: source.uuid,
            target: target.uuid,
            item_type_filters,
        };
        let response = self.privileged(request, interaction_id).await?;
        item_records(response, HandlerName::TransferAllItems).map(Some)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Returns the new totals.
    pub async fn add_attributes(
        &self,
        target: &impl Resolvable,
        attributes: AttributeAmounts,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<AttributeAmounts>, ApiError> {
        let document = self.document(target).await?;
        validate_attributes(&document, &attributes)?;
        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                attributes: attributes.clone(),
                ..HookPayload::default()
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreAddAttributes, &payload) {
            return Ok(None);
        }
        let request = PileRequest::AddAttributes {
            target: document.uuid,
            attributes,
        };
        let response = self.privileged(request, interaction_id).await?;
        attribute_records(response, HandlerName::AddAttributes).map(Some)
    }

    /// Returns the amounts actually removed.
    pub async fn remove_attributes(
        &self,
        target: &impl Resolvable,
        attributes: AttributeAmounts,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<AttributeAmounts>, ApiError> {
        let document = self.document(target).await?;
        validate_attributes(&document, &attributes)?;
        let payload = self.payload(
            HookPayload {
                target: Some(document.uuid.clone()),
                attributes: attributes.clone(),
                ..HookPayload::default()
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreRemoveAttributes, &payload) {
            return Ok(None);
        }
        let request = PileRequest::RemoveAttributes {
            target: document.uuid,
            attributes,
        };
        let response = self.privileged(request, interaction_id).await?;
        attribute_records(response, HandlerName::RemoveAttributes).map(Some)
    }

    /// Returns the amounts moved.
    pub async fn transfer_attributes(
        &self,
        source: &impl Resolvable,
        target: &impl Resolvable,
        attributes: AttributeAmounts,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<AttributeAmounts>, ApiError> {
        let source = self.document(source).await?;
        let target = self.document(target).await?;
        validate_attributes(&source, &attributes)?;
        let payload = self.payload(
            HookPayload {
                attributes: attributes.clone(),
                ..HookPayload::between(source.uuid.clone(), target.uuid.clone())
            },
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreTransferAttributes, &payload) {
            return Ok(None);
        }
        let request = PileRequest::TransferAttributes {
            source: source.uuid,
            target: target.uuid,
            attributes,
        };
        let response = self.privileged(request, interaction_id).await?;
        attribute_records(response, HandlerName::TransferAttributes).map(Some)
    }

    pub async fn transfer_all_attributes(
        &self,
        source: &impl Resolvable,
        target: &impl Resolvable,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<AttributeAmounts>, ApiError> {
        let source = self.document(source).await?;
        let target = self.document(target).await?;
        let payload = self.payload(
            HookPayload::between(source.uuid.clone(), target.uuid.clone()),
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreTransferAllAttributes, &payload) {
            return Ok(None);
        }
        let request = PileRequest::TransferAllAttributes {
            source: source.uuid,
            target: target.uuid,
        };
        let response = self.privileged(request, interaction_id).await?;
        attribute_records(response, HandlerName::TransferAllAttributes).map(Some)
    }

    pub async fn transfer_everything(
        &self,
        source: &impl Resolvable,
        target: &impl Resolvable,
        item_type_filters: Option<Vec<String>>,
        interaction_id: Option<InteractionId>,
    ) -> Result<Option<(Vec<TransferRecord>, AttributeAmounts)>, ApiError> {
        let source = self.document(source).await?;
        let target = self.document(target).await?;
        let payload = self.payload(
            HookPayload::between(source.uuid.clone(), target.uuid.clone()),
            interaction_id.as_ref(),
        );
        if self.vetoed(HookName::PreTransferEverything, &payload) {
            return Ok(None);
        }
        let request = PileRequest::TransferEverything {
            source: source.uuid,
            target: target.uuid,
            item_type_filters,
        };
        match self.privileged(request, interaction_id).await? {
            PileResponse::Everything { items, attributes } => Ok(Some((items, attributes))),
            _ => Err(unexpected(HandlerName::TransferEverything)),
        }
    }
}
