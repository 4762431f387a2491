//! Attribute mutations: numeric pools such as currencies.

use std::sync::Arc;

use itempiles_domain::reconcile::{
    all_transferable_attributes, plan_add_attributes, plan_remove_attributes,
    transferable_attributes,
};
use itempiles_domain::{AttributeAmounts, DocumentUuid};
use itempiles_shared::{HookName, HookPayload};

use crate::entities::Piles;
use crate::infrastructure::ports::MacroAction;

use super::side_effects::{MacroRun, SideEffects};
use super::{CallContext, CoordinatorError, Scope};

pub struct AddAttributes {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl AddAttributes {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    /// Returns the new totals of the touched attributes.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        target: &DocumentUuid,
        attributes: AttributeAmounts,
        scope: Scope,
    ) -> Result<AttributeAmounts, CoordinatorError> {
        let document = self.piles.get(target).await?;
        let plan = plan_add_attributes(&document.system, &attributes);
        if plan.is_empty() {
            tracing::debug!(pile = %target, "No attributes to add");
            return Ok(AttributeAmounts::new());
        }
        self.piles.apply_attributes(target, &plan).await?;
        tracing::info!(pile = %target, attributes = plan.records.len(), "Attributes added");

        self.effects
            .call_hook(
                HookName::AddAttributes,
                ctx.payload(HookPayload {
                    target: Some(target.clone()),
                    attributes: plan.records.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;
        self.effects.rerender_inventory(target, false).await;

        if scope.is_standalone() {
            let macro_result = self
                .effects
                .run_macro(
                    &document,
                    ctx,
                    MacroRun::new(MacroAction::AddAttributes)
                        .target(&document)
                        .attributes(&plan.records),
                )
                .await;
            self.effects.refresh(target).await?;
            macro_result?;
        }
        Ok(plan.records)
    }
}

pub struct RemoveAttributes {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
}

impl RemoveAttributes {
    pub fn new(piles: Arc<Piles>, effects: Arc<SideEffects>) -> Self {
        Self { piles, effects }
    }

    /// Returns the amounts actually removed; values clamp at zero.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        target: &DocumentUuid,
        attributes: AttributeAmounts,
        scope: Scope,
    ) -> Result<AttributeAmounts, CoordinatorError> {
        let document = self.piles.get(target).await?;
        let plan = plan_remove_attributes(&document.system, &attributes);
        if plan.is_empty() {
            tracing::debug!(pile = %target, "No attributes to remove");
            return Ok(AttributeAmounts::new());
        }
        self.piles.apply_attributes(target, &plan).await?;
        tracing::info!(pile = %target, attributes = plan.records.len(), "Attributes removed");

        self.effects
            .call_hook(
                HookName::RemoveAttributes,
                ctx.payload(HookPayload {
                    target: Some(target.clone()),
                    attributes: plan.records.clone(),
                    ..HookPayload::default()
                }),
            )
            .await;
        self.effects.rerender_inventory(target, false).await;

        if scope.is_standalone() {
            let macro_result = self
                .effects
                .run_macro(
                    &document,
                    ctx,
                    MacroRun::new(MacroAction::RemoveAttributes)
                        .target(&document)
                        .attributes(&plan.records),
                )
                .await;
            self.effects.finish_source(target, ctx).await?;
            macro_result?;
        }
        Ok(plan.records)
    }
}

/// Move attribute amounts between documents. Only attributes that are
/// positive on the source and present on the target move.
pub struct TransferAttributes {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    add: Arc<AddAttributes>,
    remove: Arc<RemoveAttributes>,
}

impl TransferAttributes {
    pub fn new(
        piles: Arc<Piles>,
        effects: Arc<SideEffects>,
        add: Arc<AddAttributes>,
        remove: Arc<RemoveAttributes>,
    ) -> Self {
        Self {
            piles,
            effects,
            add,
            remove,
        }
    }

    /// Returns the amounts moved.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        attributes: AttributeAmounts,
    ) -> Result<AttributeAmounts, CoordinatorError> {
        let source_doc = self.piles.get(source).await?;
        let target_doc = self.piles.get(target).await?;
        let movable = transferable_attributes(&source_doc.system, &target_doc.system, &attributes);

        let moved = self.move_amounts(ctx, source, target, movable).await?;
        if moved.is_empty() {
            return Ok(moved);
        }
        tracing::info!(source = %source, target = %target, "Attributes transferred");

        self.effects
            .call_hook(
                HookName::TransferAttributes,
                ctx.payload(HookPayload {
                    attributes: moved.clone(),
                    ..HookPayload::between(source.clone(), target.clone())
                }),
            )
            .await;
        self.effects
            .finish_transfer(
                ctx,
                &source_doc,
                &target_doc,
                MacroRun::new(MacroAction::TransferAttributes).attributes(&moved),
            )
            .await?;
        Ok(moved)
    }

    /// Remove then add the confirmed amounts, both as transfer steps.
    pub(super) async fn move_amounts(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        amounts: AttributeAmounts,
    ) -> Result<AttributeAmounts, CoordinatorError> {
        if amounts.is_empty() {
            return Ok(amounts);
        }
        let removed = self.remove.execute(ctx, source, amounts, Scope::Step).await?;
        if !removed.is_empty() {
            self.add
                .execute(ctx, target, removed.clone(), Scope::Step)
                .await?;
        }
        Ok(removed)
    }
}

/// Move every configured attribute the source holds.
pub struct TransferAllAttributes {
    piles: Arc<Piles>,
    effects: Arc<SideEffects>,
    transfer: Arc<TransferAttributes>,
}

impl TransferAllAttributes {
    pub fn new(
        piles: Arc<Piles>,
        effects: Arc<SideEffects>,
        transfer: Arc<TransferAttributes>,
    ) -> Self {
        Self {
            piles,
            effects,
            transfer,
        }
    }

    pub async fn execute(
        &self,
        ctx: &CallContext,
        source: &DocumentUuid,
        target: &DocumentUuid,
        scope: Scope,
    ) -> Result<AttributeAmounts, CoordinatorError> {
        let source_doc = self.piles.get(source).await?;
        let target_doc = self.piles.get(target).await?;
        let settings = self.piles.settings().await?;

        let source_pile = source_doc.pile_data();
        let configured = source_pile.effective_attributes(&settings.dynamic_attributes);
        let movable = all_transferable_attributes(&source_doc.system, &target_doc.system, configured);
        if movable.is_empty() {
            tracing::debug!(source = %source, "No transferable attributes");
            return Ok(movable);
        }

        let moved = self
            .transfer
            .move_amounts(ctx, source, target, movable)
            .await?;
        tracing::info!(source = %source, target = %target, "All attributes transferred");

        if scope.is_standalone() && !moved.is_empty() {
            self.effects
                .call_hook(
                    HookName::TransferAllAttributes,
                    ctx.payload(HookPayload {
                        attributes: moved.clone(),
                        ..HookPayload::between(source.clone(), target.clone())
                    }),
                )
                .await;
            self.effects
                .finish_transfer(
                    ctx,
                    &source_doc,
                    &target_doc,
                    MacroRun::new(MacroAction::TransferAllAttributes).attributes(&moved),
                )
                .await?;
        }
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{
        MockDocumentStore, MockMacroPort, MockRpcPort, MockSettingsRepo, MockTokenImagePort,
    };
    use itempiles_domain::{AttributePath, PileDocument, TokenAppearance, UserId};
    use serde_json::{json, Value};

    fn ctx() -> CallContext {
        CallContext::new(UserId::new("gm").unwrap(), None)
    }

    fn gold() -> AttributePath {
        AttributePath::parse("currency.gold").unwrap()
    }

    fn actor(uuid: &str, system: Value) -> PileDocument {
        PileDocument {
            uuid: DocumentUuid::parse(uuid).unwrap(),
            name: "Bob".into(),
            img: None,
            appearance: TokenAppearance::default(),
            position: None,
            actor_id: None,
            actor_link: true,
            pile: None,
            items: vec![],
            system,
        }
    }

    fn build(store: MockDocumentStore) -> (Arc<Piles>, Arc<SideEffects>) {
        let mut settings = MockSettingsRepo::new();
        settings.expect_get_global().returning(|| Ok(None));
        let mut rpc = MockRpcPort::new();
        rpc.expect_execute_for_everyone().returning(|_| Ok(()));
        let piles = Arc::new(Piles::new(Arc::new(store), Arc::new(settings)));
        let effects = Arc::new(SideEffects::new(
            piles.clone(),
            Arc::new(rpc),
            Arc::new(MockMacroPort::new()),
            Arc::new(MockTokenImagePort::new()),
        ));
        (piles, effects)
    }

    #[tokio::test]
    async fn when_adding_gold_returns_new_total() {
        let document = actor("Actor.bob", json!({"currency": {"gold": 10}}));
        let mut store = MockDocumentStore::new();
        let stored = document.clone();
        store
            .expect_get()
            .returning(move |_| Ok(Some(stored.clone())));
        store
            .expect_write_attributes()
            .withf(|_, values| values.get(&gold()) == Some(&15.0))
            .times(1)
            .returning(|_, _| Ok(()));

        let (piles, effects) = build(store);
        let use_case = AddAttributes::new(piles, effects);
        let mut request = AttributeAmounts::new();
        request.insert(gold(), 5.0);

        let totals = use_case
            .execute(&ctx(), &document.uuid, request, Scope::Standalone)
            .await
            .unwrap();
        assert_eq!(totals.get(&gold()), Some(&15.0));
    }

    #[tokio::test]
    async fn when_removing_more_than_held_returns_actual_amount() {
        let document = actor("Actor.bob", json!({"currency": {"gold": 3}}));
        let mut store = MockDocumentStore::new();
        let stored = document.clone();
        store
            .expect_get()
            .returning(move |_| Ok(Some(stored.clone())));
        store
            .expect_write_attributes()
            .withf(|_, values| values.get(&gold()) == Some(&0.0))
            .times(1)
            .returning(|_, _| Ok(()));

        let (piles, effects) = build(store);
        let use_case = RemoveAttributes::new(piles, effects);
        let mut request = AttributeAmounts::new();
        request.insert(gold(), 10.0);

        let removed = use_case
            .execute(&ctx(), &document.uuid, request, Scope::Standalone)
            .await
            .unwrap();
        assert_eq!(removed.get(&gold()), Some(&3.0));
    }

    #[tokio::test]
    async fn when_target_lacks_attribute_transfer_moves_nothing() {
        let source = actor("Actor.bob", json!({"currency": {"gold": 10}}));
        let target = actor("Actor.chest", json!({}));
        let mut store = MockDocumentStore::new();
        let (s, t) = (source.clone(), target.clone());
        store.expect_get().returning(move |uuid| {
            Ok(Some(if uuid == &s.uuid { s.clone() } else { t.clone() }))
        });
        store.expect_write_attributes().never();

        let (piles, effects) = build(store);
        let add = Arc::new(AddAttributes::new(piles.clone(), effects.clone()));
        let remove = Arc::new(RemoveAttributes::new(piles.clone(), effects.clone()));
        let use_case = TransferAttributes::new(piles, effects, add, remove);
        let mut request = AttributeAmounts::new();
        request.insert(gold(), 5.0);

        let moved = use_case
            .execute(&ctx(), &source.uuid, &target.uuid, request)
            .await
            .unwrap();
        assert!(moved.is_empty());
    }
}
