//! Clicking a pile on the scene.
//!
//! The caller names the tokens the user may act through; nothing is read
//! from ambient selection state.

use itempiles_domain::{DocumentUuid, PileDocument, Resolvable};

use super::{ApiError, ItemPilesApi};

/// Tokens the clicking user controls or owns, in preference order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClickContext {
    pub candidates: Vec<DocumentUuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    NotAPile,
    TooFar,
    Rattled,
    /// Opening the container was vetoed
    Cancelled,
    ShowInventory { interacting: Option<DocumentUuid> },
}

impl ItemPilesApi {
    pub async fn click_pile(
        &self,
        pile: &impl Resolvable,
        ctx: ClickContext,
    ) -> Result<ClickOutcome, ApiError> {
        let document = self.document(pile).await?;
        if !document.is_valid_pile() {
            return Ok(ClickOutcome::NotAPile);
        }
        let data = document.pile_data();

        let interacting = self.closest_in_range(&document, &ctx).await?;
        if interacting.is_none() && !self.session.is_gm {
            self.notify.warn("You are too far away to interact with that pile");
            tracing::debug!(pile = %document.uuid, user_id = %self.session.user_id, "Pile out of reach");
            return Ok(ClickOutcome::TooFar);
        }

        if data.is_container && data.locked && !self.session.is_gm {
            self.rattle_pile(&document.uuid, interacting).await?;
            return Ok(ClickOutcome::Rattled);
        }

        // A GM looks inside a locked container without unlocking it
        if data.is_container
            && data.closed
            && !data.locked
            && !self.open_pile(&document.uuid, interacting.clone()).await?
        {
            return Ok(ClickOutcome::Cancelled);
        }

        self.ui.open_inventory(&document.uuid, interacting.clone());
        Ok(ClickOutcome::ShowInventory { interacting })
    }

    /// First candidate within the pile's reach. Piles without a scene
    /// position accept any candidate.
    async fn closest_in_range(
        &self,
        pile: &PileDocument,
        ctx: &ClickContext,
    ) -> Result<Option<DocumentUuid>, ApiError> {
        let reach = pile.pile_data().distance;
        for candidate in &ctx.candidates {
            let Some(token) = self.piles.find(candidate).await? else {
                continue;
            };
            let in_range = match (pile.position, token.position) {
                (Some(at), Some(from)) => reach.allows(at.distance_to(&from)),
                (None, _) => true,
                (Some(_), None) => false,
            };
            if in_range {
                return Ok(Some(token.uuid));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use itempiles_domain::{Distance, GridPosition, PileData, UserId};

    use super::*;
    use crate::api::Session;
    use crate::infrastructure::ports::{MockInventoryUiPort, MockNotifyPort, MockSoundPort};
    use crate::infrastructure::ui::TracingUi;
    use crate::test_fixtures::*;

    fn guarded_chest() -> PileData {
        PileData {
            distance: Distance::Grid(2.0),
            locked_sound: "sounds/locked.ogg".into(),
            ..container(true, true)
        }
    }

    async fn world_with(pile: PileData, hero_at: GridPosition) -> TestWorld {
        let world = TestWorld::new(world_settings()).await;
        world
            .seed([
                token_pile("chest", GridPosition::new(0.0, 0.0), pile, vec![], json!({})),
                character_token("hero", hero_at),
            ])
            .await;
        world
    }

    fn player_api(
        world: &TestWorld,
        sounds: MockSoundPort,
        notify: MockNotifyPort,
        ui: MockInventoryUiPort,
    ) -> ItemPilesApi {
        ItemPilesApi::new(
            Session {
                user_id: UserId::new("player").unwrap(),
                is_gm: false,
            },
            world.piles.clone(),
            world.rpc.clone(),
            world.hooks.clone(),
            Arc::new(sounds),
            Arc::new(notify),
            Arc::new(TracingUi),
            Arc::new(ui),
        )
    }

    fn hero() -> ClickContext {
        ClickContext {
            candidates: vec![token_uuid("hero")],
        }
    }

    #[tokio::test]
    async fn distant_player_is_warned_and_nothing_changes() {
        let world = world_with(guarded_chest(), GridPosition::new(5.0, 0.0)).await;
        let mut sounds = MockSoundPort::new();
        sounds.expect_play().never();
        let mut notify = MockNotifyPort::new();
        notify
            .expect_warn()
            .withf(|message: &str| message.contains("too far"))
            .times(1)
            .return_const(());
        let mut ui = MockInventoryUiPort::new();
        ui.expect_open_inventory().never();

        let outcome = player_api(&world, sounds, notify, ui)
            .click_pile(&token_uuid("chest"), hero())
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::TooFar);
        let pile = world.doc(&token_uuid("chest")).await.pile_data();
        assert!(pile.closed && pile.locked);
    }

    #[tokio::test]
    async fn nearby_player_rattles_a_locked_chest() {
        let world = world_with(guarded_chest(), GridPosition::new(1.0, 0.0)).await;
        let mut sounds = MockSoundPort::new();
        sounds
            .expect_play()
            .withf(|src: &str| src == "sounds/locked.ogg")
            .times(1)
            .return_const(());
        let mut notify = MockNotifyPort::new();
        notify.expect_warn().never();
        let mut ui = MockInventoryUiPort::new();
        ui.expect_open_inventory().never();

        let outcome = player_api(&world, sounds, notify, ui)
            .click_pile(&token_uuid("chest"), hero())
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::Rattled);
        let pile = world.doc(&token_uuid("chest")).await.pile_data();
        assert!(pile.closed && pile.locked);
    }

    #[tokio::test]
    async fn closed_chest_opens_and_shows_inventory() {
        let world = world_with(container(true, false), GridPosition::new(1.0, 0.0)).await;
        let mut sounds = MockSoundPort::new();
        sounds.expect_play().return_const(());
        let mut ui = MockInventoryUiPort::new();
        ui.expect_open_inventory()
            .withf(|target, inspecting| {
                *target == token_uuid("chest") && *inspecting == Some(token_uuid("hero"))
            })
            .times(1)
            .return_const(());

        let outcome = player_api(&world, sounds, MockNotifyPort::new(), ui)
            .click_pile(&token_uuid("chest"), hero())
            .await
            .unwrap();

        assert_eq!(
            outcome,
            ClickOutcome::ShowInventory {
                interacting: Some(token_uuid("hero"))
            }
        );
        assert!(!world.doc(&token_uuid("chest")).await.pile_data().closed);
    }

    #[tokio::test]
    async fn gm_sees_a_locked_chest_from_anywhere() {
        let world = world_with(guarded_chest(), GridPosition::new(9.0, 0.0)).await;

        let outcome = world
            .api("gm", true)
            .click_pile(&token_uuid("chest"), ClickContext::default())
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::ShowInventory { interacting: None });
        assert!(world.doc(&token_uuid("chest")).await.pile_data().locked);
    }

    #[tokio::test]
    async fn plain_tokens_are_not_piles() {
        let world = world_with(guarded_chest(), GridPosition::new(1.0, 0.0)).await;

        let outcome = world
            .api("gm", true)
            .click_pile(&token_uuid("hero"), hero())
            .await
            .unwrap();

        assert_eq!(outcome, ClickOutcome::NotAPile);
    }
}
