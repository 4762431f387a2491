//! End-to-end executor scenarios over the in-memory store and RPC network.

use std::sync::{Arc, Mutex};

use serde_json::json;

use itempiles_domain::{
    AttributeAmounts, DeleteWhenEmpty, GridPosition, ItemDelta, ItemId, ModuleSettings,
    RemoveRequest, SceneId, UserId,
};
use itempiles_shared::{
    Broadcast, CreatePileData, DropItemsData, ErrorCode, HookName, PileRequest, PileResponse,
};

use crate::infrastructure::macros::MacroHandler;
use crate::infrastructure::ports::{MacroAction, RpcError};
use crate::test_fixtures::*;

use super::DEFAULT_PILE_ACTOR_NAME;

fn records(response: PileResponse) -> Vec<itempiles_domain::TransferRecord> {
    match response {
        PileResponse::Items { records } => records,
        other => panic!("expected item records, got {other:?}"),
    }
}

fn recording_macro(actions: Arc<Mutex<Vec<MacroAction>>>) -> MacroHandler {
    Arc::new(move |invocation| {
        let actions = actions.clone();
        Box::pin(async move {
            actions.lock().unwrap().push(invocation.action);
            Ok(())
        })
    })
}

#[tokio::test]
async fn adding_same_item_twice_merges_into_one_line() {
    let world = TestWorld::new(world_settings()).await;
    world.seed([actor("bob", vec![], json!({}))]).await;
    let bob = actor_uuid("bob");

    for quantity in [2, 3] {
        world
            .call(PileRequest::AddItems {
                target: bob.clone(),
                items: vec![ItemDelta {
                    item: item("arrow", "Arrow", "consumable", 1),
                    quantity,
                }],
            })
            .await
            .unwrap();
    }

    let document = world.doc(&bob).await;
    assert_eq!(document.items.len(), 1);
    assert_eq!(quantity_named(&document, "Arrow"), Some(5));
}

#[tokio::test]
async fn removing_more_than_held_removes_only_what_exists() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([actor("bob", vec![item("arrow", "Arrow", "consumable", 3)], json!({}))])
        .await;
    let bob = actor_uuid("bob");

    let removed = records(
        world
            .call(PileRequest::RemoveItems {
                target: bob.clone(),
                items: vec![RemoveRequest {
                    id: ItemId::new("arrow").unwrap(),
                    quantity: Some(10),
                }],
            })
            .await
            .unwrap(),
    );

    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].quantity, 3);
    assert!(removed[0].deleted);
    assert!(world.doc(&bob).await.items.is_empty());
}

#[tokio::test]
async fn transferring_there_and_back_restores_quantities() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([
            actor("bob", vec![item("arrow", "Arrow", "consumable", 5)], json!({})),
            token_pile("chest", GridPosition::new(0.0, 0.0), enabled_pile(), vec![], json!({})),
        ])
        .await;
    let (bob, chest) = (actor_uuid("bob"), token_uuid("chest"));

    let moved = records(
        world
            .call(PileRequest::TransferItems {
                source: bob.clone(),
                target: chest.clone(),
                items: vec![RemoveRequest {
                    id: ItemId::new("arrow").unwrap(),
                    quantity: Some(5),
                }],
            })
            .await
            .unwrap(),
    );
    assert_eq!(moved.len(), 1);
    assert_eq!(quantity_named(&world.doc(&chest).await, "Arrow"), Some(5));
    assert_eq!(quantity_named(&world.doc(&bob).await, "Arrow"), None);

    let line = world.doc(&chest).await.items[0].id.clone();
    world
        .call(PileRequest::TransferItems {
            source: chest.clone(),
            target: bob.clone(),
            items: vec![RemoveRequest {
                id: line,
                quantity: None,
            }],
        })
        .await
        .unwrap();
    assert_eq!(quantity_named(&world.doc(&bob).await, "Arrow"), Some(5));
}

#[tokio::test]
async fn emptied_pile_is_deleted_when_configured() {
    let world = TestWorld::new(world_settings()).await;
    let pile = itempiles_domain::PileData {
        delete_when_empty: DeleteWhenEmpty::True,
        ..enabled_pile()
    };
    world
        .seed([
            actor("bob", vec![], json!({})),
            token_pile(
                "chest",
                GridPosition::new(0.0, 0.0),
                pile,
                vec![item("sword", "Sword", "weapon", 1)],
                json!({}),
            ),
        ])
        .await;
    let mut broadcasts = world.rpc.register_participant(gm()).await;

    world
        .call(PileRequest::TransferAllItems {
            source: token_uuid("chest"),
            target: actor_uuid("bob"),
            item_type_filters: None,
        })
        .await
        .unwrap();

    assert!(!world.exists(&token_uuid("chest")).await);
    assert_eq!(quantity_named(&world.doc(&actor_uuid("bob")).await, "Sword"), Some(1));

    let mut saw_delete = false;
    while let Ok(broadcast) = broadcasts.try_recv() {
        if matches!(broadcast, Broadcast::CallHook { hook: HookName::Delete, .. }) {
            saw_delete = true;
        }
    }
    assert!(saw_delete);
}

#[tokio::test]
async fn pile_left_at_default_survives_when_global_setting_is_off() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([
            actor("bob", vec![], json!({})),
            token_pile(
                "chest",
                GridPosition::new(0.0, 0.0),
                enabled_pile(),
                vec![item("sword", "Sword", "weapon", 1)],
                json!({}),
            ),
        ])
        .await;

    world
        .call(PileRequest::TransferAllItems {
            source: token_uuid("chest"),
            target: actor_uuid("bob"),
            item_type_filters: None,
        })
        .await
        .unwrap();

    assert!(world.exists(&token_uuid("chest")).await);
}

#[tokio::test]
async fn adding_gold_returns_the_new_total() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([actor("bob", vec![], json!({"currency": {"gold": 10}}))])
        .await;
    let mut attributes = AttributeAmounts::new();
    attributes.insert(gold(), 5.0);

    let response = world
        .call(PileRequest::AddAttributes {
            target: actor_uuid("bob"),
            attributes,
        })
        .await
        .unwrap();

    match response {
        PileResponse::Attributes { records } => assert_eq!(records.get(&gold()), Some(&15.0)),
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(
        world.doc(&actor_uuid("bob")).await.system,
        json!({"currency": {"gold": 15}})
    );
}

#[tokio::test]
async fn transfer_all_items_skips_filtered_types() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([
            actor("bob", vec![], json!({})),
            token_pile(
                "chest",
                GridPosition::new(0.0, 0.0),
                enabled_pile(),
                vec![
                    item("sword", "Sword", "weapon", 1),
                    item("arrow", "Arrow", "consumable", 20),
                ],
                json!({}),
            ),
        ])
        .await;

    let moved = records(
        world
            .call(PileRequest::TransferAllItems {
                source: token_uuid("chest"),
                target: actor_uuid("bob"),
                item_type_filters: Some(vec!["weapon".into()]),
            })
            .await
            .unwrap(),
    );

    assert_eq!(moved.len(), 1);
    let bob = world.doc(&actor_uuid("bob")).await;
    assert_eq!(quantity_named(&bob, "Arrow"), Some(20));
    assert_eq!(quantity_named(&bob, "Sword"), None);
    assert_eq!(
        quantity_named(&world.doc(&token_uuid("chest")).await, "Sword"),
        Some(1)
    );
}

#[tokio::test]
async fn transfer_everything_moves_items_and_gold() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([
            actor("bob", vec![], json!({"currency": {"gold": 0}})),
            token_pile(
                "chest",
                GridPosition::new(0.0, 0.0),
                enabled_pile(),
                vec![item("gem", "Gem", "loot", 2)],
                json!({"currency": {"gold": 30}}),
            ),
        ])
        .await;

    let response = world
        .call(PileRequest::TransferEverything {
            source: token_uuid("chest"),
            target: actor_uuid("bob"),
            item_type_filters: None,
        })
        .await
        .unwrap();

    match response {
        PileResponse::Everything { items, attributes } => {
            assert_eq!(items.len(), 1);
            assert_eq!(attributes.get(&gold()), Some(&30.0));
        }
        other => panic!("unexpected response {other:?}"),
    }
    let bob = world.doc(&actor_uuid("bob")).await;
    assert_eq!(quantity_named(&bob, "Gem"), Some(2));
    assert_eq!(bob.system, json!({"currency": {"gold": 30}}));
}

#[tokio::test]
async fn closing_a_container_reports_diff_and_runs_its_macro() {
    let world = TestWorld::new(world_settings()).await;
    let pile = itempiles_domain::PileData {
        macro_name: "Loot".into(),
        ..container(false, false)
    };
    world
        .seed([token_pile("chest", GridPosition::new(0.0, 0.0), pile, vec![], json!({}))])
        .await;
    let actions = Arc::new(Mutex::new(Vec::new()));
    world.macros.register("Loot", recording_macro(actions.clone()));

    let mut patch = serde_json::Map::new();
    patch.insert("closed".into(), json!(true));
    let response = world
        .call(PileRequest::UpdatePile {
            target: token_uuid("chest"),
            patch,
            interacting: None,
            token_overrides: Default::default(),
        })
        .await
        .unwrap();

    match response {
        PileResponse::Updated { diff } => {
            assert_eq!(diff.len(), 1);
            assert_eq!(diff.get("closed"), Some(&json!(true)));
        }
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(*actions.lock().unwrap(), vec![MacroAction::ClosePile]);
    assert!(world.doc(&token_uuid("chest")).await.pile_data().closed);
}

#[tokio::test]
async fn failing_macro_reports_error_after_persisting() {
    let world = TestWorld::new(world_settings()).await;
    let pile = itempiles_domain::PileData {
        macro_name: "Missing".into(),
        ..enabled_pile()
    };
    world
        .seed([token_pile("chest", GridPosition::new(0.0, 0.0), pile, vec![], json!({}))])
        .await;

    let result = world
        .call(PileRequest::AddItems {
            target: token_uuid("chest"),
            items: vec![ItemDelta {
                item: item("gem", "Gem", "loot", 1),
                quantity: 1,
            }],
        })
        .await;

    assert!(matches!(
        result,
        Err(RpcError::Remote { code: ErrorCode::MacroFailed, .. })
    ));
    assert_eq!(
        quantity_named(&world.doc(&token_uuid("chest")).await, "Gem"),
        Some(1)
    );
}

#[tokio::test]
async fn deleting_a_plain_actor_is_not_a_pile() {
    let world = TestWorld::new(world_settings()).await;
    world.seed([actor("bob", vec![], json!({}))]).await;

    let result = world
        .call(PileRequest::DeletePile {
            target: actor_uuid("bob"),
        })
        .await;

    assert!(matches!(
        result,
        Err(RpcError::Remote { code: ErrorCode::NotAPile, .. })
    ));
    assert!(world.exists(&actor_uuid("bob")).await);
}

#[tokio::test]
async fn missing_document_is_not_found() {
    let world = TestWorld::new(world_settings()).await;

    let result = world
        .call(PileRequest::RefreshPile {
            target: token_uuid("ghost"),
        })
        .await;

    // Refresh tolerates a vanished pile
    assert!(matches!(result, Ok(PileResponse::Refreshed { changed: false })));

    let result = world
        .call(PileRequest::DeletePile {
            target: token_uuid("ghost"),
        })
        .await;
    assert!(matches!(
        result,
        Err(RpcError::Remote { code: ErrorCode::NotFound, .. })
    ));
}

#[tokio::test]
async fn create_pile_provisions_the_default_actor_once() {
    let world = TestWorld::new(world_settings()).await;
    let scene = SceneId::new(SCENE).unwrap();

    let mut created = Vec::new();
    for x in [1.0, 2.0] {
        let response = world
            .call(PileRequest::CreatePile(CreatePileData {
                scene: scene.clone(),
                position: GridPosition::new(x, 0.0),
                items: vec![ItemDelta {
                    item: item("gem", "Gem", "loot", 1),
                    quantity: 3,
                }],
                pile_actor_name: None,
                pile_patch: Default::default(),
                token_overrides: Default::default(),
            }))
            .await
            .unwrap();
        match response {
            PileResponse::Created { uuid } => created.push(uuid),
            other => panic!("unexpected response {other:?}"),
        }
    }

    let settings: ModuleSettings = world.piles.settings().await.unwrap();
    assert!(settings.default_pile_actor.is_some());
    // One template actor plus two tokens
    assert_eq!(world.store.len().await, 3);

    let token = world.doc(&created[0]).await;
    assert!(token.is_valid_pile());
    assert_eq!(token.name, DEFAULT_PILE_ACTOR_NAME);
    assert_eq!(quantity_named(&token, "Gem"), Some(3));
}

#[tokio::test]
async fn create_pile_from_unknown_actor_is_not_found() {
    let world = TestWorld::new(world_settings()).await;

    let result = world
        .call(PileRequest::CreatePile(CreatePileData {
            scene: SceneId::new(SCENE).unwrap(),
            position: GridPosition::new(0.0, 0.0),
            items: vec![],
            pile_actor_name: Some("Nobody".into()),
            pile_patch: Default::default(),
            token_overrides: Default::default(),
        }))
        .await;

    assert!(matches!(
        result,
        Err(RpcError::Remote { code: ErrorCode::NotFound, .. })
    ));
}

#[tokio::test]
async fn dropping_on_empty_ground_spawns_a_pile() {
    let world = TestWorld::new(world_settings()).await;
    world
        .seed([actor("bob", vec![item("arrow", "Arrow", "consumable", 10)], json!({}))])
        .await;

    let response = world
        .call(PileRequest::DropItems(DropItemsData {
            source: Some(actor_uuid("bob")),
            target: None,
            scene: Some(SceneId::new(SCENE).unwrap()),
            position: Some(GridPosition::new(4.0, 4.0)),
            item: ItemDelta {
                item: item("arrow", "Arrow", "consumable", 10),
                quantity: 4,
            },
        }))
        .await
        .unwrap();

    let PileResponse::Dropped { target, records } = response else {
        panic!("unexpected response");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(quantity_named(&world.doc(&target).await, "Arrow"), Some(4));
    assert_eq!(
        quantity_named(&world.doc(&actor_uuid("bob")).await, "Arrow"),
        Some(6)
    );
}

#[tokio::test]
async fn calls_without_an_executor_are_unavailable() {
    let world = TestWorld::new(world_settings()).await;
    world.rpc.unregister_executor().await;

    let result = world
        .call(PileRequest::RefreshPile {
            target: token_uuid("chest"),
        })
        .await;
    assert!(matches!(result, Err(RpcError::CoordinatorUnavailable)));
}

#[tokio::test]
async fn hook_payloads_carry_the_caller() {
    let world = TestWorld::new(world_settings()).await;
    world.seed([actor("bob", vec![], json!({}))]).await;
    let mut broadcasts = world.rpc.register_participant(gm()).await;

    world
        .call(PileRequest::AddItems {
            target: actor_uuid("bob"),
            items: vec![ItemDelta {
                item: item("gem", "Gem", "loot", 1),
                quantity: 1,
            }],
        })
        .await
        .unwrap();

    let mut caller = None;
    while let Ok(broadcast) = broadcasts.try_recv() {
        if let Broadcast::CallHook {
            hook: HookName::AddItems,
            payload,
        } = broadcast
        {
            caller = payload.user_id;
        }
    }
    assert_eq!(caller, Some(UserId::new("gm").unwrap()));
}

#[tokio::test]
async fn transfer_macro_items_point_at_live_lines() {
    let world = TestWorld::new(world_settings()).await;
    let pile = itempiles_domain::PileData {
        macro_name: "Src".into(),
        ..enabled_pile()
    };
    world
        .seed([
            actor("bob", vec![], json!({})),
            token_pile(
                "chest",
                GridPosition::new(0.0, 0.0),
                pile,
                vec![item("arrow", "Arrow", "consumable", 5)],
                json!({}),
            ),
        ])
        .await;
    let uuids = Arc::new(Mutex::new(Vec::new()));
    let seen = uuids.clone();
    world.macros.register(
        "Src",
        Arc::new(move |invocation| {
            let seen = seen.clone();
            Box::pin(async move {
                seen.lock()
                    .unwrap()
                    .extend(invocation.items.into_iter().map(|resolved| resolved.uuid));
                Ok(())
            })
        }),
    );
    let (chest, bob) = (token_uuid("chest"), actor_uuid("bob"));

    world
        .call(PileRequest::TransferItems {
            source: chest.clone(),
            target: bob.clone(),
            items: vec![RemoveRequest {
                id: ItemId::new("arrow").unwrap(),
                quantity: Some(2),
            }],
        })
        .await
        .unwrap();

    let mut live = Vec::new();
    for uuid in [&chest, &bob] {
        let document = world.doc(uuid).await;
        live.extend(document.items.iter().map(|line| document.item_uuid(&line.id)));
    }
    let resolved = uuids.lock().unwrap().clone();
    assert_eq!(resolved.len(), 1);
    assert!(resolved.iter().all(|uuid| live.contains(uuid)));
    assert!(resolved[0].starts_with("Actor.bob.Item."));
}
