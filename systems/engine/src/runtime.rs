//! Action bodies executed by the session's queue worker.

use std::{sync::Arc, time::Duration};

use anyhow::Context as _;
use async_trait::async_trait;
use candy_quest_core::{
    ActionId, CellCoord, CharacterId, Command, ConditionDescriptor, ContentTables, EncounterId,
    Event, ItemId, PlayMode, SessionSnapshot, SiteRef, Stance, TriggerDescriptor,
};
use candy_quest_system_action_queue::{ActionHandler, ActionQueue, BatchReport};
use candy_quest_system_fog::FogPropagator;
use candy_quest_system_rules::{conditions_pass, resolve_triggers};
use candy_quest_world::{self as world, query, World};
use tokio::sync::{broadcast, RwLock};

/// Deferred gameplay mutations executed one at a time by the action queue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameAction {
    /// Moves a character to an already validated cell.
    Move {
        /// Character moving.
        character: CharacterId,
        /// Destination cell.
        to: CellCoord,
    },
    /// Handles a character arriving at a house or encounter site.
    ResolveSite {
        /// Arriving character.
        character: CharacterId,
        /// Site the character arrived at.
        site: SiteRef,
    },
    /// Starts an encounter reached through an action chain.
    StartEncounter {
        /// Character facing the encounter.
        character: CharacterId,
        /// Encounter to start.
        encounter: EncounterId,
    },
    /// Applies one of the pending encounter's actions.
    ChooseAction {
        /// Character choosing.
        character: CharacterId,
        /// Chosen action.
        action: ActionId,
    },
    /// Uses an item from a character's inventory.
    UseItem {
        /// Character using the item.
        character: CharacterId,
        /// Item used.
        item: ItemId,
    },
    /// Passes the turn to the next active character.
    EndTurn,
}

/// Applies commands and feeds the resulting events through the fog system
/// until no further commands are produced.
pub(crate) fn apply_with_fog(
    world: &mut World,
    fog: &FogPropagator,
    commands: Vec<Command>,
) -> Vec<Event> {
    let mut log = Vec::new();
    let mut commands = commands;

    loop {
        if commands.is_empty() {
            break;
        }

        let mut events = Vec::new();
        for command in std::mem::take(&mut commands) {
            world::apply(world, command, &mut events);
        }

        let characters = query::characters(world);
        fog.handle(
            &events,
            query::tiles(world),
            query::fog(world),
            &characters,
            &mut commands,
        );
        log.extend(events);
    }

    log
}

/// Encounter stage ready to be gated and applied.
struct Stage {
    encounter: EncounterId,
    site: Option<SiteRef>,
    conditions: Vec<ConditionDescriptor>,
    triggers: Vec<TriggerDescriptor>,
}

/// Shared state every action body works against.
#[derive(Clone, Debug)]
pub(crate) struct SessionRuntime {
    pub(crate) world: Arc<RwLock<World>>,
    pub(crate) content: Arc<ContentTables>,
    fog: FogPropagator,
    stage_delay: Duration,
    snapshots: broadcast::Sender<SessionSnapshot>,
}

impl SessionRuntime {
    pub(crate) fn new(
        world: World,
        content: Arc<ContentTables>,
        fog: FogPropagator,
        stage_delay: Duration,
        snapshots: broadcast::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            world: Arc::new(RwLock::new(world)),
            content,
            fog,
            stage_delay,
            snapshots,
        }
    }

    async fn commit(&self, commands: Vec<Command>) -> Vec<Event> {
        let mut world = self.world.write().await;
        apply_with_fog(&mut world, &self.fog, commands)
    }

    async fn move_character(
        &self,
        character: CharacterId,
        to: CellCoord,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        let site = {
            let mut world = self.world.write().await;
            let events = apply_with_fog(
                &mut world,
                &self.fog,
                vec![Command::MoveCharacter { character, to }],
            );
            if events
                .iter()
                .any(|event| matches!(event, Event::MoveRejected { .. }))
            {
                anyhow::bail!("world refused to move character {} to {to:?}", character.get());
            }
            query::site_at(&world, to).map(|view| view.site)
        };

        let _ = match site {
            Some(site) => queue.enqueue(GameAction::ResolveSite { character, site }),
            None => queue.enqueue(GameAction::EndTurn),
        };
        Ok(())
    }

    async fn resolve_site(
        &self,
        character: CharacterId,
        site: SiteRef,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        let stage = {
            let mut world = self.world.write().await;
            let view = query::site_view(&world, site)
                .with_context(|| format!("site {site:?} is not placed"))?;
            let stage = Stage {
                encounter: view.encounter.clone(),
                site: Some(site),
                conditions: view.conditions.to_vec(),
                triggers: view.triggers.to_vec(),
            };
            let _ = apply_with_fog(
                &mut world,
                &self.fog,
                vec![Command::RecordVisit { site, character }],
            );
            stage
        };

        self.begin_encounter(character, stage, queue).await
    }

    async fn start_encounter(
        &self,
        character: CharacterId,
        encounter: EncounterId,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        let descriptor = self
            .content
            .encounter(&encounter)
            .with_context(|| format!("encounter `{encounter}` is not in the content tables"))?;
        let stage = Stage {
            conditions: descriptor.conditions.clone(),
            triggers: descriptor.triggers.clone(),
            encounter,
            site: None,
        };
        self.begin_encounter(character, stage, queue).await
    }

    /// Gates the encounter, applies its triggers and offers its actions after
    /// the configured pause.
    async fn begin_encounter(
        &self,
        character: CharacterId,
        stage: Stage,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        let proceed = {
            let mut world = self.world.write().await;
            let snapshot = query::character(&world, character)
                .with_context(|| format!("character {} is not in the session", character.get()))?;
            let context = query::rule_context(&world, character);
            if conditions_pass(&stage.conditions, &snapshot, &context) {
                let commands = resolve_triggers(&stage.triggers, &snapshot, &context);
                let _ = apply_with_fog(&mut world, &self.fog, commands);
                !turn_lost(&world, character)
            } else {
                tracing::info!(
                    character = character.get(),
                    encounter = %stage.encounter,
                    "encounter conditions not met"
                );
                false
            }
        };
        if !proceed {
            let _ = queue.enqueue(GameAction::EndTurn);
            return Ok(());
        }

        if !self.stage_delay.is_zero() {
            tokio::time::sleep(self.stage_delay).await;
        }

        let descriptor = self
            .content
            .encounter(&stage.encounter)
            .with_context(|| format!("encounter `{}` is not in the content tables", stage.encounter))?;
        if descriptor.actions.is_empty() {
            let _ = queue.enqueue(GameAction::EndTurn);
            return Ok(());
        }

        let _ = self
            .commit(vec![Command::OfferChoice {
                character,
                encounter: stage.encounter,
                site: stage.site,
            }])
            .await;
        Ok(())
    }

    async fn choose_action(
        &self,
        character: CharacterId,
        action: ActionId,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        let followup = {
            let mut world = self.world.write().await;
            let pending = query::pending_choice(&world)
                .filter(|pending| pending.character == character)
                .cloned()
                .with_context(|| format!("character {} has no pending choice", character.get()))?;
            let descriptor = self
                .content
                .encounter(&pending.encounter)
                .and_then(|encounter| encounter.action(&action))
                .with_context(|| {
                    format!("encounter `{}` offers no action `{action}`", pending.encounter)
                })?;
            let snapshot = query::character(&world, character)
                .with_context(|| format!("character {} is not in the session", character.get()))?;
            let context = query::rule_context(&world, character);

            let mut commands = vec![Command::ResolveChoice { character }];
            commands.extend(resolve_triggers(&descriptor.triggers, &snapshot, &context));
            if let Some(SiteRef::House(house)) = pending.site {
                if descriptor.stance != Stance::Neutral {
                    commands.push(Command::RecordStance {
                        house,
                        character,
                        stance: descriptor.stance,
                    });
                }
            }
            let _ = apply_with_fog(&mut world, &self.fog, commands);

            if turn_lost(&world, character) {
                None
            } else {
                descriptor.next.clone()
            }
        };

        let _ = match followup {
            Some(encounter) => queue.enqueue(GameAction::StartEncounter {
                character,
                encounter,
            }),
            None => queue.enqueue(GameAction::EndTurn),
        };
        Ok(())
    }

    async fn use_item(
        &self,
        character: CharacterId,
        item: ItemId,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        let lost = {
            let mut world = self.world.write().await;
            let descriptor = self
                .content
                .item(&item)
                .with_context(|| format!("item `{item}` is not in the content tables"))?;
            let snapshot = query::character(&world, character)
                .with_context(|| format!("character {} is not in the session", character.get()))?;
            if !snapshot.holds(&item) {
                anyhow::bail!("character {} does not hold `{item}`", character.get());
            }
            let context = query::rule_context(&world, character);

            let mut commands = Vec::new();
            if !descriptor.reusable {
                commands.push(Command::TakeItem {
                    character,
                    item: item.clone(),
                });
            }
            commands.extend(resolve_triggers(&descriptor.triggers, &snapshot, &context));
            let _ = apply_with_fog(&mut world, &self.fog, commands);
            turn_lost(&world, character)
        };

        if lost {
            let _ = queue.enqueue(GameAction::EndTurn);
        }
        Ok(())
    }
}

/// Reports whether the character no longer holds an active turn.
fn turn_lost(world: &World, character: CharacterId) -> bool {
    query::current_character(world) != Some(character)
        || !query::character(world, character).is_some_and(|snapshot| snapshot.active)
}

#[async_trait]
impl ActionHandler<GameAction> for SessionRuntime {
    async fn execute(
        &mut self,
        action: GameAction,
        queue: &ActionQueue<GameAction>,
    ) -> anyhow::Result<()> {
        tracing::debug!(action = ?action, "executing action");
        match action {
            GameAction::Move { character, to } => self.move_character(character, to, queue).await,
            GameAction::ResolveSite { character, site } => {
                self.resolve_site(character, site, queue).await
            }
            GameAction::StartEncounter {
                character,
                encounter,
            } => self.start_encounter(character, encounter, queue).await,
            GameAction::ChooseAction { character, action } => {
                self.choose_action(character, action, queue).await
            }
            GameAction::UseItem { character, item } => {
                self.use_item(character, item, queue).await
            }
            GameAction::EndTurn => {
                let _ = self.commit(vec![Command::EndTurn]).await;
                Ok(())
            }
        }
    }

    async fn batch_complete(&mut self, report: BatchReport) {
        let snapshot = {
            let world = self.world.read().await;
            query::export(&world, report.batch, PlayMode::Playable)
        };
        if self.snapshots.send(snapshot).is_err() {
            tracing::debug!(batch = report.batch, "no snapshot subscribers");
        }
    }
}
