//! Public session facade: validated intake, draining and snapshots.

use std::sync::Arc;

use candy_quest_core::{
    ActionKind, ActionRequest, CharacterSnapshot, ContentTables, PlayMode, SessionSnapshot,
    UserId,
};
use candy_quest_system_action_queue::{ActionQueue, ActionTicket, BatchReport, QueueBusy};
use candy_quest_system_fog::FogPropagator;
use candy_quest_system_mapgen::MapGenerator;
use candy_quest_system_pathing::{check_move, MoveRejection, MovementRules};
use candy_quest_system_rules::conditions_pass;
use candy_quest_world::{query, MapModel, World};
use thiserror::Error;
use tokio::{sync::broadcast, task::JoinHandle};

use crate::{
    runtime::{GameAction, SessionRuntime},
    setup::{self, SetupError},
    SessionConfig,
};

const SNAPSHOT_CAPACITY: usize = 64;

/// Reasons an inbound request is refused without being enqueued.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Another action is pending or running.
    #[error("the session is busy resolving other actions")]
    Busy,
    /// The participant has no character in this session.
    #[error("participant has no character in this session")]
    UnknownUser,
    /// The participant's character no longer takes turns.
    #[error("character is out of the game")]
    Inactive,
    /// Another character holds the turn.
    #[error("it is not this character's turn")]
    NotYourTurn,
    /// The character already moved this turn.
    #[error("character already moved this turn")]
    AlreadyMoved,
    /// An encounter is waiting for a choice.
    #[error("an encounter is waiting for a choice")]
    ChoicePending,
    /// The requested move is not allowed.
    #[error("illegal move: {0}")]
    IllegalMove(MoveRejection),
    /// No encounter is waiting for this character's choice.
    #[error("no encounter is waiting for a choice")]
    NoPendingChoice,
    /// The pending encounter does not offer the action.
    #[error("the pending encounter offers no such action")]
    UnknownAction,
    /// The action's or item's conditions do not hold.
    #[error("conditions for this action are not met")]
    ConditionsFailed,
    /// The character does not carry the item.
    #[error("character does not carry the item")]
    MissingItem,
    /// The item is not in the content tables.
    #[error("item is not known")]
    UnknownItem,
}

impl From<QueueBusy> for Rejection {
    fn from(_: QueueBusy) -> Self {
        Self::Busy
    }
}

impl From<MoveRejection> for Rejection {
    fn from(rejection: MoveRejection) -> Self {
        Self::IllegalMove(rejection)
    }
}

/// A running game session.
///
/// All mutation goes through [`Session::submit`] and the action queue; the
/// world is only readable from outside.
#[derive(Debug)]
pub struct Session {
    runtime: SessionRuntime,
    queue: ActionQueue<GameAction>,
    snapshots: broadcast::Sender<SessionSnapshot>,
    movement: MovementRules,
}

impl Session {
    /// Generates a map from the configured seed and starts a session on it.
    pub fn new(
        config: SessionConfig,
        content: Arc<ContentTables>,
        players: &[UserId],
    ) -> Result<Self, SetupError> {
        setup::validate_players(players)?;
        let generated = MapGenerator::new(config.mapgen.clone()).generate(config.seed);
        let map = MapModel::new(generated.tiles, generated.regions)
            .with_generation_steps(generated.snapshots);
        Self::with_map(config, content, map, players)
    }

    /// Starts a session on a prepared map.
    pub fn with_map(
        config: SessionConfig,
        content: Arc<ContentTables>,
        map: MapModel,
        players: &[UserId],
    ) -> Result<Self, SetupError> {
        let fog = FogPropagator::new(config.fog);
        let mut world = World::new(map);
        setup::populate(&mut world, &config, &content, players, &fog)?;

        let (snapshots, _) = broadcast::channel(SNAPSHOT_CAPACITY);
        let runtime = SessionRuntime::new(
            world,
            content,
            fog,
            config.stage_delay(),
            snapshots.clone(),
        );

        Ok(Self {
            runtime,
            queue: ActionQueue::new(),
            snapshots,
            movement: config.movement,
        })
    }

    /// Validates a participant request and enqueues the matching action.
    pub async fn submit(&self, request: ActionRequest) -> Result<ActionTicket, Rejection> {
        if !self.queue.is_idle() {
            return Err(Rejection::Busy);
        }

        let world = self.runtime.world.read().await;
        let action = validate(&world, &self.runtime.content, self.movement, &request)?;
        let ticket = self.queue.enqueue_if_idle(action)?;
        tracing::debug!(user = %request.user, ticket = ticket.get(), "request accepted");
        Ok(ticket)
    }

    /// Drains the queue on the current task.
    pub async fn run_until_idle(&self) -> Option<BatchReport> {
        let mut runtime = self.runtime.clone();
        self.queue.drain(&mut runtime).await
    }

    /// Runs the queue worker on a background task until [`Session::close`].
    pub fn spawn_worker(&self) -> JoinHandle<()> {
        tokio::spawn(self.queue.clone().run(self.runtime.clone()))
    }

    /// Stops the background worker once it is between batches.
    pub fn close(&self) {
        self.queue.close();
    }

    /// Subscribes to the snapshot published after every drained batch.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionSnapshot> {
        self.snapshots.subscribe()
    }

    /// Exports the current public state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let world = self.runtime.world.read().await;
        query::export(&world, self.queue.batches_completed(), self.queue.mode())
    }

    /// Captures the character controlled by a participant.
    pub async fn character(&self, user: &UserId) -> Option<CharacterSnapshot> {
        let world = self.runtime.world.read().await;
        query::character_for_user(&world, user)
    }

    /// Input mode implied by the queue.
    #[must_use]
    pub fn mode(&self) -> PlayMode {
        self.queue.mode()
    }
}

fn validate(
    world: &World,
    content: &ContentTables,
    movement: MovementRules,
    request: &ActionRequest,
) -> Result<GameAction, Rejection> {
    let character = query::character_for_user(world, &request.user).ok_or(Rejection::UnknownUser)?;
    if !character.active {
        return Err(Rejection::Inactive);
    }
    if query::current_character(world) != Some(character.id) {
        return Err(Rejection::NotYourTurn);
    }
    let pending = query::pending_choice(world);
    let context = query::rule_context(world, character.id);

    match &request.action {
        ActionKind::MoveTo(target) => {
            if pending.is_some() {
                return Err(Rejection::ChoicePending);
            }
            if character.has_moved {
                return Err(Rejection::AlreadyMoved);
            }
            check_move(
                query::tiles(world),
                query::fog(world),
                character.cell,
                *target,
                movement.budget(&character.stats),
            )?;
            Ok(GameAction::Move {
                character: character.id,
                to: *target,
            })
        }
        ActionKind::ChoseAction(action) => {
            let pending = pending
                .filter(|pending| pending.character == character.id)
                .ok_or(Rejection::NoPendingChoice)?;
            let descriptor = content
                .encounter(&pending.encounter)
                .and_then(|encounter| encounter.action(action))
                .ok_or(Rejection::UnknownAction)?;
            if !conditions_pass(&descriptor.conditions, &character, &context) {
                return Err(Rejection::ConditionsFailed);
            }
            Ok(GameAction::ChooseAction {
                character: character.id,
                action: action.clone(),
            })
        }
        ActionKind::UseItem(item) => {
            if pending.is_some() {
                return Err(Rejection::ChoicePending);
            }
            let descriptor = content.item(item).ok_or(Rejection::UnknownItem)?;
            if !character.holds(item) {
                return Err(Rejection::MissingItem);
            }
            if !conditions_pass(&descriptor.conditions, &character, &context) {
                return Err(Rejection::ConditionsFailed);
            }
            Ok(GameAction::UseItem {
                character: character.id,
                item: item.clone(),
            })
        }
    }
}
