//! Async service front door for the turn engine.
//!
//! One engine instance exists per game, each behind its own async mutex:
//! actions on the same game are strictly serialized, while actions on
//! different games share nothing and proceed fully in parallel. Committed
//! actions are snapshotted to the store before the result is returned.

use crate::storage::{GameStore, StorageError};
use hexfront_core::{ActionError, ActionRequest, ActionResult, GameState, GameView, TurnEngine};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No game with this id exists in memory or in the store.
    #[error("unknown game: {0}")]
    UnknownGame(String),
    /// The engine rejected the action.
    #[error(transparent)]
    Action(#[from] ActionError),
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

type SharedEngine = Arc<Mutex<TurnEngine<GameStore>>>;

/// Multi-game action service.
pub struct GameService {
    store: GameStore,
    engines: Mutex<HashMap<String, SharedEngine>>,
}

impl GameService {
    /// Create a service over a store.
    pub fn new(store: GameStore) -> Self {
        Self {
            store,
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Register a freshly created game and persist its initial snapshot.
    pub async fn create_game(&self, state: GameState) -> Result<GameView, ServiceError> {
        self.store.save_game(&state)?;
        let game_id = state.id.clone();
        let view = GameView::from_state(&state);
        let engine = Arc::new(Mutex::new(TurnEngine::new(state, self.store.clone())));
        self.engines.lock().await.insert(game_id.clone(), engine);
        tracing::info!(game_id = %game_id, "game created");
        Ok(view)
    }

    /// Submit one action for a game.
    pub async fn submit(
        &self,
        game_id: &str,
        req: &ActionRequest,
    ) -> Result<ActionResult, ServiceError> {
        let engine = self.engine_for(game_id).await?;
        // Holding this lock is what serializes same-game actions; distinct
        // games hold distinct locks
        let mut engine = engine.lock().await;

        tracing::debug!(game_id, actor = req.actor, kind = req.action.kind(), "executing action");
        match engine.execute(req) {
            Ok(result) => {
                self.store.save_game(&engine.state)?;
                tracing::info!(
                    game_id,
                    kind = req.action.kind(),
                    effects = result.effects.len(),
                    "action committed"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::warn!(game_id, kind = req.action.kind(), error = %err, "action rejected");
                Err(err.into())
            }
        }
    }

    /// Current read model of a game.
    pub async fn view(&self, game_id: &str) -> Result<GameView, ServiceError> {
        let engine = self.engine_for(game_id).await?;
        let engine = engine.lock().await;
        Ok(GameView::from_state(&engine.state))
    }

    /// Fetch the engine for a game, reviving it from the store if this
    /// service instance has not seen the game yet.
    async fn engine_for(&self, game_id: &str) -> Result<SharedEngine, ServiceError> {
        let mut engines = self.engines.lock().await;
        if let Some(engine) = engines.get(game_id) {
            return Ok(engine.clone());
        }

        match self.store.load_game(game_id) {
            Ok(state) => {
                tracing::debug!(game_id, "reviving game from snapshot");
                let engine = Arc::new(Mutex::new(TurnEngine::new(state, self.store.clone())));
                engines.insert(game_id.to_string(), engine.clone());
                Ok(engine)
            }
            Err(StorageError::NotFound(_)) => Err(ServiceError::UnknownGame(game_id.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}
