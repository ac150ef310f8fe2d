use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{GameId, GameRecord, GameStore, StoreError};

/// Process-local game store.
#[derive(Default)]
pub struct MemoryGameStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: GameId,
    games: BTreeMap<GameId, GameRecord>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GameStore for MemoryGameStore {
    fn create(&self, name: &str) -> Result<GameId, StoreError> {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let game_id = inner.next_id;
        inner.games.insert(game_id, GameRecord::new(game_id, name));
        Ok(game_id)
    }

    fn load(&self, game_id: GameId) -> Result<Option<GameRecord>, StoreError> {
        Ok(self.inner.read().games.get(&game_id).cloned())
    }

    fn save(&self, record: &GameRecord) -> Result<(), StoreError> {
        self.inner
            .write()
            .games
            .insert(record.game_id, record.clone());
        Ok(())
    }

    fn exists(&self, game_id: GameId) -> Result<bool, StoreError> {
        Ok(self.inner.read().games.contains_key(&game_id))
    }

    fn list(&self) -> Result<Vec<GameRecord>, StoreError> {
        Ok(self.inner.read().games.values().cloned().collect())
    }
}
