pub mod game;
pub mod stats;
pub mod user;

pub use game::{GameError, GameOverNotifier, GameService};
pub use stats::{StatsError, StatsService};

use crate::storage::StorageManager;

#[derive(Clone)]
pub struct ServiceRegistry {
    pub game: GameService,
    pub stats: StatsService,
}

impl ServiceRegistry {
    pub fn new(storage: StorageManager) -> Self {
        info!("Initializing service registry");

        let game = GameService::new(storage.clone());
        let stats = StatsService::new(storage);

        info!("Service registry initialized");

        Self { game, stats }
    }
}
