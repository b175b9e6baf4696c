use crate::{client::Client, database::Database, DEFAULT_NEAREST_STOPS};

/// Owns the database handle and hands out clients sharing it.
pub struct Server<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    database: D,
    nearest_stops: usize,
}

impl<D> Server<D>
where
    D: Database,
{
    pub fn new(database: D) -> Self {
        Self {
            database,
            nearest_stops: DEFAULT_NEAREST_STOPS,
        }
    }

    /// Number of stops returned by nearest stop queries of new clients.
    pub fn nearest_stops(mut self, k: usize) -> Self {
        self.nearest_stops = k;
        self
    }

    pub fn client<S: Into<String>>(&self, id: S) -> Client<D> {
        Client::new(id, self.database.clone()).with_nearest_stops(self.nearest_stops)
    }
}
