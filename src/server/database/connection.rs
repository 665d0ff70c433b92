use crate::server::database::pool::Pool;
use std::ops::{Deref, DerefMut};
use tokio::sync::OwnedSemaphorePermit;

/// A pooled connection, returned to its pool on drop.
pub struct Connection<C: Send + 'static> {
    client: Option<C>,
    pool: Pool<C>,
    // released after the client is back in the pool
    _permit: OwnedSemaphorePermit,
}

impl<C: Send + 'static> Connection<C> {
    pub(crate) fn new(client: C, pool: Pool<C>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            client: Some(client),
            pool,
            _permit: permit,
        }
    }
}

impl<C: Send + 'static> Deref for Connection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        // only taken in drop
        self.client.as_ref().expect("connection used after release")
    }
}

impl<C: Send + 'static> DerefMut for Connection<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.client.as_mut().expect("connection used after release")
    }
}

impl<C: Send + 'static> Drop for Connection<C> {
    fn drop(&mut self) {
        if let Some(client) = self.client.take() {
            self.pool.release(client);
        }
    }
}
