use crate::server::database::connection::Connection;
use log::{error, info};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time;

pub(crate) struct CommonPool<C> {
    /// pool name
    name: String,
    /// idle connections, accessed in a FIFO manner
    pub(crate) connections: Mutex<VecDeque<C>>,
    /// one permit per idle connection
    permits: Arc<Semaphore>,
}

/// Fixed-size pool handing out connections with an acquire timeout.
pub struct Pool<C>(Arc<CommonPool<C>>);

impl<C> Clone for Pool<C> {
    fn clone(&self) -> Pool<C> {
        Pool(self.0.clone())
    }
}

impl<C: Send + 'static> Pool<C> {
    /// create an empty pool, connections are added with [`Pool::add`]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(CommonPool {
            name: name.into(),
            connections: Mutex::new(VecDeque::new()),
            permits: Arc::new(Semaphore::new(0)),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn add(&self, client: C) {
        self.0
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(client);
        self.0.permits.add_permits(1);
    }

    /// number of idle connections
    pub fn idle(&self) -> usize {
        self.0.permits.available_permits()
    }

    /// acquire a connection, bail out with `None` if the timeout exceeds.
    pub async fn acquire(&self, timeout: Duration) -> Option<Connection<C>> {
        let permit = match time::timeout(timeout, self.0.permits.clone().acquire_owned()).await {
            Ok(Ok(permit)) => permit,
            Ok(Err(_)) => {
                error!("pool {} is closed", self.0.name);
                return None;
            }
            Err(_) => {
                error!(
                    "timed out to acquire a new connection from pool {} after {:?}",
                    self.0.name, timeout
                );
                return None;
            }
        };
        let client = self
            .0
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match client {
            Some(client) => Some(Connection::new(client, self.clone(), permit)),
            None => {
                error!("pool {} handed out a permit without a connection", self.0.name);
                None
            }
        }
    }

    pub(crate) fn release(&self, client: C) {
        self.0
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(client);
    }
}

pub(crate) mod connect_util {
    use super::Pool;
    use anyhow::Context;
    use log::{error, info};
    use tokio::task::JoinSet;
    use tokio_postgres::{Client, NoTls};

    pub async fn connect(str: &str) -> anyhow::Result<Client> {
        let (client, conn) = tokio_postgres::connect(str, NoTls)
            .await
            .context("failed to create connection")?;
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                error!("connection returned error and aborted, {}", e);
            }
        });
        Ok(client)
    }

    /// open `size` connections concurrently into a new pool
    pub async fn open(name: &str, conn_str: &str, size: usize) -> anyhow::Result<Pool<Client>> {
        let pool = Pool::new(name);
        let mut set = JoinSet::new();
        for _ in 0..size {
            let str = conn_str.to_string();
            set.spawn(async move { connect(str.as_str()).await });
        }
        while let Some(res) = set.join_next().await {
            let client = res.context("join_next failed when joining")??;
            pool.add(client);
        }
        info!("pool {} opened with {} connections", name, pool.idle());
        Ok(pool)
    }
}

impl<C> Drop for CommonPool<C> {
    fn drop(&mut self) {
        self.permits.close();
        info!("pool {} closed", self.name);
    }
}
