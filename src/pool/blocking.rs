/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *  
 */
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;
use crate::config::RosterConfig;
use crate::driver::sqlite::{self, SqliteConnectionManager, SqlitePool};
use crate::errors::{Result, RosterError};
use crate::interceptor::StatementLogger;
use crate::pool::{Lease, PoolStatus};

/// Owns the bounded set of store connections.
///
/// Cloning is cheap and every clone refers to the same pool.
#[derive(Clone)]
pub struct PoolManager {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    id: Uuid,
    cfg: RosterConfig,
    pool: RwLock<Option<SqlitePool>>,
    waiting: AtomicUsize,
    closed: AtomicBool,
    logger: StatementLogger,
}

/// Counts a caller as waiting for as long as it is alive.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        WaitingGuard(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl PoolManager {
    /// Build the pool. Malformed settings, or an unreachable store when
    /// `initialization_fail_fast` is set, are fatal.
    pub fn new(cfg: RosterConfig) -> Result<Self> {
        cfg.validate()?;
        let manager = SqliteConnectionManager::new(&cfg)?;
        Self::with_manager(cfg, manager)
    }

    /// Build the pool around a caller-configured connection manager.
    pub fn with_manager(cfg: RosterConfig, manager: SqliteConnectionManager) -> Result<Self> {
        let id = Uuid::new_v4();
        info!("{} - Starting... (id {}, max size {}, min idle {})", cfg.pool_name(), id, cfg.max_size(), cfg.min_idle());
        let pool = sqlite::init_sqlite_pool_with(&cfg, manager)?;
        let logger = StatementLogger::new()
            .with_log_level(cfg.log_level())
            .with_slow_threshold(cfg.slow_statement_threshold());
        info!("{} - Start completed.", cfg.pool_name());
        Ok(PoolManager {
            inner: Arc::new(PoolInner {
                id,
                cfg,
                pool: RwLock::new(Some(pool)),
                waiting: AtomicUsize::new(0),
                closed: AtomicBool::new(false),
                logger,
            }),
        })
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        self.inner.cfg.pool_name()
    }

    pub fn config(&self) -> &RosterConfig {
        &self.inner.cfg
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Borrow a validated connection, waiting up to the configured acquire timeout.
    pub fn acquire(&self) -> Result<Lease> {
        self.acquire_timeout(self.inner.cfg.connection_timeout())
    }

    /// Borrow a validated connection, waiting up to `timeout`.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<Lease> {
        let pool = self.handle().ok_or(RosterError::PoolClosed)?;
        let waited = {
            let _waiting = WaitingGuard::enter(&self.inner.waiting);
            pool.get_timeout(timeout)
        };
        match waited {
            Ok(_) | Err(_) if self.is_closed() => Err(RosterError::PoolClosed),
            Ok(conn) => Ok(Lease::new(conn, self.inner.logger.clone())),
            Err(e) => {
                let state = pool.state();
                let message = format!(
                    "{} - Connection is not available, request timed out after {} ms (total={}, idle={}): {}",
                    self.name(), timeout.as_millis(), state.connections, state.idle_connections, e
                );
                if state.connections >= self.inner.cfg.max_size() && state.idle_connections == 0 {
                    Err(RosterError::PoolExhausted(message))
                } else {
                    Err(RosterError::ConnectionError(message))
                }
            }
        }
    }

    /// Run the validation query on a leased connection.
    pub fn validate(&self, lease: &Lease) -> Result<()> {
        let cfg = &self.inner.cfg;
        sqlite::validate_connection(
            lease.connection(),
            cfg.validation_query(),
            cfg.validation_timeout(),
            cfg.connection_timeout(),
        )
    }

    /// Snapshot of connection counts.
    pub fn status(&self) -> PoolStatus {
        let waiting = self.inner.waiting.load(Ordering::SeqCst);
        match self.handle() {
            Some(pool) => {
                let state = pool.state();
                PoolStatus::from_counts(state.connections, state.idle_connections, waiting)
            }
            None => PoolStatus::from_counts(0, 0, waiting),
        }
    }

    /// Stop handing out leases. From now on `status` reports an empty pool.
    ///
    /// Every outstanding lease keeps the underlying r2d2 pool alive, so idle
    /// connections close together with the last returned lease.
    pub fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!("{} - Already shut down", self.name());
            return;
        }
        info!("{} - Shutdown initiated...", self.name());
        let pool = self.inner.pool.write().unwrap_or_else(PoisonError::into_inner).take();
        drop(pool);
        info!("{} - Shutdown completed.", self.name());
    }

    fn handle(&self) -> Option<SqlitePool> {
        if self.is_closed() {
            return None;
        }
        self.inner.pool.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl std::fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolManager")
            .field("id", &self.inner.id)
            .field("name", &self.name())
            .field("closed", &self.is_closed())
            .field("status", &self.status())
            .finish()
    }
}
