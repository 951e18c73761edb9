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
//!
//! Units of work over leased connections.
//!
use std::thread;
use tracing::{error, warn};
use crate::errors::Result;
use crate::pool::{IsolationLevel, Lease, LeaseOptions, PoolManager};
use crate::retry::RetryPolicy;

/// Turns leases into well-scoped units of work.
///
/// Holds no mutable state of its own, so one instance can serve any number of
/// threads.
#[derive(Debug, Clone)]
pub struct ResourceCoordinator {
    pool: PoolManager,
    retry: RetryPolicy,
}

impl ResourceCoordinator {
    pub fn new(pool: PoolManager) -> Self {
        ResourceCoordinator { pool, retry: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn pool(&self) -> &PoolManager {
        &self.pool
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Lease a connection, run `operation`, release the lease whatever happens.
    pub fn with_connection<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Lease) -> Result<T>,
    {
        let mut lease = self.pool.acquire()?;
        operation(&mut lease)
    }

    /// Like [`with_connection`](Self::with_connection) with explicit auto-commit and isolation.
    ///
    /// With auto-commit off the operation runs inside a transaction that it must
    /// commit itself; otherwise it is rolled back on release.
    pub fn with_options<T, F>(&self, options: LeaseOptions, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Lease) -> Result<T>,
    {
        self.with_connection(|lease| {
            lease.set_isolation_level(options.isolation)?;
            lease.set_auto_commit(options.auto_commit)?;
            operation(lease)
        })
    }

    /// Run `operation` in a transaction: commit on success, roll back on any failure.
    pub fn with_transaction<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Lease) -> Result<T>,
    {
        self.with_transaction_isolation(IsolationLevel::default(), operation)
    }

    pub fn with_transaction_isolation<T, F>(&self, isolation: IsolationLevel, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Lease) -> Result<T>,
    {
        self.with_options(LeaseOptions::transactional(isolation), |lease| {
            let outcome = operation(lease).and_then(|value| lease.commit().map(|_| value));
            if let Err(ref cause) = outcome {
                warn!("Rolling back transaction: {}", cause);
                if let Err(rollback) = lease.rollback() {
                    error!("Rollback failed after `{}`: {}", cause, rollback);
                }
            }
            outcome
        })
    }

    /// Run `operation` on a fresh lease, retrying transient failures up to
    /// `max_retries` more times with capped backoff. Anything else fails at once.
    ///
    /// Each attempt waits at most the policy's `attempt_timeout` for a connection.
    pub fn with_retry<T, F>(&self, max_retries: u32, mut operation: F) -> Result<T>
    where
        F: FnMut(&mut Lease) -> Result<T>,
    {
        let cfg = self.pool.config();
        let acquire_timeout = cfg.connection_timeout().min(self.retry.attempt_timeout);
        let mut attempt = 0;
        loop {
            let outcome = self.pool.acquire_timeout(acquire_timeout).and_then(|mut lease| operation(&mut lease));
            match outcome {
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    attempt += 1;
                    let wait = self.retry.backoff(attempt);
                    warn!("Attempt {} of {} failed: {}. Retrying in {} ms", attempt, max_retries + 1, e, wait.as_millis());
                    thread::sleep(wait);
                }
                outcome => return outcome,
            }
        }
    }

    /// Retry with the policy's own `max_retries`.
    pub fn with_default_retry<T, F>(&self, operation: F) -> Result<T>
    where
        F: FnMut(&mut Lease) -> Result<T>,
    {
        self.with_retry(self.retry.max_retries, operation)
    }

    /// Whether a connection can be leased and validated right now. Never fails.
    pub fn health(&self) -> bool {
        let cfg = self.pool.config();
        let timeout = cfg.validation_timeout().min(cfg.connection_timeout());
        match self.pool.acquire_timeout(timeout).and_then(|lease| self.pool.validate(&lease)) {
            Ok(()) => true,
            Err(e) => {
                warn!("{} - Health check failed: {}", self.pool.name(), e);
                false
            }
        }
    }
}
