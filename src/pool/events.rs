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
//! r2d2 hooks: error logging, leak detection and checkout timeouts.
//!
use std::fmt;
use std::time::Duration;
use r2d2::event::{AcquireEvent, CheckinEvent, ReleaseEvent, TimeoutEvent};
use r2d2::{HandleError, HandleEvent};
use tracing::{debug, warn};

/// Sends connection errors raised inside the pool to `tracing`.
#[derive(Debug, Clone)]
pub struct TracingErrorHandler {
    pool_name: String,
}

impl TracingErrorHandler {
    pub fn new<S: Into<String>>(pool_name: S) -> Self {
        Self { pool_name: pool_name.into() }
    }
}

impl<E> HandleError<E> for TracingErrorHandler
where
    E: fmt::Display,
{
    fn handle_error(&self, error: E) {
        warn!("{} - Connection error: {}", self.pool_name, error);
    }
}

/// Logs connection lifecycle and warns when a lease was held past the leak threshold.
#[derive(Debug, Clone)]
pub struct PoolEventLogger {
    pool_name: String,
    leak_threshold: Option<Duration>,
}

impl PoolEventLogger {
    pub fn new<S: Into<String>>(pool_name: S, leak_threshold: Option<Duration>) -> Self {
        Self { pool_name: pool_name.into(), leak_threshold }
    }

    /// Whether a checkout that lasted `held` counts as a suspected leak.
    pub fn is_leak(&self, held: Duration) -> bool {
        self.leak_threshold.map(|threshold| held > threshold).unwrap_or(false)
    }
}

impl HandleEvent for PoolEventLogger {
    fn handle_acquire(&self, event: AcquireEvent) {
        debug!("{} - Added connection {}", self.pool_name, event.connection_id());
    }

    fn handle_release(&self, event: ReleaseEvent) {
        debug!("{} - Closed connection {} (age {} ms)", self.pool_name, event.connection_id(), event.age().as_millis());
    }

    fn handle_timeout(&self, event: TimeoutEvent) {
        warn!("{} - Connection is not available, request timed out after {} ms", self.pool_name, event.timeout().as_millis());
    }

    fn handle_checkin(&self, event: CheckinEvent) {
        if self.is_leak(event.duration()) {
            warn!(
                "{} - Connection leak detection triggered for connection {}, held for {} ms",
                self.pool_name,
                event.connection_id(),
                event.duration().as_millis()
            );
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn leak_threshold_is_exclusive_and_optional() {
        let logger = PoolEventLogger::new("test", Some(Duration::from_millis(100)));
        assert!(!logger.is_leak(Duration::from_millis(100)));
        assert!(logger.is_leak(Duration::from_millis(101)));

        let disabled = PoolEventLogger::new("test", None);
        assert!(!disabled.is_leak(Duration::from_secs(3600)));
    }
}
