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
pub mod blocking;
pub mod events;
mod lease;

pub use blocking::PoolManager;
pub use lease::{IsolationLevel, Lease, LeaseOptions};

use serde::Serialize;

/// Point-in-time connection counts. For monitoring only; never gate behaviour on them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    /// Connections currently leased out.
    pub active: usize,
    /// Open connections waiting in the pool.
    pub idle: usize,
    /// `active + idle`.
    pub total: usize,
    /// Callers blocked in acquisition.
    pub waiting: usize,
}

impl PoolStatus {
    pub(crate) fn from_counts(total: u32, idle: u32, waiting: usize) -> Self {
        let total = total as usize;
        let idle = (idle as usize).min(total);
        PoolStatus { active: total - idle, idle, total, waiting }
    }
}
