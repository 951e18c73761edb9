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
#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tempfile::TempDir;

use roster::prelude::*;

/// A store file that lives as long as the returned directory.
pub fn temp_store() -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("roster.db").display());
    (dir, url)
}

/// A path whose parent directory does not exist, so it can never be opened.
pub fn unreachable_url() -> String {
    let dir = tempfile::tempdir().unwrap();
    let missing: PathBuf = dir.path().join("missing").join("nowhere").join("roster.db");
    format!("sqlite://{}", missing.display())
}

pub fn create_test_cfg(url: &str) -> RosterConfig {
    RosterConfig::new(url)
        .set_pool_name("TestPool")
        .set_max_size(4)
        .set_min_idle(1)
        .set_connection_timeout(Duration::from_millis(500))
        .set_validation_timeout(Duration::from_millis(500))
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(2, Duration::from_millis(10), Duration::from_millis(50))
}

pub fn create_test_repository(url: &str) -> ResilientRepository {
    let pool = PoolManager::new(create_test_cfg(url)).unwrap();
    let repository = ResilientRepository::new(ResourceCoordinator::new(pool).with_retry_policy(fast_retry()));
    repository.install_schema().unwrap();
    repository
}

/// A repository over a reachable store whose schema was never installed.
pub fn create_bare_repository(url: &str) -> ResilientRepository {
    let pool = PoolManager::new(create_test_cfg(url)).unwrap();
    ResilientRepository::new(ResourceCoordinator::new(pool).with_retry_policy(fast_retry()))
}

/// A repository over a store that can never be reached.
pub fn create_unreachable_repository() -> ResilientRepository {
    let cfg = create_test_cfg(&unreachable_url())
        .set_min_idle(0)
        .set_connection_timeout(Duration::from_millis(100))
        .set_initialization_fail_fast(false);
    let pool = PoolManager::new(cfg).unwrap();
    ResilientRepository::new(ResourceCoordinator::new(pool).with_retry_policy(fast_retry()))
}

pub fn create_test_employee(first: &str, last: &str, salary: &str) -> Employee {
    let email = format!("{}.{}@example.com", first.to_lowercase(), last.to_lowercase());
    Employee::new(first, last, email.as_str(), "IT_PROG", BigDecimal::from_str(salary).unwrap())
        .with_phone("555-0100")
}

pub fn decimal(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}
