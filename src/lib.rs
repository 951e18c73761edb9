// Copyright (c) 2021 akita contributors
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! This crate offers:
//!
//! *   A bounded, validated SQLite connection pool;
//! *   Transactional and retrying units of work over leased connections;
//! *   An employee repository whose reads stay available when the store is not.
//!
//! ## Installation
//!
//! Put the desired version of the crate into the `dependencies` section of your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! roster = "0.1.0"
//! ```
//!
//! ## Configuration
//!
//! * ```url``` - `sqlite://path/to/file.db`
//! * ```maxPoolSize```, ```minIdle``` - pool bounds
//! * ```connectionTimeoutMs```, ```validationTimeoutMs``` - in milliseconds
//! * ```initializationFailFast``` - refuse to start when the store is unreachable
//!
//! Every key can also be supplied as a `ROSTER_*` environment variable, see
//! [`RosterConfig::from_env`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use roster::prelude::*;
//! use std::str::FromStr;
//!
//! let cfg = RosterConfig::new("sqlite://roster.db").set_max_size(4);
//! let pool = PoolManager::new(cfg).unwrap();
//! let repository = ResilientRepository::new(ResourceCoordinator::new(pool));
//! repository.install_schema().unwrap();
//!
//! let ada = Employee::new("Ada", "Lovelace", "ada@example.com", "IT_PROG", BigDecimal::from_str("91000.00").unwrap());
//! let created = repository.create(&ada).unwrap();
//! let raised = repository.adjust_salary_for_all(&BigDecimal::from(10)).unwrap();
//! let ada_list = repository.find_by_first_name_prefix("ad").unwrap();
//! ```
//!
mod config;
mod errors;
mod interceptor;
mod retry;
mod coordinator;
mod model;
mod salary;
mod schema;
mod repository;
pub mod driver;
pub mod pool;
pub mod fallback;
pub mod prelude;

#[doc(inline)]
pub use config::{Endpoint, RosterConfig};
#[doc(inline)]
pub use errors::{ErrorKind, Result, RosterError};
#[doc(inline)]
pub use interceptor::{LogLevel, StatementLogger};
#[doc(inline)]
pub use pool::{IsolationLevel, Lease, LeaseOptions, PoolManager, PoolStatus};
#[doc(inline)]
pub use retry::RetryPolicy;
#[doc(inline)]
pub use coordinator::ResourceCoordinator;
#[doc(inline)]
pub use model::{Employee, EMPLOYEE_COLUMNS};
#[doc(inline)]
pub use salary::{apply_percent, check_percent, parse_decimal, SALARY_SCALE};
#[doc(inline)]
pub use schema::{create_statements, qualified_table, EMPLOYEES_TABLE};
#[doc(inline)]
pub use repository::{EmployeeRepository, ResilientRepository};
#[doc(inline)]
pub use bigdecimal::BigDecimal;
