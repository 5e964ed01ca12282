//! Job listing request resolution and SQL composition.
//!
//! [`FilterSpec::resolve`] turns raw query-string values into a validated
//! spec; [`JobQueryBuilder`] turns that spec into parameterized count and
//! page queries. Neither step touches the database.

mod builder;
mod filter;

pub use builder::{JobQuery, JobQueryBuilder, QueryParam};
pub use filter::{
    DEFAULT_DOMAIN_LIMIT, DEFAULT_LIMIT, DomainParams, FilterSpec, ListParams, MAX_DOMAIN_LIMIT,
    MAX_LIMIT, OrderField, SortDirection, resolve_domain_limit,
};
