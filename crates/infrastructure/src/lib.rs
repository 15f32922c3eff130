//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod counter_store_support;
mod http_action_generator;
mod http_subject_resolver;
mod in_memory_counter_store;
mod postgres_counter_store;
mod redis_counter_store;
mod upstash_counter_store;

pub use http_action_generator::HttpActionGenerator;
pub use http_subject_resolver::HttpSubjectResolver;
pub use in_memory_counter_store::InMemoryCounterStore;
pub use postgres_counter_store::PostgresCounterStore;
pub use redis_counter_store::RedisCounterStore;
pub use upstash_counter_store::UpstashCounterStore;
