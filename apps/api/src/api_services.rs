mod database;
mod purge;
mod state_builder;

pub use purge::spawn_counter_purge_task;
pub use state_builder::build_app_state;
