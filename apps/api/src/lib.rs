pub mod analysis;
pub mod auth;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod invoker;
pub mod models;
pub mod normalize;
pub mod recommendations;
pub mod resume;
pub mod routes;
pub mod skills;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;
