pub mod auth;
pub mod distance;
pub mod events;
pub mod pagination;
pub mod recommendations;
pub mod search;
pub mod store;
