pub mod cache;
pub mod catalog;
pub mod handlers;
pub mod middleware;
pub mod profiles;
pub mod routes;

pub use routes::create_router;
