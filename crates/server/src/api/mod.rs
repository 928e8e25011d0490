pub mod debrid;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod searcher;

pub use routes::create_router;
