// HTTP trigger for catalog sync runs

pub mod auth;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::SyncServer;
