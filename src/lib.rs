#[macro_use]
extern crate rocket;

pub mod capacity;
pub mod compress;
pub mod contact;
pub mod error;
pub mod models;
pub mod payload;
pub mod pipeline;
pub mod qr;
pub mod routes;
