#[macro_use]
extern crate rocket;

mod capacity;
mod compress;
mod contact;
mod error;
mod models;
mod payload;
mod pipeline;
mod qr;
mod routes;

use rocket_cors::{AllowedOrigins, CorsOptions};

#[launch]
fn rocket() -> _ {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    let limits = pipeline::Limits::from_env();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .to_cors()
        .expect("CORS configuration failed");

    rocket::build()
        .attach(cors)
        .manage(limits)
        .mount(
            "/api/v1",
            routes![routes::health, routes::preflight_qr, routes::encode_qr],
        )
}
