#[macro_use] extern crate rocket;

use anyhow::Context;
use dotenv::dotenv;
use log::{error, info};
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::{Build, Rocket};

mod config;
mod cors;
mod routes;
mod store;
mod structs;

use config::Settings;
use cors::CORS;
use store::NoteStore;

#[launch]
fn rocket() -> _ {
    dotenv().ok();
    build(config::figment())
}

/// Assembles the service on top of `figment`. The store is opened during
/// ignition, so a bad `database_url` aborts launch.
pub fn build(figment: Figment) -> Rocket<Build> {
    rocket::custom(figment)
        .attach(CORS)
        .attach(AdHoc::try_on_ignite("Note store", |rocket| async move {
            let settings = rocket
                .figment()
                .extract::<Settings>()
                .context("invalid note store settings");
            let opened = match settings {
                Ok(settings) => open_store(settings).await,
                Err(e) => Err(e),
            };
            match opened {
                Ok(store) => Ok(rocket.manage(store)),
                Err(e) => {
                    error!("Failed to open note store: {:#}", e);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::on_shutdown("Close note store", |rocket| {
            Box::pin(async move {
                if let Some(store) = rocket.state::<NoteStore>() {
                    store.close().await;
                }
            })
        }))
        .mount("/api", routes::routes())
        .mount("/", routes![cors::preflight])
        .register("/", catchers![cors::not_found, cors::unprocessable])
}

async fn open_store(settings: Settings) -> anyhow::Result<NoteStore> {
    let store = NoteStore::connect(&settings.database_url)
        .await
        .with_context(|| format!("cannot open {}", settings.database_url))?;
    info!("Opened note store at {}", settings.database_url);

    if settings.seed {
        store.seed_if_empty().await.context("seeding test notes")?;
    }
    store.log_contents().await.context("listing notes")?;

    Ok(store)
}
