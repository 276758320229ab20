//! Curation service entry point: loads configuration, prepares storage, and
//! serves the REST API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr, eyre};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::info;

use curation::inbound::http::health::HealthState;
use curation::outbound::Repositories;
use curation::settings::CurationSettings;
use curation::telemetry;

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    telemetry::init(&DefaultEnv::new());

    let settings = CurationSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load configuration: {err}"))?;
    let canonicalizer = settings
        .canonicalizer()
        .wrap_err("invalid placeholder image base")?;
    let repos = Repositories::connect(settings.pool_config())
        .await
        .wrap_err("failed to prepare storage")?;

    let http_state = server::build_http_state(&repos, canonicalizer, settings.feed_limits());
    let health_state = web::Data::new(HealthState::new());
    let bind_addr = settings.bind_addr();
    let server = server::create_server(health_state, http_state, bind_addr)
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;

    info!(%bind_addr, "curation service listening");
    server.await.wrap_err("server terminated with an error")
}
