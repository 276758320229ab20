//! HTTP inbound adapter exposing the REST API under `/api/v1`.

pub mod error;
pub mod feed;
pub mod health;
pub mod ingest;
pub mod shares;
pub mod social;
pub mod state;
#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;
mod validation;
pub mod viewer;

use actix_web::web;

pub use error::ApiResult;

/// Mount every API handler on `cfg`, including extractor error handlers.
///
/// ```
/// use actix_web::{App, web};
/// use curation::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(validation::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(validation::query_error_handler))
        .service(ingest::ingest)
        .service(feed::get_feed)
        .service(feed::get_sample)
        .service(feed::get_friends_feed)
        .service(feed::remove_feed_item)
        .service(social::send_follow_request)
        .service(social::list_follow_requests)
        .service(social::reconcile_follows)
        .service(social::accept_follow_request)
        .service(social::decline_follow_request)
        .service(social::unfollow)
        .service(social::list_followers)
        .service(social::list_following)
        .service(social::discover)
        .service(social::get_relationship)
        .service(shares::share)
        .service(shares::shared_feed)
        .service(shares::unshare)
        .service(shares::vote)
        .service(shares::tally);
}
