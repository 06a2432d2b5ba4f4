use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::TokenKeys;
use crate::middleware::{AccessGuard, RequestLog, RequireRole};
use crate::routes::{
    admin_route, current_user, health_check, refresh_token, sign_in, sign_out, sign_up,
};
use crate::store::IdentityStore;

/// Builds the full route tree against a store and key set.
///
/// Shared between `run` and the integration tests so both drive the exact
/// same app configuration.
pub fn app_config(
    store: web::Data<dyn IdentityStore>,
    keys: TokenKeys,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(store)
            .app_data(web::Data::new(keys.clone()))
            // Public routes (no authentication required)
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/sign-up", web::post().to(sign_up))
                    .route("/sign-in", web::post().to(sign_in))
                    .route("/refresh-token", web::get().to(refresh_token))
                    // Protected routes (require a valid access token)
                    .service(
                        web::resource("/sign-out")
                            .wrap(AccessGuard::new(keys.clone()))
                            .route(web::get().to(sign_out)),
                    )
                    .service(
                        web::resource("/current-user")
                            .wrap(AccessGuard::new(keys.clone()))
                            .route(web::get().to(current_user)),
                    )
                    // Guard runs first (outermost), then the role gate.
                    .service(
                        web::resource("/admin-route")
                            .wrap(RequireRole::admin())
                            .wrap(AccessGuard::new(keys))
                            .route(web::get().to(admin_route)),
                    ),
            );
    }
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn IdentityStore>,
    keys: TokenKeys,
) -> Result<Server, std::io::Error> {
    let store = web::Data::from(store);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(RequestLog)
            .configure(app_config(store.clone(), keys.clone()))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
