use crate::{
    api::{admin, leave, statistics, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::leave_list))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    // /leave/{id}/cancel
                    .service(
                        web::resource("/{id}/cancel")
                            .route(web::patch().to(leave::cancel_leave)),
                    ),
            )
            .service(
                web::scope("/admin/leave")
                    // /admin/leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::patch().to(admin::approve_leave)),
                    )
                    // /admin/leave/{id}/pre-approve
                    .service(
                        web::resource("/{id}/pre-approve")
                            .route(web::patch().to(admin::pre_approve_leave)),
                    )
                    // /admin/leave/{id}/mas-approve
                    .service(
                        web::resource("/{id}/mas-approve")
                            .route(web::patch().to(admin::mas_approve_leave)),
                    )
                    // /admin/leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject").route(web::post().to(admin::reject_leave)),
                    )
                    // /admin/leave/{id}/complete
                    .service(
                        web::resource("/{id}/complete")
                            .route(web::patch().to(admin::complete_leave)),
                    ),
            )
            .service(
                web::scope("/users")
                    .service(web::resource("/me").route(web::get().to(users::me)))
                    .service(
                        web::resource("/{id}/advisor")
                            .route(web::put().to(users::assign_advisor)),
                    ),
            )
            .service(web::resource("/statistics").route(web::get().to(statistics::statistics))),
    );
}
