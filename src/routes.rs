use crate::{
    api::{attendance, dashboard},
    auth::{
        handlers,
        middleware::{auth_middleware, require_manager},
    },
    config::Config,
};
use actix_governor::{
    governor::middleware::NoOpMiddleware, Governor, GovernorConfigBuilder, PeerIpKeyExtractor,
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
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            ),
    );

    // Protected routes. auth_middleware attaches the AuthUser; manager
    // resources additionally carry the require_manager gate.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/auth")
                    .service(web::resource("/me").route(web::get().to(handlers::me)))
                    .service(
                        web::resource("/update").route(web::put().to(handlers::update_profile)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/checkin").route(web::post().to(attendance::check_in)),
                    )
                    .service(
                        web::resource("/checkout").route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::today_status)))
                    .service(
                        web::resource("/my-history").route(web::get().to(attendance::my_history)),
                    )
                    .service(
                        web::resource("/my-summary").route(web::get().to(attendance::my_summary)),
                    )
                    .service(
                        web::resource("/all")
                            .wrap(from_fn(require_manager))
                            .route(web::get().to(attendance::all_attendance)),
                    )
                    .service(
                        web::resource("/employee/{id}")
                            .wrap(from_fn(require_manager))
                            .route(web::get().to(attendance::employee_history)),
                    )
                    .service(
                        web::resource("/today-status")
                            .wrap(from_fn(require_manager))
                            .route(web::get().to(attendance::team_today_status)),
                    )
                    .service(
                        web::resource("/summary")
                            .wrap(from_fn(require_manager))
                            .route(web::get().to(attendance::team_summary)),
                    )
                    .service(
                        web::resource("/export")
                            .wrap(from_fn(require_manager))
                            .route(web::get().to(attendance::export_csv)),
                    ),
            )
            .service(
                web::scope("/dashboard")
                    .service(
                        web::resource("/employee")
                            .route(web::get().to(dashboard::employee_dashboard)),
                    )
                    .service(
                        web::resource("/manager")
                            .wrap(from_fn(require_manager))
                            .route(web::get().to(dashboard::manager_dashboard)),
                    ),
            ),
    );
}
