use actix_cors::Cors;
use actix_web::{http::header, middleware::Logger, web, App, HttpServer};
use dotenvy::dotenv;

use prova_server::{
    app_state::AppState,
    auth::{AuthMiddleware, JwtService},
    config::Config,
    handlers,
    services::ExpirySweeper,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    if matches!(std::env::var("APP_ENV").as_deref(), Ok("production")) {
        config.validate_for_production();
    }

    let state = AppState::new(config.clone())
        .await
        .expect("failed to initialize application state");
    let jwt_service = JwtService::new(&config.jwt_secret);

    // Server-owned expiry: abandoned attempts are closed even if no client
    // ever calls finalize.
    let sweeper = ExpirySweeper::new(
        state.attempt_service.clone(),
        config.sweep_interval_seconds,
        config.sweep_grace_seconds,
    );
    sweeper.start().await;

    let bind_addr = (config.web_server_host.clone(), config.web_server_port);
    log::info!("Starting HTTP server on {}:{}", bind_addr.0, bind_addr.1);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(state.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .wrap(Logger::default())
            .wrap(cors)
            .service(handlers::health_check)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .service(handlers::list_eligibility)
                    .service(handlers::get_test_content)
                    .service(handlers::start_attempt)
                    .service(handlers::get_attempt_state)
                    .service(handlers::save_answer)
                    .service(handlers::finalize_attempt)
                    .service(handlers::assign_test)
                    .service(handlers::results_report),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
