use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::CredentialService;
use crate::middleware::JwtMiddleware;
use crate::routes::{get_current_account, health_check, login, logout, refresh, register};

pub fn run(listener: TcpListener, service: CredentialService) -> Result<Server, std::io::Error> {
    let authenticator = service.clone();
    let service = web::Data::new(service);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(service.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/refresh", web::post().to(refresh))
            // Protected routes (require a valid, unexpired access token)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(authenticator.clone()))
                    .route("/me", web::get().to(get_current_account))
                    .route("/logout", web::post().to(logout)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
