use crate::core::config::ApplicationConfig;
use crate::core::jwt_auth::SessionKeys;
use crate::core::{AppConfig, AppError, EmailService, Mailer};
use crate::db::run_migrations;
use crate::routes::gym_routes;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::{self, Data, ServiceConfig};
use actix_web::{dev::Server, App, HttpServer};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

pub struct GymWebServer {
    port: u16,
    server: Server,
}

impl GymWebServer {
    pub async fn build(configuration: AppConfig) -> Result<Self, anyhow::Error> {
        let address = format!(
            "{}:{}",
            configuration.server.host, configuration.server.port
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(configuration.database.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect_with(configuration.database.connect()?)
            .await?;
        run_migrations(&pool).await?;

        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let state = AppState::new(
            pool,
            SessionKeys::from_config(&configuration.jwt),
            Arc::new(EmailService::new(configuration.smtp)),
            configuration.app,
        );
        let server = run(listener, state)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

/// Shared handles every worker receives.
#[derive(Clone)]
pub struct AppState {
    pool: Data<SqlitePool>,
    keys: Data<SessionKeys>,
    mailer: Data<dyn Mailer>,
    app: Data<ApplicationConfig>,
}

impl AppState {
    pub fn new(
        pool: SqlitePool,
        keys: SessionKeys,
        mailer: Arc<dyn Mailer>,
        app: ApplicationConfig,
    ) -> Self {
        Self {
            pool: Data::new(pool),
            keys: Data::new(keys),
            mailer: Data::from(mailer),
            app: Data::new(app),
        }
    }

    /// Registers app data, extractor error handlers and the routes.
    pub fn configure(&self, conf: &mut ServiceConfig) {
        conf.app_data(self.pool.clone())
            .app_data(self.keys.clone())
            .app_data(self.mailer.clone())
            .app_data(self.app.clone())
            .app_data(web::JsonConfig::default().error_handler(|err, _| {
                AppError::bad_request(err.to_string()).into()
            }))
            .app_data(web::QueryConfig::default().error_handler(|err, _| {
                AppError::bad_request(err.to_string()).into()
            }))
            .app_data(web::PathConfig::default().error_handler(|err, _| {
                AppError::bad_request(err.to_string()).into()
            }));
        gym_routes(conf);
    }
}

pub fn run(listener: TcpListener, state: AppState) -> Result<Server, anyhow::Error> {
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allowed_headers(vec![
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                header::ACCEPT,
            ])
            .supports_credentials();
        App::new()
            .configure(|conf| state.configure(conf))
            .wrap(cors)
            .wrap(TracingLogger::default())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
