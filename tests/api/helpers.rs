use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration, NaiveDate};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use fitness_gym::core::config::ApplicationConfig;
use fitness_gym::core::jwt_auth::{SessionKeys, SessionUser};
use fitness_gym::core::{get_subscriber, init_subscriber, AppError, AppErrorType, Mailer};
use fitness_gym::db::users::NewUser;
use fitness_gym::db::{coaches, plans, run_migrations, users};
use fitness_gym::gym_web_server::AppState;
use fitness_gym::models::coaches::CoachDetails;
use fitness_gym::models::plans::Money;
use fitness_gym::models::tokens::TokenPurpose;
use fitness_gym::models::users::{Role, UserStatus};
use once_cell::sync::Lazy;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

// Set TEST_LOG to see the logs of a failing test.
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    };
});

pub const PASSWORD: &str = "correct-horse";

static NEXT_EMAIL: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Keeps every outgoing email; fails all sends when built with `failing`.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl Mailer for RecordingMailer {
    fn send_html(&self, to_email: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError {
                error_type: AppErrorType::EmailError,
                message: Some("SMTP relay unreachable".to_string()),
                cause: None,
            });
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to_email.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

pub struct TestApp {
    pub pool: SqlitePool,
    pub keys: SessionKeys,
    pub mailer: Arc<RecordingMailer>,
    pub app: ApplicationConfig,
}

pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");
    run_migrations(&pool).await.expect("Failed to migrate the database");
    pool
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::with_mailer(RecordingMailer::default()).await
    }

    pub async fn with_mailer(mailer: RecordingMailer) -> Self {
        Lazy::force(&TRACING);

        Self {
            pool: test_pool().await,
            keys: SessionKeys::new(b"integration-secret", Duration::hours(24)),
            mailer: Arc::new(mailer),
            app: ApplicationConfig {
                frontend_url: "http://gym.test".to_string(),
                verification_token_hours: 24,
                reset_token_minutes: 60,
            },
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.pool.clone(),
            self.keys.clone(),
            self.mailer.clone(),
            self.app.clone(),
        )
    }

    pub fn bearer(&self, session: &SessionUser) -> (&'static str, String) {
        let issued = self
            .keys
            .issue(session.user_id, &session.email, session.role)
            .unwrap();
        ("Authorization", format!("Bearer {}", issued.token))
    }

    /// Inserts an account directly, storing `password` as given.
    pub async fn seed_user_with(
        &self,
        role: Role,
        status: UserStatus,
        email_verified: bool,
        password: &str,
    ) -> SessionUser {
        let name: String = Name().fake();
        let email: String = SafeEmail().fake();
        let email = format!("{}.{}", NEXT_EMAIL.fetch_add(1, Ordering::Relaxed), email).to_lowercase();

        let user_id = users::insert_user(
            &self.pool,
            &NewUser {
                name: &name,
                email: &email,
                password_hash: password,
                phone: None,
                address: None,
                birth_date: None,
                role,
                status,
                email_verified,
            },
        )
        .await
        .unwrap();

        SessionUser {
            user_id,
            role,
            email,
        }
    }

    pub async fn seed_user(&self, role: Role) -> SessionUser {
        self.seed_user_with(role, UserStatus::Active, true, PASSWORD).await
    }

    /// Returns the coach row id together with the coach's session.
    pub async fn seed_coach(&self) -> (i64, SessionUser) {
        let session = self.seed_user(Role::Coach).await;
        let coach_id = coaches::insert_coach(&self.pool, session.user_id, &CoachDetails::default())
            .await
            .unwrap();
        (coach_id, session)
    }

    pub async fn seed_plan(&self, base_price_cents: i64) -> i64 {
        plans::insert_plan(&self.pool, "Standard", Some("Gym floor access"), Money::from_cents(base_price_cents))
            .await
            .unwrap()
    }

    pub async fn open_token(&self, user_id: i64, purpose: TokenPurpose) -> Option<String> {
        sqlx::query_scalar::<_, String>(
            "SELECT token FROM user_tokens WHERE user_id = ? AND purpose = ? AND consumed_at IS NULL",
        )
        .bind(user_id)
        .bind(purpose)
        .fetch_optional(&self.pool)
        .await
        .unwrap()
    }

    pub async fn active_subscriptions(&self, user_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM subscriptions WHERE user_id = ? AND status = 'active'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }

    pub async fn open_assignments(&self, client_id: i64) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM coach_client_assignments WHERE client_id = ? AND status IN ('pending', 'active')",
        )
        .bind(client_id)
        .fetch_one(&self.pool)
        .await
        .unwrap()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
