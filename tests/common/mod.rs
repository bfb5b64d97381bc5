use std::net::SocketAddr;

use reqwest::{Client, StatusCode};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use leadhub::auth::password;
use leadhub::config::Config;

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub db_name: String,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// A browser-like client with its own cookie jar. Redirects are not
    /// followed so tests can assert on them.
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap()
    }

    pub async fn signup(
        &self,
        client: &Client,
        name: &str,
        email: &str,
        password: &str,
    ) -> (StatusCode, String) {
        let resp = client
            .post(self.url("/auth/signup"))
            .form(&[
                ("name", name),
                ("email", email),
                ("password", password),
                ("confirm_password", password),
            ])
            .send()
            .await
            .expect("signup request failed");
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        (status, body)
    }

    pub async fn login(&self, client: &Client, email: &str, password: &str) -> (StatusCode, String) {
        let resp = client
            .post(self.url("/auth/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        (status, body)
    }

    /// Sign up and log in an organizer. Returns the logged-in client and
    /// the organization (profile) id.
    pub async fn organizer(&self, name: &str, email: &str) -> (Client, Uuid) {
        let client = self.client();

        let (status, body) = self.signup(&client, name, email, "password123").await;
        assert_eq!(status, StatusCode::SEE_OTHER, "signup failed: {body}");

        let (status, body) = self.login(&client, email, "password123").await;
        assert_eq!(status, StatusCode::SEE_OTHER, "login failed: {body}");

        let org: Uuid = sqlx::query_scalar(
            "SELECT p.id FROM profiles p JOIN users u ON u.id = p.user_id WHERE u.email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .expect("organizer profile missing");

        (client, org)
    }

    /// Create an agent through the organizer UI, then set a known
    /// password directly (the real one only goes out by email).
    /// Returns the agent row id.
    pub async fn create_agent(
        &self,
        organizer: &Client,
        name: &str,
        email: &str,
        password: &str,
    ) -> Uuid {
        let resp = organizer
            .post(self.url("/agents/create"))
            .form(&[("name", name), ("email", email)])
            .send()
            .await
            .expect("create agent request failed");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "create agent failed");

        let (user_id, agent_id): (Uuid, Uuid) = sqlx::query_as(
            "SELECT u.id, a.id FROM users u JOIN agents a ON a.user_id = u.id WHERE u.email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .expect("agent row missing");

        let hash = password::hash(password).unwrap();
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(hash)
            .execute(&self.pool)
            .await
            .unwrap();

        agent_id
    }

    /// Log a (previously created) agent in with a fresh client.
    pub async fn agent_client(&self, email: &str, password: &str) -> Client {
        let client = self.client();
        let (status, body) = self.login(&client, email, password).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "agent login failed: {body}");
        client
    }

    /// Create a lead through the organizer UI; the lead's email doubles
    /// as the lookup key, so keep it unique per test.
    pub async fn create_lead(
        &self,
        organizer: &Client,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> Uuid {
        let resp = organizer
            .post(self.url("/leads/create"))
            .form(&[
                ("first_name", first_name),
                ("last_name", last_name),
                ("age", "30"),
                ("phone", "555-0100"),
                ("email", email),
                ("description", "Test lead"),
                ("agent_id", ""),
                ("category_id", ""),
            ])
            .send()
            .await
            .expect("create lead request failed");
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "create lead failed");

        sqlx::query_scalar("SELECT id FROM leads WHERE email = $1")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .expect("lead row missing")
    }

    pub async fn assign_agent(&self, organizer: &Client, lead_id: Uuid, agent_id: Uuid) -> StatusCode {
        organizer
            .post(self.url(&format!("/leads/{lead_id}/assign-agent")))
            .form(&[("agent_id", agent_id.to_string())])
            .send()
            .await
            .expect("assign agent request failed")
            .status()
    }

    pub async fn get(&self, client: &Client, path: &str) -> (StatusCode, String) {
        let resp = client
            .get(self.url(path))
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        (status, body)
    }

    pub async fn category_id(&self, organization_id: Uuid, name: &str) -> Uuid {
        sqlx::query_scalar("SELECT id FROM categories WHERE organization_id = $1 AND name = $2")
            .bind(organization_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .expect("category missing")
    }
}

/// Spawn a test app with a fresh temporary database.
pub async fn spawn_app() -> TestApp {
    let _ = dotenvy::dotenv();

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");

    // Create a unique test database
    let db_name = format!(
        "leadhub_test_{}",
        Uuid::now_v7().to_string().replace('-', "")
    );

    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = Config {
        database_url: test_url,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to a random port
        base_url: "http://localhost:0".to_string(),
        log_level: "warn".to_string(),
        smtp: None,
    };

    let app = leadhub::build_app(pool.clone(), config);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    TestApp {
        addr,
        pool,
        db_name,
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}
