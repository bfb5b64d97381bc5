mod common;

use reqwest::StatusCode;
use uuid::Uuid;

use leadhub::auth::scope::LeadScope;
use leadhub::db;

// ── Health & auth gating ────────────────────────────────────────

#[tokio::test]
async fn health_returns_ok() {
    let app = common::spawn_app().await;

    let client = app.client();
    let (status, body) = app.get(&client, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");

    common::cleanup(app).await;
}

#[tokio::test]
async fn unauthenticated_access_redirects_to_login() {
    let app = common::spawn_app().await;
    let client = app.client();

    for path in ["/leads", "/leads/create", "/leads/categories", "/agents"] {
        let resp = client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "no redirect for {path}");
        assert_eq!(
            resp.headers().get("location").unwrap().to_str().unwrap(),
            "/auth/login"
        );
    }

    common::cleanup(app).await;
}

// ── Signup ──────────────────────────────────────────────────────

#[tokio::test]
async fn signup_then_login_reaches_lead_list() {
    let app = common::spawn_app().await;

    let (client, _org) = app.organizer("Jo Field", "jo@example.com").await;

    let (status, body) = app.get(&client, "/leads").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Leads"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn duplicate_signup_redisplays_form() {
    let app = common::spawn_app().await;
    let (_client, _org) = app.organizer("Jo Field", "jo@example.com").await;

    let other = app.client();
    let (status, body) = app
        .signup(&other, "Other", "jo@example.com", "password123")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("already registered"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn signup_rejects_short_password() {
    let app = common::spawn_app().await;

    let client = app.client();
    let (status, body) = app.signup(&client, "Jo", "jo@example.com", "short").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("at least 8 characters"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    common::cleanup(app).await;
}

#[tokio::test]
async fn signup_seeds_default_pipeline_stages() {
    let app = common::spawn_app().await;
    let (client, _org) = app.organizer("Jo Field", "jo@example.com").await;

    let (status, body) = app.get(&client, "/leads/categories").await;
    assert_eq!(status, StatusCode::OK);
    for stage in ["New", "Contacted", "Converted", "Unconverted"] {
        assert!(body.contains(stage), "missing stage {stage}");
    }

    common::cleanup(app).await;
}

// ── Login throttling ────────────────────────────────────────────

#[tokio::test]
async fn login_throttled_after_repeated_failures() {
    let app = common::spawn_app().await;
    let (_client, _org) = app.organizer("Jo Field", "jo@example.com").await;

    let client = app.client();
    for _ in 0..5 {
        let (status, _) = app.login(&client, "jo@example.com", "wrongpassword").await;
        assert_eq!(status, StatusCode::OK);
    }

    // Sixth attempt is blocked even with the right password
    let (status, body) = app.login(&client, "jo@example.com", "password123").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Too many login attempts"));

    common::cleanup(app).await;
}

// ── Lead creation ───────────────────────────────────────────────

#[tokio::test]
async fn created_lead_is_unassigned_and_in_creator_organization() {
    let app = common::spawn_app().await;
    let (client, org) = app.organizer("Jo Field", "jo@example.com").await;

    let lead_id = app
        .create_lead(&client, "Jane", "Doe", "jane@lead.com")
        .await;

    let (organization_id, agent_id): (Uuid, Option<Uuid>) =
        sqlx::query_as("SELECT organization_id, agent_id FROM leads WHERE id = $1")
            .bind(lead_id)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(organization_id, org);
    assert_eq!(agent_id, None);

    // Shows up in the organizer's unassigned section
    let (status, body) = app.get(&client, "/leads").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Jane Doe"));
    assert!(body.contains("Assign an agent"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn lead_create_ignores_client_supplied_organization() {
    let app = common::spawn_app().await;
    let (client_a, org_a) = app.organizer("Org A", "a@example.com").await;
    let (_client_b, org_b) = app.organizer("Org B", "b@example.com").await;

    // A forged organization field is dropped on the floor
    let resp = client_a
        .post(app.url("/leads/create"))
        .form(&[
            ("first_name", "Jane"),
            ("last_name", "Doe"),
            ("age", "30"),
            ("phone", "555-0100"),
            ("email", "jane@lead.com"),
            ("description", ""),
            ("organization_id", &org_b.to_string()),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let organization_id: Uuid =
        sqlx::query_scalar("SELECT organization_id FROM leads WHERE email = 'jane@lead.com'")
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(organization_id, org_a);

    common::cleanup(app).await;
}

#[tokio::test]
async fn invalid_lead_form_redisplays_and_persists_nothing() {
    let app = common::spawn_app().await;
    let (client, _org) = app.organizer("Jo Field", "jo@example.com").await;

    let resp = client
        .post(app.url("/leads/create"))
        .form(&[
            ("first_name", ""),
            ("last_name", "Doe"),
            ("age", "not-a-number"),
            ("phone", "555-0100"),
            ("email", "jane@lead.com"),
            ("description", ""),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = resp.text().await.unwrap();
    assert!(body.contains("First name is required."));
    assert!(body.contains("Age must be a non-negative number."));
    // The valid fields come back filled in
    assert!(body.contains("value=\"Doe\""));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    common::cleanup(app).await;
}

// ── Scoped listing ──────────────────────────────────────────────

#[tokio::test]
async fn organizer_listing_splits_assigned_and_unassigned() {
    let app = common::spawn_app().await;
    let (client, org) = app.organizer("Jo Field", "jo@example.com").await;
    let agent_id = app
        .create_agent(&client, "Amy Agent", "amy@example.com", "agentpass123")
        .await;

    let assigned = app
        .create_lead(&client, "Jane", "Doe", "jane@lead.com")
        .await;
    let unassigned = app
        .create_lead(&client, "John", "Roe", "john@lead.com")
        .await;
    assert_eq!(
        app.assign_agent(&client, assigned, agent_id).await,
        StatusCode::SEE_OTHER
    );

    let scope = LeadScope::Organization(org);
    let listed: Vec<Uuid> = db::leads::list(&app.pool, &scope)
        .await
        .unwrap()
        .iter()
        .map(|l| l.id)
        .collect();
    let pool: Vec<Uuid> = db::leads::list_unassigned(&app.pool, org)
        .await
        .unwrap()
        .iter()
        .map(|l| l.id)
        .collect();

    assert_eq!(listed, vec![assigned]);
    assert_eq!(pool, vec![unassigned]);

    common::cleanup(app).await;
}

#[tokio::test]
async fn agent_sees_only_their_own_leads() {
    let app = common::spawn_app().await;
    let (organizer, _org) = app.organizer("Jo Field", "jo@example.com").await;
    let amy = app
        .create_agent(&organizer, "Amy Agent", "amy@example.com", "agentpass123")
        .await;
    let ben = app
        .create_agent(&organizer, "Ben Agent", "ben@example.com", "agentpass123")
        .await;

    let amys_lead = app
        .create_lead(&organizer, "Jane", "Doe", "jane@lead.com")
        .await;
    let bens_lead = app
        .create_lead(&organizer, "John", "Roe", "john@lead.com")
        .await;
    let loose_lead = app
        .create_lead(&organizer, "Jim", "Poe", "jim@lead.com")
        .await;
    app.assign_agent(&organizer, amys_lead, amy).await;
    app.assign_agent(&organizer, bens_lead, ben).await;

    let amy_client = app.agent_client("amy@example.com", "agentpass123").await;
    let (status, body) = app.get(&amy_client, "/leads").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Jane Doe"));
    assert!(!body.contains("John Roe"));
    assert!(!body.contains("Jim Poe"));

    // Out-of-scope details are indistinguishable from missing rows
    let (status, _) = app.get(&amy_client, &format!("/leads/{bens_lead}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&amy_client, &format!("/leads/{loose_lead}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get(&amy_client, &format!("/leads/{amys_lead}")).await;
    assert_eq!(status, StatusCode::OK);

    common::cleanup(app).await;
}

#[tokio::test]
async fn other_organizations_leads_are_not_found() {
    let app = common::spawn_app().await;
    let (client_a, _org_a) = app.organizer("Org A", "a@example.com").await;
    let (client_b, _org_b) = app.organizer("Org B", "b@example.com").await;

    let lead = app
        .create_lead(&client_a, "Jane", "Doe", "jane@lead.com")
        .await;

    for path in [
        format!("/leads/{lead}"),
        format!("/leads/{lead}/update"),
        format!("/leads/{lead}/delete"),
        format!("/leads/{lead}/assign-agent"),
        format!("/leads/{lead}/category"),
    ] {
        let (status, _) = app.get(&client_b, &path).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "leaked {path}");
    }

    common::cleanup(app).await;
}

// ── Role gates ──────────────────────────────────────────────────

#[tokio::test]
async fn agent_cannot_use_organizer_endpoints() {
    let app = common::spawn_app().await;
    let (organizer, _org) = app.organizer("Jo Field", "jo@example.com").await;
    let amy = app
        .create_agent(&organizer, "Amy Agent", "amy@example.com", "agentpass123")
        .await;
    let lead = app
        .create_lead(&organizer, "Jane", "Doe", "jane@lead.com")
        .await;
    app.assign_agent(&organizer, lead, amy).await;

    let amy_client = app.agent_client("amy@example.com", "agentpass123").await;

    // Even on her own lead, editing stays organizer-only
    let (status, _) = app.get(&amy_client, &format!("/leads/{lead}/update")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let resp = amy_client
        .post(app.url(&format!("/leads/{lead}/update")))
        .form(&[("first_name", "Hacked")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let (status, _) = app.get(&amy_client, "/leads/create").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.get(&amy_client, "/agents").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let first_name: String = sqlx::query_scalar("SELECT first_name FROM leads WHERE id = $1")
        .bind(lead)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(first_name, "Jane");

    common::cleanup(app).await;
}

// ── Assignment ──────────────────────────────────────────────────

#[tokio::test]
async fn assignment_moves_lead_into_agents_scope() {
    let app = common::spawn_app().await;
    let (organizer, org) = app.organizer("Jo Field", "jo@example.com").await;
    let amy = app
        .create_agent(&organizer, "Amy Agent", "amy@example.com", "agentpass123")
        .await;
    let lead = app
        .create_lead(&organizer, "Jane", "Doe", "jane@lead.com")
        .await;

    assert_eq!(
        app.assign_agent(&organizer, lead, amy).await,
        StatusCode::SEE_OTHER
    );

    assert!(db::leads::list_unassigned(&app.pool, org)
        .await
        .unwrap()
        .is_empty());

    let amy_client = app.agent_client("amy@example.com", "agentpass123").await;
    let (status, body) = app.get(&amy_client, "/leads").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Jane Doe"));

    // Re-assigning to the same agent is a no-op, not an error
    assert_eq!(
        app.assign_agent(&organizer, lead, amy).await,
        StatusCode::SEE_OTHER
    );

    common::cleanup(app).await;
}

#[tokio::test]
async fn cross_organization_assignment_is_rejected() {
    let app = common::spawn_app().await;
    let (client_a, _org_a) = app.organizer("Org A", "a@example.com").await;
    let (client_b, _org_b) = app.organizer("Org B", "b@example.com").await;
    let foreign_agent = app
        .create_agent(&client_b, "Ben Agent", "ben@example.com", "agentpass123")
        .await;

    let lead = app
        .create_lead(&client_a, "Jane", "Doe", "jane@lead.com")
        .await;

    assert_eq!(
        app.assign_agent(&client_a, lead, foreign_agent).await,
        StatusCode::BAD_REQUEST
    );

    let agent_id: Option<Uuid> = sqlx::query_scalar("SELECT agent_id FROM leads WHERE id = $1")
        .bind(lead)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(agent_id, None);

    common::cleanup(app).await;
}

// ── Update & delete ─────────────────────────────────────────────

#[tokio::test]
async fn update_persists_changes() {
    let app = common::spawn_app().await;
    let (client, _org) = app.organizer("Jo Field", "jo@example.com").await;
    let lead = app
        .create_lead(&client, "Jane", "Doe", "jane@lead.com")
        .await;

    let resp = client
        .post(app.url(&format!("/leads/{lead}/update")))
        .form(&[
            ("first_name", "Janet"),
            ("last_name", "Doe"),
            ("age", "31"),
            ("phone", "555-0199"),
            ("email", "janet@lead.com"),
            ("description", "Called back"),
            ("agent_id", ""),
            ("category_id", ""),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let (first_name, age): (String, i32) =
        sqlx::query_as("SELECT first_name, age FROM leads WHERE id = $1")
            .bind(lead)
            .fetch_one(&app.pool)
            .await
            .unwrap();
    assert_eq!(first_name, "Janet");
    assert_eq!(age, 31);

    common::cleanup(app).await;
}

#[tokio::test]
async fn delete_removes_lead() {
    let app = common::spawn_app().await;
    let (client, _org) = app.organizer("Jo Field", "jo@example.com").await;
    let lead = app
        .create_lead(&client, "Jane", "Doe", "jane@lead.com")
        .await;

    let resp = client
        .post(app.url(&format!("/leads/{lead}/delete")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM leads WHERE id = $1")
        .bind(lead)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    common::cleanup(app).await;
}

// ── Agent lifecycle ─────────────────────────────────────────────

#[tokio::test]
async fn deleting_agent_unassigns_leads_without_deleting_them() {
    let app = common::spawn_app().await;
    let (organizer, _org) = app.organizer("Jo Field", "jo@example.com").await;
    let amy = app
        .create_agent(&organizer, "Amy Agent", "amy@example.com", "agentpass123")
        .await;
    let lead = app
        .create_lead(&organizer, "Jane", "Doe", "jane@lead.com")
        .await;
    app.assign_agent(&organizer, lead, amy).await;

    let resp = organizer
        .post(app.url(&format!("/agents/{amy}/delete")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    // Lead survives with the assignment cleared; the account is gone
    let agent_id: Option<Uuid> = sqlx::query_scalar("SELECT agent_id FROM leads WHERE id = $1")
        .bind(lead)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(agent_id, None);

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'amy@example.com'")
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(users, 0);

    common::cleanup(app).await;
}

// ── Categories ──────────────────────────────────────────────────

#[tokio::test]
async fn assigned_agent_can_recategorize_but_others_cannot() {
    let app = common::spawn_app().await;
    let (organizer, org) = app.organizer("Jo Field", "jo@example.com").await;
    let amy = app
        .create_agent(&organizer, "Amy Agent", "amy@example.com", "agentpass123")
        .await;
    let _ben = app
        .create_agent(&organizer, "Ben Agent", "ben@example.com", "agentpass123")
        .await;
    let lead = app
        .create_lead(&organizer, "Jane", "Doe", "jane@lead.com")
        .await;
    app.assign_agent(&organizer, lead, amy).await;

    let converted = app.category_id(org, "Converted").await;

    let amy_client = app.agent_client("amy@example.com", "agentpass123").await;
    let resp = amy_client
        .post(app.url(&format!("/leads/{lead}/category")))
        .form(&[("category_id", converted.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    let category_id: Option<Uuid> = sqlx::query_scalar("SELECT category_id FROM leads WHERE id = $1")
        .bind(lead)
        .fetch_one(&app.pool)
        .await
        .unwrap();
    assert_eq!(category_id, Some(converted));

    // A different agent of the same organization gets a 404
    let ben_client = app.agent_client("ben@example.com", "agentpass123").await;
    let resp = ben_client
        .post(app.url(&format!("/leads/{lead}/category")))
        .form(&[("category_id", converted.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}

#[tokio::test]
async fn cross_organization_category_is_rejected() {
    let app = common::spawn_app().await;
    let (client_a, _org_a) = app.organizer("Org A", "a@example.com").await;
    let (_client_b, org_b) = app.organizer("Org B", "b@example.com").await;

    let lead = app
        .create_lead(&client_a, "Jane", "Doe", "jane@lead.com")
        .await;
    let foreign_category = app.category_id(org_b, "New").await;

    let resp = client_a
        .post(app.url(&format!("/leads/{lead}/category")))
        .form(&[("category_id", foreign_category.to_string())])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    common::cleanup(app).await;
}

#[tokio::test]
async fn category_list_shows_in_scope_uncategorized_count() {
    let app = common::spawn_app().await;
    let (organizer, _org) = app.organizer("Jo Field", "jo@example.com").await;
    let amy = app
        .create_agent(&organizer, "Amy Agent", "amy@example.com", "agentpass123")
        .await;

    let assigned = app
        .create_lead(&organizer, "Jane", "Doe", "jane@lead.com")
        .await;
    app.create_lead(&organizer, "John", "Roe", "john@lead.com")
        .await;
    app.assign_agent(&organizer, assigned, amy).await;

    // Organizer counts the whole organization
    let (status, body) = app.get(&organizer, "/leads/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("2 uncategorized"));

    // The agent counts only their own leads
    let amy_client = app.agent_client("amy@example.com", "agentpass123").await;
    let (status, body) = app.get(&amy_client, "/leads/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("1 uncategorized"));

    common::cleanup(app).await;
}

#[tokio::test]
async fn category_detail_is_organization_scoped() {
    let app = common::spawn_app().await;
    let (client_a, org_a) = app.organizer("Org A", "a@example.com").await;
    let (client_b, _org_b) = app.organizer("Org B", "b@example.com").await;

    let category = app.category_id(org_a, "New").await;

    let (status, body) = app.get(&client_a, &format!("/leads/categories/{category}")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("New"));

    let (status, _) = app.get(&client_b, &format!("/leads/categories/{category}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    common::cleanup(app).await;
}
