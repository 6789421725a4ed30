//! Page-level service behavior against a mock backend: session and guards,
//! job management, the application pipeline, and profile repair.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, headers, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use radboard_app::{
    guard_page, AppError, ApplicationService, GuardOutcome, JobService, ProfileService,
    RedirectTarget, SessionContext,
};
use radboard_geo::LocationService;
use radboard_models::{
    ApplicationId, ApplicationStatus, EmploymentType, JobId, JobStatus, JobUpdate, NewJob,
    PayPeriod, ProfileUpdate, Role, UserId, WorkType,
};
use radboard_supabase::{AuthUser, SupabaseClient, SupabaseConfig, UserMetadata};

const ANON_KEY: &str = "anon-test-key";

fn client_for(server: &MockServer) -> SupabaseClient {
    SupabaseClient::new(SupabaseConfig::new(server.uri(), ANON_KEY)).expect("client should build")
}

fn record_json(id: &str, role: &str) -> serde_json::Value {
    json!({
        "id": id,
        "email": "user@example.com",
        "role": role,
        "first_name": "Sam",
        "last_name": "Park",
        "created_at": "2024-03-01T12:00:00Z",
        "updated_at": "2024-03-01T12:00:00Z",
        "tech_profiles": null,
        "employer_profiles": null,
    })
}

fn job_json(id: &str, employer: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "employer_id": employer,
        "title": title,
        "location": "Austin, TX",
        "work_type": "on_site",
        "employment_type": "full_time",
        "description": "CT coverage, level II trauma center",
        "status": "active",
        "created_at": "2024-03-02T08:00:00Z",
        "updated_at": "2024-03-02T08:00:00Z",
    })
}

fn application_json(id: &str, job: &str, tech: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "job_id": job,
        "tech_id": tech,
        "status": status,
        "applied_at": "2024-03-03T09:00:00Z",
        "updated_at": "2024-03-03T09:00:00Z",
    })
}

fn tech_user(id: &str) -> AuthUser {
    AuthUser {
        id: UserId::from_string(id),
        email: Some("user@example.com".to_string()),
        email_confirmed_at: None,
        user_metadata: UserMetadata {
            role: Some(Role::Tech),
            first_name: Some("Sam".to_string()),
            last_name: Some("Park".to_string()),
        },
        created_at: None,
    }
}

fn new_job_form() -> NewJob {
    NewJob {
        employer_id: UserId::from_string("ignored-by-service"),
        title: "CT Technologist".to_string(),
        location: "Austin, TX".to_string(),
        address: None,
        latitude: None,
        longitude: None,
        work_type: WorkType::OnSite,
        employment_type: EmploymentType::FullTime,
        pay_min: Some(38.0),
        pay_max: Some(52.0),
        pay_period: PayPeriod::Hourly,
        description: "CT coverage, level II trauma center".to_string(),
        requirements: vec!["ARRT (CT)".to_string()],
        benefits: Vec::new(),
        shifts: Vec::new(),
        status: JobStatus::Active,
    }
}

// =============================================================================
// Session and guards
// =============================================================================

#[tokio::test]
async fn test_sign_in_builds_snapshot_and_guard_admits_by_role() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "session-jwt",
            "token_type": "bearer",
            "user": { "id": "tech-1", "email": "user@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.tech-1"))
        .and(header("authorization", "Bearer session-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([record_json("tech-1", "tech")])))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = SessionContext::new(client_for(&server));
    let snapshot = ctx
        .sign_in("user@example.com", "pw-123456")
        .await
        .expect("sign-in should succeed");
    assert_eq!(snapshot.role(), Some(Role::Tech));
    assert_eq!(snapshot.display_name(), "Sam Park");

    // Guards answer from the cached snapshot; no further requests.
    let admitted = guard_page(&ctx, Role::Tech).await.expect("guard should run");
    assert!(admitted.is_authorized());

    let bounced = guard_page(&ctx, Role::Employer).await.expect("guard should run");
    match bounced {
        GuardOutcome::Redirect(target) => assert_eq!(target, RedirectTarget::TechHome),
        other => panic!("expected redirect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_guard_redirects_signed_out_visitors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "nobody" })))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = SessionContext::new(client_for(&server));
    let outcome = guard_page(&ctx, Role::Tech).await.expect("guard should run");
    match outcome {
        GuardOutcome::Redirect(target) => assert_eq!(target, RedirectTarget::SignIn),
        other => panic!("expected redirect, got {:?}", other),
    }
}

#[tokio::test]
async fn test_restore_drops_a_rejected_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer stale-jwt"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "msg": "JWT expired" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctx = SessionContext::new(client_for(&server));
    ctx.client().set_access_token("stale-jwt").await;

    let restored = ctx.restore().await.expect("restore should not fail");
    assert!(restored.is_none());
    assert!(ctx.client().access_token().await.is_none());
}

#[tokio::test]
async fn test_wrong_password_reads_as_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error_description": "Invalid login credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = SessionContext::new(client_for(&server));
    let err = ctx
        .sign_in("user@example.com", "wrong")
        .await
        .expect_err("bad password should fail");
    assert!(matches!(err, AppError::InvalidCredentials));
}

// =============================================================================
// Jobs
// =============================================================================

#[tokio::test]
async fn test_browse_joins_company_names_and_viewer_distance() {
    let server = MockServer::start().await;

    let mut austin_job = job_json("j-1", "emp-1", "CT Technologist");
    austin_job["latitude"] = json!(30.2672);
    austin_job["longitude"] = json!(-97.7431);
    let remote_job = job_json("j-2", "emp-2", "Remote QA Reviewer");

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("status", "eq.active"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([austin_job, remote_job])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/employer_profiles"))
        .and(query_param("id", r#"in.("emp-1","emp-2")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "emp-1", "company_name": "Austin Imaging" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = JobService::new(client_for(&server), LocationService::offline());
    // Viewer in Round Rock, a short drive north of downtown Austin.
    let listings = service
        .list_open_jobs(Some((30.5083, -97.6789)))
        .await
        .expect("browse should succeed");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].company_name.as_deref(), Some("Austin Imaging"));
    let distance = listings[0].distance_km.expect("geocoded posting has distance");
    assert!(distance > 20.0 && distance < 40.0, "distance {}", distance);

    assert_eq!(listings[1].company_name, None);
    assert_eq!(listings[1].distance_km, None);
}

#[tokio::test]
async fn test_post_job_stamps_owner_and_pins_from_the_city_table() {
    let server = MockServer::start().await;

    // No key configured, so the pin comes from the offline city table.
    Mock::given(method("POST"))
        .and(path("/rest/v1/jobs"))
        .and(body_partial_json(json!({
            "employer_id": "emp-1",
            "title": "CT Technologist",
            "latitude": 30.2672,
            "longitude": -97.7431,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(job_json("j-9", "emp-1", "CT Technologist")))
        .expect(1)
        .mount(&server)
        .await;

    let service = JobService::new(client_for(&server), LocationService::offline());
    let job = service
        .post_job(&UserId::from_string("emp-1"), new_job_form())
        .await
        .expect("posting should succeed");
    assert_eq!(job.employer_id.as_str(), "emp-1");
}

#[tokio::test]
async fn test_post_job_rejects_inverted_pay_range() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(job_json("j-9", "emp-1", "x")))
        .expect(0)
        .mount(&server)
        .await;

    let mut form = new_job_form();
    form.pay_min = Some(60.0);
    form.pay_max = Some(40.0);

    let service = JobService::new(client_for(&server), LocationService::offline());
    let err = service
        .post_job(&UserId::from_string("emp-1"), form)
        .await
        .expect_err("inverted pay range should be rejected");
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_updating_another_employers_posting_is_forbidden() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.j-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "emp-2", "CT Tech")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = JobService::new(client_for(&server), LocationService::offline());
    let changes = JobUpdate {
        title: Some("Lead CT Tech".to_string()),
        ..JobUpdate::default()
    };
    let err = service
        .update_job(&UserId::from_string("emp-1"), &JobId::from_string("j-1"), changes)
        .await
        .expect_err("foreign posting must be refused");
    assert!(matches!(err, AppError::Forbidden(_)));
}

// =============================================================================
// Applications
// =============================================================================

#[tokio::test]
async fn test_apply_submits_application_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.j-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "emp-1", "CT Tech")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .and(query_param("job_id", "eq.j-1"))
        .and(query_param("tech_id", "eq.tech-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/job_applications"))
        .and(body_partial_json(json!({ "job_id": "j-1", "tech_id": "tech-1" })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(application_json("app-1", "j-1", "tech-1", "pending")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));
    let stored = service
        .apply(
            &UserId::from_string("tech-1"),
            &JobId::from_string("j-1"),
            Some("I cover nights.".to_string()),
        )
        .await
        .expect("application should be submitted");
    assert_eq!(stored.status, ApplicationStatus::Pending);
}

#[tokio::test]
async fn test_apply_twice_is_rejected_before_the_insert() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "emp-1", "CT Tech")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": "app-1" }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/job_applications"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));
    let err = service
        .apply(&UserId::from_string("tech-1"), &JobId::from_string("j-1"), None)
        .await
        .expect_err("second application should be refused");
    assert!(matches!(err, AppError::AlreadyApplied));
}

#[tokio::test]
async fn test_apply_race_maps_duplicate_key_to_already_applied() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "emp-1", "CT Tech")])),
        )
        .mount(&server)
        .await;

    // The pre-check saw nothing, but another tab won the race.
    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/job_applications"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));
    let err = service
        .apply(&UserId::from_string("tech-1"), &JobId::from_string("j-1"), None)
        .await
        .expect_err("duplicate should be refused");
    assert!(matches!(err, AppError::AlreadyApplied));
}

#[tokio::test]
async fn test_apply_to_closed_posting_is_refused() {
    let server = MockServer::start().await;

    let mut closed = job_json("j-1", "emp-1", "CT Tech");
    closed["status"] = json!("closed");
    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([closed])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));
    let err = service
        .apply(&UserId::from_string("tech-1"), &JobId::from_string("j-1"), None)
        .await
        .expect_err("closed posting should refuse applications");
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
async fn test_review_advances_one_step_at_a_time() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .and(query_param("id", "eq.app-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([application_json("app-1", "j-1", "tech-1", "pending")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.j-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "emp-1", "CT Tech")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    // Only the single-step move lands a PATCH.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/job_applications"))
        .and(body_partial_json(json!({ "status": "reviewed" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([application_json("app-1", "j-1", "tech-1", "reviewed")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));
    let employer = UserId::from_string("emp-1");
    let id = ApplicationId::from_string("app-1");

    let err = service
        .update_status(&employer, &id, ApplicationStatus::Interview)
        .await
        .expect_err("skipping review should be refused");
    assert!(matches!(err, AppError::InvalidTransition { .. }));

    let stored = service
        .update_status(&employer, &id, ApplicationStatus::Reviewed)
        .await
        .expect("single-step move should succeed");
    assert_eq!(stored.status, ApplicationStatus::Reviewed);
}

#[tokio::test]
async fn test_tech_application_list_carries_job_and_company() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .and(query_param("tech_id", "eq.tech-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            application_json("app-2", "j-2", "tech-1", "pending"),
            application_json("app-1", "j-1", "tech-1", "reviewed"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", r#"in.("j-1","j-2")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            job_json("j-1", "emp-1", "CT Technologist"),
            job_json("j-2", "emp-2", "MRI Technologist"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/employer_profiles"))
        .and(query_param("id", r#"in.("emp-1","emp-2")"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "emp-1", "company_name": "Austin Imaging" },
            { "id": "emp-2", "company_name": "Hill Country MRI" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));
    let listings = service
        .list_for_tech(&UserId::from_string("tech-1"))
        .await
        .expect("listing should succeed");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].job_title.as_deref(), Some("MRI Technologist"));
    assert_eq!(listings[0].company_name.as_deref(), Some("Hill Country MRI"));
    assert_eq!(listings[1].job_title.as_deref(), Some("CT Technologist"));
    assert_eq!(listings[1].company_name.as_deref(), Some("Austin Imaging"));
}

#[tokio::test]
async fn test_employer_review_list_names_applicants_and_checks_ownership() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/jobs"))
        .and(query_param("id", "eq.j-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([job_json("j-1", "emp-1", "CT Tech")])),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/job_applications"))
        .and(query_param("job_id", "eq.j-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            application_json("app-1", "j-1", "tech-1", "pending"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("select", "id,first_name,last_name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "tech-1", "first_name": "Sam", "last_name": "Park" },
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = ApplicationService::new(client_for(&server));

    let listings = service
        .list_for_job(&UserId::from_string("emp-1"), &JobId::from_string("j-1"))
        .await
        .expect("owner should see the list");
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].applicant_name.as_deref(), Some("Sam Park"));
    assert_eq!(listings[0].job_title.as_deref(), Some("CT Tech"));

    let err = service
        .list_for_job(&UserId::from_string("emp-2"), &JobId::from_string("j-1"))
        .await
        .expect_err("another employer must be refused");
    assert!(matches!(err, AppError::Forbidden(_)));
}

// =============================================================================
// Profile repair
// =============================================================================

#[tokio::test]
async fn test_profile_save_recreates_a_missing_row() {
    let server = MockServer::start().await;

    // First patch hits nothing: the provisioning hole.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.tech-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    // The repair upsert rebuilds the row from the account identity.
    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(headers("prefer", vec!["resolution=merge-duplicates", "return=representation"]))
        .and(body_partial_json(json!({
            "id": "tech-1",
            "email": "user@example.com",
            "role": "tech",
            "first_name": "Sam",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(record_json("tech-1", "tech")))
        .expect(1)
        .mount(&server)
        .await;

    // Second patch applies the original edit against the recreated row.
    let mut patched = record_json("tech-1", "tech");
    patched["phone"] = json!("512-555-0100");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", "eq.tech-1"))
        .and(body_partial_json(json!({ "phone": "512-555-0100" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([patched])))
        .expect(1)
        .mount(&server)
        .await;

    let service = ProfileService::new(client_for(&server));
    let changes = ProfileUpdate {
        phone: Some("512-555-0100".to_string()),
        ..ProfileUpdate::default()
    };
    let profile = service
        .save_base(&tech_user("tech-1"), &changes)
        .await
        .expect("save should repair the missing row");
    assert_eq!(profile.id.as_str(), "tech-1");
    assert_eq!(profile.phone.as_deref(), Some("512-555-0100"));
}
