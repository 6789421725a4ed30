//! End-to-end signup walkthrough against a live Supabase project.
//!
//! Creates a throwaway account, runs the provisioning sequence, signs the
//! account in, and reads its profile back. Needs SUPABASE_URL and
//! SUPABASE_ANON_KEY in the environment or a .env file.
//!
//! Run with: cargo run -p radboard-app --example signup_flow

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use radboard_app::{AccountProvisioner, SessionContext};
use radboard_models::{Role, SignUpRequest};
use radboard_supabase::SupabaseClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = EnvFilter::from_default_env().add_directive("radboard=info".parse()?);
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(true).with_target(true))
        .with(env_filter)
        .init();

    let client = SupabaseClient::from_env()?;

    let request = SignUpRequest {
        email: format!("signup-flow+{}@example.com", chrono::Utc::now().timestamp()),
        password: "flow-check-123".to_string(),
        role: Role::Tech,
        first_name: "Flow".to_string(),
        last_name: "Check".to_string(),
    };

    println!("signup-flow: creating account {}", request.email);
    let provisioner = AccountProvisioner::new(client.clone());
    let outcome = provisioner.provision(&request).await?;
    println!(
        "signup-flow: account {} provisioned, profile {:?}",
        outcome.account_id, outcome.profile_status
    );
    if let Some(warning) = &outcome.warning {
        println!("signup-flow: warning: {}", warning);
    }

    let ctx = SessionContext::new(client);
    let snapshot = ctx.sign_in(&request.email, &request.password).await?;
    println!(
        "signup-flow: signed in as {} with role {:?}",
        snapshot.display_name(),
        snapshot.role()
    );

    ctx.sign_out().await?;
    println!("signup-flow: ok");
    Ok(())
}
