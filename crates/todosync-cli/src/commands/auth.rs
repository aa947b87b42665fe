use anyhow::{Context, Result};
use clap::Args;
use todosync_application::AppContext;
use todosync_core::user::{Credentials, UserProfile};

#[derive(Args)]
pub struct CredentialArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long, env = "TODOSYNC_PASSWORD", hide_env_values = true)]
    pub password: String,
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Credentials::new(args.username, args.password)
    }
}

pub async fn register(ctx: &AppContext, args: CredentialArgs) -> Result<()> {
    let profile = ctx
        .auth()
        .register(&args.into())
        .await
        .context("Registration failed")?;
    println!("Registered {}", display_name(&profile));
    Ok(())
}

pub async fn login(ctx: &AppContext, args: CredentialArgs) -> Result<()> {
    let username = args.username.clone();
    let user = ctx
        .auth()
        .login(&args.into())
        .await
        .context("Login failed")?;
    let name = user.as_ref().map(display_name).unwrap_or(username);
    println!("Logged in as {name}");
    Ok(())
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    if !ctx.session().is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    if !ctx.auth().logout().await {
        eprintln!("⚠️  Server did not confirm the logout; the local session was removed anyway.");
    }
    println!("Logged out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let profile = ctx.auth().profile().await.context("Failed to load profile")?;
    println!("{}", serde_json::to_string_pretty(profile.fields())?);
    Ok(())
}

pub async fn refresh(ctx: &AppContext) -> Result<()> {
    ctx.auth().refresh().await.context("Token refresh failed")?;
    println!("Session refreshed");
    Ok(())
}

pub fn display_name(profile: &UserProfile) -> String {
    profile
        .username()
        .or(profile.id())
        .unwrap_or("<unknown>")
        .to_string()
}
