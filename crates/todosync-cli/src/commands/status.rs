use anyhow::Result;
use todosync_core::session::SESSION_TTL;

use super::auth::display_name;
use super::context::Loaded;

pub fn run(loaded: &Loaded) -> Result<()> {
    let ctx = &loaded.ctx;
    let session = ctx.session().snapshot();

    println!("📡 API:          {}", ctx.config().api.normalized_base_url());
    println!("⚙️  Config:       {}", loaded.config_path.display());
    println!("💾 Session file: {}", loaded.session_path.display());

    if !session.is_authenticated {
        println!("🔒 Not logged in");
        return Ok(());
    }

    let user = session
        .user
        .as_ref()
        .map(display_name)
        .unwrap_or_else(|| "<unknown>".to_string());
    println!("🔓 Logged in as {user}");
    if let Some(login_time) = session.login_time {
        println!("   since   {}", login_time.to_rfc3339());
        println!("   expires {}", (login_time + SESSION_TTL).to_rfc3339());
    }
    Ok(())
}
