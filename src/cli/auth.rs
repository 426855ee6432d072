use super::context::{with_progress, Context};
use crate::cli::{CredentialArgs, WaitlistArgs};
use crate::config::RemoteConfig;
use crate::session::{AuthClient, Identity, SessionProvider, SignUpOutcome};
use crate::store::{validate_email, WaitlistClient};
use crate::sync::Transition;
use anyhow::anyhow;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::warn;

pub async fn login(config_path: &Path, args: CredentialArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;
    let client = AuthClient::new(require_remote(&ctx)?)?;
    let password = password(args.password)?;

    let identity = client.sign_in(&args.email, &password).await?;
    start_session(&mut ctx, identity).await
}

pub async fn signup(config_path: &Path, args: CredentialArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;
    let client = AuthClient::new(require_remote(&ctx)?)?;
    let password = password(args.password)?;

    match client.sign_up(&args.email, &password).await? {
        SignUpOutcome::SignedIn(identity) => start_session(&mut ctx, identity).await,
        SignUpOutcome::ConfirmationPending => {
            println!(
                "Cuenta creada. Revisa {} para confirmarla y luego ejecuta `lifeplan login`.",
                args.email
            );
            Ok(())
        }
    }
}

pub async fn logout(config_path: &Path) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;

    if let (Some(identity), Some(remote)) = (ctx.session_file.load(), ctx.config.remote.as_ref()) {
        // Server-side revocation is best effort; the local session goes regardless
        match AuthClient::new(remote) {
            Ok(client) => {
                if let Err(e) = client.sign_out(&identity).await {
                    warn!("Remote sign-out failed: {}", e);
                }
            }
            Err(e) => warn!("Remote sign-out skipped: {}", e),
        }
    }

    ctx.session_file.clear()?;
    let mut rx = ctx.session.subscribe();
    ctx.session.sign_out();
    match ctx.sync.follow_session(&mut rx).await.transpose()? {
        Some(Transition::SignedOut) => {
            println!("Sesión cerrada. Se borraron los planes de la nube de este equipo.")
        }
        _ => println!("Sesión cerrada."),
    }
    Ok(())
}

pub async fn waitlist(config_path: &Path, args: WaitlistArgs) -> anyhow::Result<()> {
    let email = validate_email(&args.email)?;
    let ctx = Context::open(config_path)?;
    let client = WaitlistClient::new(require_remote(&ctx)?)?;

    client.join(email, &args.source).await?;
    println!("Te agregamos a la lista de espera PRO.");
    Ok(())
}

pub async fn status(config_path: &Path) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;
    ctx.report_warning();

    println!("\n=== Estado ===\n");
    match ctx.session_file.load() {
        Some(identity) => println!(
            "Sesión: {} ({})",
            identity.email.as_deref().unwrap_or("sin correo"),
            identity.user_id
        ),
        None => println!("Sesión: sin iniciar (planes solo locales)"),
    }
    match &ctx.config.remote {
        Some(remote) => println!("Nube: {} (tabla {})", remote.url, remote.table),
        None => println!("Nube: no configurada"),
    }
    println!("Datos: {}", ctx.data_dir.display());
    println!("Planes en caché: {}", ctx.sync.plans().len());
    println!();
    Ok(())
}

async fn start_session(ctx: &mut Context, identity: Identity) -> anyhow::Result<()> {
    ctx.session_file.store(&identity)?;
    let label = identity
        .email
        .clone()
        .unwrap_or_else(|| identity.user_id.clone());
    let mut rx = ctx.session.subscribe();
    ctx.session.sign_in(identity);
    println!("Sesión iniciada como {}.", label);

    let flags = ctx.sync.in_flight();
    match with_progress(flags, ctx.sync.follow_session(&mut rx)).await {
        Some(Ok(Transition::SignedIn { plans, .. })) => {
            println!("{} planes recientes sincronizados desde la nube.", plans)
        }
        Some(Ok(_)) | None => {}
        Some(Err(e)) => println!("No pudimos sincronizar tus planes: {}", e),
    }
    ctx.report_warning();
    Ok(())
}

fn require_remote(ctx: &Context) -> anyhow::Result<&RemoteConfig> {
    ctx.config
        .remote
        .as_ref()
        .ok_or_else(|| anyhow!("No remote store configured; add a `remote` section to the config"))
}

fn password(given: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    print!("Contraseña: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
}
