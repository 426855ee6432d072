use super::context::{resolve_in, with_progress, Context};
use super::generate::print_outputs;
use crate::cli::{DeleteArgs, ListArgs, PlanArgs};
use crate::plan::Plan;
use chrono::Local;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub async fn list(config_path: &Path, args: ListArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?.json_output(args.json);
    ctx.connect().await?;

    let plans = if args.all {
        let flags = ctx.sync.in_flight();
        let all = with_progress(flags, ctx.sync.list_all()).await?;
        ctx.report_warning();
        all
    } else {
        ctx.sync.plans().to_vec()
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plans)?);
        return Ok(());
    }

    if plans.is_empty() {
        println!("Aún no tienes planes guardados. Genera uno nuevo y guárdalo para verlo aquí.");
        return Ok(());
    }

    println!("\n=== Planes guardados ===\n");
    for plan in &plans {
        print_summary(plan);
    }
    println!();
    Ok(())
}

pub async fn show(config_path: &Path, args: PlanArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?.json_output(args.json);
    ctx.connect().await?;
    let plan = find_anywhere(&mut ctx, &args.id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("# {}\n", plan.name);
    print_summary(&plan);
    println!();
    print_outputs(&plan.payload.outputs);
    Ok(())
}

pub async fn load(config_path: &Path, args: PlanArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;
    ctx.connect().await?;
    let plan = find_anywhere(&mut ctx, &args.id).await?;

    ctx.sync.stash_for_editing(&plan)?;
    println!(
        "Plan \"{}\" listo para seguir editando. Ejecuta `lifeplan generate` para continuar.",
        plan.name
    );
    Ok(())
}

pub async fn delete(config_path: &Path, args: DeleteArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;
    ctx.connect().await?;
    let plan = ctx.resolve(&args.id)?;

    let token = ctx.sync.request_delete(&plan.id)?;
    if !args.yes && !confirm(&format!("¿Eliminar \"{}\"?", token.plan_name))? {
        println!("Cancelado.");
        return Ok(());
    }

    ctx.sync.confirm_delete(&token.token).await?;
    println!("Plan \"{}\" eliminado.", token.plan_name);
    ctx.report_warning();
    Ok(())
}

/// Look in the recent window first, then in the full cloud list
pub(super) async fn find_anywhere(ctx: &mut Context, id: &str) -> anyhow::Result<Plan> {
    match ctx.resolve(id) {
        Ok(plan) => Ok(plan),
        Err(_) if ctx.sync.is_authenticated() => {
            let flags = ctx.sync.in_flight();
            let all = with_progress(flags, ctx.sync.list_all()).await?;
            ctx.report_warning();
            resolve_in(&all, id)
        }
        Err(e) => Err(e),
    }
}

fn print_summary(plan: &Plan) {
    let created = plan
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M");
    let inputs = &plan.payload.inputs;
    let short_id: String = plan.id.chars().take(8).collect();
    println!(
        "  - {} [{}] {} | Ingresos: {} | Meta: {}",
        short_id,
        created,
        plan.name,
        inputs.ingresos,
        inputs.metas
    );
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{} [s/N] ", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_lowercase().as_str(),
        "s" | "si" | "sí" | "y" | "yes"
    ))
}
