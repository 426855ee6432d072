use super::context::Context;
use super::plans::find_anywhere;
use crate::cli::ExportArgs;
use crate::export::render;
use std::path::Path;

pub async fn execute(config_path: &Path, args: ExportArgs) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?;
    ctx.connect().await?;
    let plan = find_anywhere(&mut ctx, &args.id).await?;

    let document = render(&plan.name, &plan.payload.outputs, &ctx.config.export);
    let path = document.write_to(&args.out)?;
    println!(
        "Plan \"{}\" exportado a {} ({} páginas).",
        plan.name,
        path.display(),
        document.pages.len()
    );
    Ok(())
}
