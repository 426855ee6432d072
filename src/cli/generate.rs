use super::context::{with_progress, Context};
use crate::cli::GenerateArgs;
use crate::plan::PlanDraft;
use crate::sync::RemoteWrite;
use crate::template::PlanOutputs;
use std::path::Path;
use tracing::info;

pub async fn execute(config_path: &Path, args: GenerateArgs, save: bool) -> anyhow::Result<()> {
    let mut ctx = Context::open(config_path)?.json_output(args.json);

    // A plan picked with `load` is the starting point, consumed once
    let resume = ctx.sync.take_resume()?;
    if let Some(warning) = resume.warning {
        ctx.notice(format!("⚠️  {}", warning));
    }
    let mut draft = match resume.plan {
        Some(plan) => {
            ctx.notice(format!("Plan \"{}\" cargado para seguir editando.", plan.name));
            plan.to_draft()
        }
        None => PlanDraft::default(),
    };
    apply_overrides(&mut draft, &args);

    ctx.sync.generate(&mut draft);
    info!("Generated plan outputs for \"{}\"", draft.name);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&draft.outputs)?);
    } else {
        print_outputs(&draft.outputs);
        println!("Plan actualizado. Ajusta los detalles y guarda tus avances.");
    }

    if !save {
        return Ok(());
    }

    ctx.connect().await?;
    let flags = ctx.sync.in_flight();
    let outcome = with_progress(flags, ctx.sync.save(&draft)).await?;
    ctx.notice(format!(
        "Plan \"{}\" guardado localmente ({}).",
        outcome.plan.name, outcome.plan.id
    ));
    match outcome.remote {
        RemoteWrite::LocalOnly => {}
        RemoteWrite::Synced(_) => ctx.notice("Plan sincronizado en la nube."),
        RemoteWrite::Failed(e) => ctx.notice(format!("No pudimos guardar en la nube: {}", e)),
    }
    ctx.report_warning();

    Ok(())
}

fn apply_overrides(draft: &mut PlanDraft, args: &GenerateArgs) {
    if let Some(name) = &args.name {
        draft.name = name.clone();
    }
    let inputs = &mut draft.inputs;
    if let Some(ingresos) = args.ingresos {
        inputs.ingresos = ingresos;
    }
    if let Some(gastos) = args.gastos {
        inputs.gastos = gastos;
    }
    if let Some(metas) = &args.metas {
        inputs.metas = metas.clone();
    }
    if let Some(horario) = &args.horario {
        inputs.horario_disponible = horario.clone();
    }
    if let Some(area) = &args.area {
        inputs.area_mejorar = area.clone();
    }
    if let Some(caos) = args.caos {
        inputs.nivel_caos = caos;
    }
}

pub fn print_outputs(outputs: &PlanOutputs) {
    let sections = [
        ("Plan financiero", &outputs.finanzas),
        ("Hábitos esenciales", &outputs.habitos),
        ("Horario recomendado", &outputs.horario),
        ("Prioridades 7 días", &outputs.siete_dias),
    ];
    for (title, text) in sections {
        println!("## {}\n", title);
        println!("{}\n", text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ChaosLevel;

    #[test]
    fn test_overrides_only_touch_given_fields() {
        let mut draft = PlanDraft::default();
        let args = GenerateArgs {
            name: Some("Junio".to_string()),
            gastos: Some(900.0),
            caos: Some(ChaosLevel::High),
            ..GenerateArgs::default()
        };

        apply_overrides(&mut draft, &args);
        assert_eq!(draft.name, "Junio");
        assert_eq!(draft.inputs.gastos, 900.0);
        assert_eq!(draft.inputs.ingresos, 0.0);
        assert_eq!(draft.inputs.nivel_caos, ChaosLevel::High);
        assert_eq!(draft.inputs.metas, "Mejorar mi balance este mes");
    }
}
