mod types;

pub use types::*;

/// Minimum monthly reserve, whatever the balance
const RESERVE_FLOOR: f64 = 50.0;
const RESERVE_RATE: f64 = 0.2;

/// Build the four plan sections from a snapshot of the inputs.
///
/// Pure and total: the same inputs always produce byte-identical outputs.
pub fn generate(inputs: &PlanInputs) -> PlanOutputs {
    let balance = inputs.ingresos - inputs.gastos;
    let reserve = (balance * RESERVE_RATE).max(RESERVE_FLOOR);

    let finanzas = format!(
        "Tu balance mensual aproximado es {}. Reserva al menos {} para un fondo de \
         tranquilidad y asigna porcentajes claros: 50% necesidades, 30% deseos, 20% objetivos.",
        format_currency(balance),
        format_currency(reserve)
    );

    let habitos = format!(
        "Enfócate en {} con un ritual de inicio de día (5 minutos de respiración + revisión \
         de metas), un cierre digital a las 21:00 y una revisión semanal los domingos.",
        inputs.area_mejorar.to_lowercase()
    );

    let horario = format!(
        "Tu ventana principal es {}. Bloquea sprints de 90 minutos para tus metas y agrega \
         recordatorios ligeros entre tareas para bajar el nivel de caos {}.",
        inputs.horario_disponible.to_lowercase(),
        inputs.nivel_caos.label().to_lowercase()
    );

    let siete_dias = format!(
        "1) Ajusta presupuesto con tus ingresos actuales. 2) Agenda una reunión contigo para \
         revisar tus metas '{}'. 3) Dedica un bloque creativo al día para mover el proyecto \
         clave. 4) Realiza una caminata consciente de 15 minutos. 5) Define dos acciones \
         delegables. 6) Limpia tu bandeja digital. 7) Celebra una victoria pequeña.",
        inputs.metas
    );

    PlanOutputs {
        finanzas,
        habitos,
        horario,
        siete_dias,
    }
}

/// Euro amount in Spanish style with no fractional units: `300 €`, `12.500 €`.
///
/// Rounds half away from zero. Grouping only kicks in from five integer digits.
pub fn format_currency(amount: f64) -> String {
    let amount = if amount.is_finite() { amount } else { 0.0 };
    let rounded = amount.round();
    let digits = format!("{:.0}", rounded.abs());
    let grouped = if digits.len() >= 5 {
        group_thousands(&digits)
    } else {
        digits
    };
    // Amounts that round to zero keep their sign: -0.4 reads "-0 €"
    let sign = if amount.is_sign_negative() && amount != 0.0 { "-" } else { "" };
    format!("{}{}\u{a0}€", sign, grouped)
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(ingresos: f64, gastos: f64) -> PlanInputs {
        PlanInputs {
            ingresos,
            gastos,
            ..PlanInputs::default()
        }
    }

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate(&inputs(1800.0, 1250.0));
        let b = generate(&inputs(1800.0, 1250.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_positive_balance_reserve() {
        let outputs = generate(&inputs(1000.0, 700.0));
        assert!(outputs.finanzas.contains("es 300\u{a0}€."));
        assert!(outputs.finanzas.contains("al menos 60\u{a0}€ para"));
        assert!(outputs.finanzas.contains("50% necesidades, 30% deseos, 20% objetivos"));
    }

    #[test]
    fn test_negative_balance_uses_reserve_floor() {
        let outputs = generate(&inputs(100.0, 500.0));
        assert!(outputs.finanzas.contains("es -400\u{a0}€."));
        assert!(outputs.finanzas.contains("al menos 50\u{a0}€ para"));
    }

    #[test]
    fn test_text_fields_are_case_folded_except_goal() {
        let outputs = generate(&PlanInputs {
            metas: "Pagar la TARJETA".to_string(),
            horario_disponible: "Noches LIBRES".to_string(),
            area_mejorar: "Salud Mental".to_string(),
            nivel_caos: ChaosLevel::High,
            ..PlanInputs::default()
        });

        assert!(outputs.habitos.starts_with("Enfócate en salud mental con"));
        assert!(outputs.habitos.contains("21:00"));
        assert!(outputs.horario.contains("es noches libres."));
        assert!(outputs.horario.contains("sprints de 90 minutos"));
        assert!(outputs.horario.ends_with("nivel de caos alto."));
        assert!(outputs.siete_dias.contains("2) Agenda una reunión contigo para revisar tus metas 'Pagar la TARJETA'."));
        assert!(outputs.siete_dias.contains("7) Celebra una victoria pequeña."));
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "0\u{a0}€");
        assert_eq!(format_currency(1000.0), "1000\u{a0}€");
        assert_eq!(format_currency(12500.0), "12.500\u{a0}€");
        assert_eq!(format_currency(1234567.0), "1.234.567\u{a0}€");
        assert_eq!(format_currency(-15000.0), "-15.000\u{a0}€");
        assert_eq!(format_currency(62.5), "63\u{a0}€");
        assert_eq!(format_currency(-62.5), "-63\u{a0}€");
        assert_eq!(format_currency(f64::NAN), "0\u{a0}€");
        assert_eq!(format_currency(-0.4), "-0\u{a0}€");
        assert_eq!(format_currency(0.4), "0\u{a0}€");
        assert_eq!(format_currency(-0.0), "0\u{a0}€");
    }
}
