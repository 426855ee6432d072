//! Inputs and outputs of plan generation

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What the user tells us about their month
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInputs {
    /// Monthly income
    #[serde(default, deserialize_with = "lenient_number")]
    pub ingresos: f64,

    /// Monthly expenses, may exceed income
    #[serde(default, deserialize_with = "lenient_number")]
    pub gastos: f64,

    /// Main goal, free text
    #[serde(default)]
    pub metas: String,

    /// Availability window, free text
    #[serde(default)]
    pub horario_disponible: String,

    /// Area the user wants to improve
    #[serde(default)]
    pub area_mejorar: String,

    #[serde(default)]
    pub nivel_caos: ChaosLevel,
}

impl Default for PlanInputs {
    fn default() -> Self {
        Self {
            ingresos: 0.0,
            gastos: 0.0,
            metas: "Mejorar mi balance este mes".to_string(),
            horario_disponible: "Mañanas y noches".to_string(),
            area_mejorar: "Productividad personal".to_string(),
            nivel_caos: ChaosLevel::Medium,
        }
    }
}

/// The four generated plan sections
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanOutputs {
    pub finanzas: String,
    pub habitos: String,
    pub horario: String,
    pub siete_dias: String,
}

impl PlanOutputs {
    /// Shown before anything has been generated
    pub fn placeholder() -> Self {
        Self {
            finanzas: "Completa el formulario para generar un diagnóstico financiero."
                .to_string(),
            habitos: "Aquí verás hábitos accionables alineados con tus metas.".to_string(),
            horario: "Se generará un horario recomendado según tu disponibilidad.".to_string(),
            siete_dias: "Obtendrás prioridades concretas para los próximos 7 días.".to_string(),
        }
    }
}

/// Perceived level of chaos in the user's week
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum ChaosLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ChaosLevel {
    pub fn label(&self) -> &'static str {
        match self {
            ChaosLevel::Low => "Bajo",
            ChaosLevel::Medium => "Medio",
            ChaosLevel::High => "Alto",
        }
    }
}

impl std::fmt::Display for ChaosLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for ChaosLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bajo" | "low" => Ok(ChaosLevel::Low),
            "medio" | "medium" => Ok(ChaosLevel::Medium),
            "alto" | "high" => Ok(ChaosLevel::High),
            _ => Err(format!("Unknown chaos level: {}", s)),
        }
    }
}

// Unknown labels fall back to the default level instead of failing the record
impl From<String> for ChaosLevel {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<ChaosLevel> for String {
    fn from(level: ChaosLevel) -> Self {
        level.label().to_string()
    }
}

/// Coerce a loosely typed amount into a number; anything non-numeric is zero
pub fn coerce_amount(value: &Value) -> f64 {
    let number = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_amount(s),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

/// Parse a user-typed amount, treating blanks and garbage as zero
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(coerce_amount(&value))
}
