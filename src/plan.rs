//! Saved plans and the drafts they are created from

use crate::template::{PlanInputs, PlanOutputs};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Owner id for plans created while signed out
pub const LOCAL_OWNER: &str = "local";

/// Payload schema written by this build
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;

fn legacy_schema_version() -> u32 {
    1
}

/// Inputs and outputs snapshot stored with every plan, versioned as one unit
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPayload {
    /// Records written before versioning carry no tag and are version 1
    #[serde(default = "legacy_schema_version")]
    pub schema_version: u32,

    pub inputs: PlanInputs,

    pub outputs: PlanOutputs,
}

impl PlanPayload {
    pub fn new(inputs: PlanInputs, outputs: PlanOutputs) -> Self {
        Self {
            schema_version: PAYLOAD_SCHEMA_VERSION,
            inputs,
            outputs,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.schema_version <= PAYLOAD_SCHEMA_VERSION
    }
}

/// A saved plan. Never edited in place; edits go through a [`PlanDraft`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Plan {
    pub id: String,

    #[serde(rename = "user_id", alias = "ownerId")]
    pub owner_id: String,

    pub name: String,

    #[serde(rename = "inputs_json", alias = "payload")]
    pub payload: PlanPayload,

    #[serde(rename = "created_at", alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Plan {
    /// Turn a draft into a new plan with a fresh id and creation time
    pub fn from_draft(draft: &PlanDraft, owner_id: &str) -> Result<Self, String> {
        let name = draft.validated_name()?;
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            name,
            payload: PlanPayload::new(draft.inputs.clone(), draft.outputs.clone()),
            created_at: Utc::now(),
        })
    }

    pub fn is_local(&self) -> bool {
        self.owner_id == LOCAL_OWNER
    }

    /// A draft to keep editing this plan from
    pub fn to_draft(&self) -> PlanDraft {
        PlanDraft {
            name: self.name.clone(),
            inputs: self.payload.inputs.clone(),
            outputs: self.payload.outputs.clone(),
        }
    }
}

/// In-memory editable plan
#[derive(Debug, Clone, PartialEq)]
pub struct PlanDraft {
    pub name: String,
    pub inputs: PlanInputs,
    pub outputs: PlanOutputs,
}

impl Default for PlanDraft {
    fn default() -> Self {
        Self {
            name: "Mi plan de claridad".to_string(),
            inputs: PlanInputs::default(),
            outputs: PlanOutputs::placeholder(),
        }
    }
}

impl PlanDraft {
    /// Regenerate all four outputs from the current inputs
    pub fn regenerate(&mut self) {
        self.outputs = crate::template::generate(&self.inputs);
    }

    fn validated_name(&self) -> Result<String, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Ponle un nombre a tu plan para guardarlo.".to_string());
        }
        Ok(name.to_string())
    }
}

/// Sort newest first. Stable, so equal timestamps keep their current order.
pub fn sort_newest_first(plans: &mut [Plan]) {
    plans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
