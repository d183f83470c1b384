use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::application::ApplicationKeys;
use super::enums::{Queue, Stage};

/// Status, timestamp and responsible user of one stage, always written together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub stage: Stage,
    /// 0 = not done, nonzero = done.
    pub status: i64,
    pub at: DateTime<Utc>,
    pub by: i64,
}

impl StageTransition {
    pub fn is_done(&self) -> bool {
        self.status != 0
    }
}

/// Per-application pipeline state, persisted as one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessState {
    stages: BTreeMap<Stage, StageTransition>,
}

impl ProcessState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of a freshly captured lead: `lead_process` done.
    pub fn initial(at: DateTime<Utc>, by: i64) -> Self {
        let mut state = Self::new();
        state.mark(Stage::LeadProcess, 1, at, by);
        state
    }

    pub fn mark(
        &mut self,
        stage: Stage,
        status: i64,
        at: DateTime<Utc>,
        by: i64,
    ) -> &StageTransition {
        self.stages.insert(stage, StageTransition { stage, status, at, by });
        &self.stages[&stage]
    }

    pub fn transition(&self, stage: Stage) -> Option<&StageTransition> {
        self.stages.get(&stage)
    }

    pub fn is_done(&self, stage: Stage) -> bool {
        self.transition(stage).is_some_and(StageTransition::is_done)
    }

    /// Earliest stage in pipeline order that is not done yet.
    pub fn current_stage(&self) -> CurrentStage {
        Stage::ALL
            .into_iter()
            .find(|stage| !self.is_done(*stage))
            .map_or(CurrentStage::Completed, CurrentStage::Pending)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let transitions: Vec<&StageTransition> = self.stages.values().collect();
        serde_json::to_string(&transitions)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let transitions: Vec<StageTransition> = serde_json::from_str(json)?;
        Ok(Self {
            stages: transitions.into_iter().map(|t| (t.stage, t)).collect(),
        })
    }
}

/// Where an application sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentStage {
    Pending(Stage),
    Completed,
}

impl CurrentStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending(stage) => stage.as_str(),
            Self::Completed => "Completed",
        }
    }

    pub fn queue(&self) -> Option<Queue> {
        match self {
            Self::Pending(stage) => stage.queue(),
            Self::Completed => None,
        }
    }
}

impl fmt::Display for CurrentStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CurrentStage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Timeline row: the `(status, at, by)` triple of one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessLogEntry {
    pub stage: Stage,
    pub status: i64,
    pub at: Option<DateTime<Utc>>,
    pub by: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessLog {
    pub app_id: Uuid,
    pub keys: ApplicationKeys,
    pub entries: Vec<ProcessLogEntry>,
    pub current_process: CurrentStage,
}

impl ProcessLog {
    pub fn from_state(app_id: Uuid, keys: ApplicationKeys, state: &ProcessState) -> Self {
        let entries = Stage::ALL
            .into_iter()
            .map(|stage| match state.transition(stage) {
                Some(t) => ProcessLogEntry {
                    stage,
                    status: t.status,
                    at: Some(t.at),
                    by: Some(t.by),
                },
                None => ProcessLogEntry {
                    stage,
                    status: 0,
                    at: None,
                    by: None,
                },
            })
            .collect();
        Self {
            app_id,
            keys,
            entries,
            current_process: state.current_stage(),
        }
    }
}
