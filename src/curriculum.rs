//! Lesson-based course difficulty.
//!
//! A curriculum lists, per tunable parameter, one value per lesson, and the
//! progress threshold that promotes the trainer to the next lesson. The
//! outer training loop reports progress after each episode with
//! [`Curriculum::increment_lesson`] and writes the current lesson into the
//! next episode's [`CourseConfig`] with [`Curriculum::apply`].
//!
//! When several agents train at once, a [`MetaCurriculum`] keeps one
//! curriculum per agent name and advances them together.

use std::collections::BTreeMap;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::CourseConfig;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CurriculumError {
    #[error("Curriculum `{curriculum}` has no values for parameter `{parameter}`")]
    MissingParameter {
        curriculum: String,
        parameter: String,
    },

    #[error("Parameter `{parameter}` must have {expected} values (one per lesson) but {actual} were found")]
    LessonCountMismatch {
        parameter: String,
        expected: usize,
        actual: usize,
    },

    #[error("Parameter `{0}` is not a course parameter")]
    UnknownParameter(String),

    #[error("Could not parse curriculum: {0}")]
    Parse(String),
}

/// What the reported progress measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Measure {
    /// Fraction of the training run completed.
    #[default]
    Progress,
    /// Mean episode reward.
    Reward,
}

/// Course parameters a curriculum may drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CourseParameter {
    UnitStep,
    MaxHeight,
    PrimingSegments,
    NearThreshold,
    PainPenalty,
    ClampPenalty,
}

impl CourseParameter {
    pub const ALL: [CourseParameter; 6] = [
        CourseParameter::UnitStep,
        CourseParameter::MaxHeight,
        CourseParameter::PrimingSegments,
        CourseParameter::NearThreshold,
        CourseParameter::PainPenalty,
        CourseParameter::ClampPenalty,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CourseParameter::UnitStep => "unit_step",
            CourseParameter::MaxHeight => "max_height",
            CourseParameter::PrimingSegments => "priming_segments",
            CourseParameter::NearThreshold => "near_threshold",
            CourseParameter::PainPenalty => "pain_penalty",
            CourseParameter::ClampPenalty => "clamp_penalty",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Writes `value` into the matching field of `config`.
    pub fn apply(&self, value: f64, config: &mut CourseConfig) {
        match self {
            CourseParameter::UnitStep => config.adversary.unit_step = value,
            CourseParameter::MaxHeight => {
                config.terrain.max_height = value;
                config.walker.profile_ceiling = value;
            }
            CourseParameter::PrimingSegments => {
                config.adversary.priming_segments = value.max(0.0).round() as usize
            }
            CourseParameter::NearThreshold => config.walker.near_threshold = value,
            CourseParameter::PainPenalty => config.walker.pain_penalty = value,
            CourseParameter::ClampPenalty => config.adversary.clamp_penalty = value,
        }
    }
}

impl fmt::Display for CourseParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Curriculum as written in a JSON file.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurriculumDefinition {
    pub measure: Measure,
    /// Progress needed to leave lesson `i`; `thresholds.len()` is the last
    /// lesson's index.
    pub thresholds: Vec<f64>,
    /// Reports a lesson must receive before it can be left.
    pub min_lesson_length: u32,
    /// Exponentially smooth the progress signal.
    pub signal_smoothing: bool,
    /// Parameter name to one value per lesson.
    pub parameters: BTreeMap<String, Vec<f64>>,
}

/// Lesson tracker over a validated [`CurriculumDefinition`].
#[derive(Debug, Clone, PartialEq)]
pub struct Curriculum {
    name: String,
    measure: Measure,
    thresholds: Vec<f64>,
    min_lesson_length: u32,
    signal_smoothing: bool,
    parameters: BTreeMap<CourseParameter, Vec<f64>>,
    lesson: usize,
    lesson_length: u32,
    smoothed: f64,
}

impl Curriculum {
    /// Validates `definition`: every parameter must be a known course
    /// parameter with exactly one value per lesson.
    pub fn new(
        name: impl Into<String>,
        definition: CurriculumDefinition,
    ) -> Result<Self, CurriculumError> {
        let expected = definition.thresholds.len() + 1;
        let mut parameters = BTreeMap::new();
        for (key, values) in definition.parameters {
            let parameter = CourseParameter::from_name(&key)
                .ok_or_else(|| CurriculumError::UnknownParameter(key.clone()))?;
            if values.len() != expected {
                return Err(CurriculumError::LessonCountMismatch {
                    parameter: key,
                    expected,
                    actual: values.len(),
                });
            }
            parameters.insert(parameter, values);
        }
        Ok(Self {
            name: name.into(),
            measure: definition.measure,
            thresholds: definition.thresholds,
            min_lesson_length: definition.min_lesson_length,
            signal_smoothing: definition.signal_smoothing,
            parameters,
            lesson: 0,
            lesson_length: 0,
            smoothed: 0.0,
        })
    }

    /// Parses and validates a JSON curriculum.
    #[cfg(feature = "serde")]
    pub fn from_json(name: impl Into<String>, json: &str) -> Result<Self, CurriculumError> {
        let definition: CurriculumDefinition =
            serde_json::from_str(json).map_err(|e| CurriculumError::Parse(e.to_string()))?;
        Self::new(name, definition)
    }

    /// Reports training progress; returns true if the lesson advanced.
    ///
    /// With smoothing enabled the signal is `0.25 * previous + 0.75 * progress`.
    /// A lesson is left once the signal exceeds its threshold and it has
    /// received more than `min_lesson_length` reports.
    pub fn increment_lesson(&mut self, progress: f64) -> bool {
        let progress = if self.signal_smoothing {
            self.smoothed = self.smoothed * 0.25 + 0.75 * progress;
            self.smoothed
        } else {
            progress
        };
        self.lesson_length += 1;

        if self.lesson >= self.max_lesson() {
            return false;
        }
        if progress > self.thresholds[self.lesson] && self.lesson_length > self.min_lesson_length {
            self.lesson_length = 0;
            self.lesson += 1;
            info!(
                curriculum = %self.name,
                lesson = self.lesson,
                parameters = %self.describe(self.lesson),
                "lesson changed"
            );
            return true;
        }
        false
    }

    /// Parameter values of `lesson`, clamped to the last lesson.
    pub fn config_for(&self, lesson: usize) -> Vec<(CourseParameter, f64)> {
        let lesson = lesson.min(self.max_lesson());
        self.parameters
            .iter()
            .map(|(p, values)| (*p, values[lesson]))
            .collect()
    }

    /// Value of one parameter in the current lesson.
    pub fn value(&self, parameter: CourseParameter) -> Result<f64, CurriculumError> {
        self.parameters
            .get(&parameter)
            .map(|values| values[self.lesson])
            .ok_or_else(|| CurriculumError::MissingParameter {
                curriculum: self.name.clone(),
                parameter: parameter.name().to_string(),
            })
    }

    /// Writes the current lesson into `config`.
    pub fn apply(&self, config: &mut CourseConfig) {
        for (parameter, value) in self.config_for(self.lesson) {
            parameter.apply(value, config);
        }
    }

    /// Jumps to `lesson` (clamped) and restarts its length count.
    pub fn set_lesson(&mut self, lesson: usize) {
        self.lesson = lesson.min(self.max_lesson());
        self.lesson_length = 0;
    }

    pub fn lesson(&self) -> usize {
        self.lesson
    }

    pub fn max_lesson(&self) -> usize {
        self.thresholds.len()
    }

    pub fn measure(&self) -> Measure {
        self.measure
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self, lesson: usize) -> String {
        self.config_for(lesson)
            .iter()
            .map(|(p, v)| format!("{} -> {}", p, v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One curriculum per agent, keyed by agent name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetaCurriculum {
    curricula: BTreeMap<String, Curriculum>,
}

impl MetaCurriculum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `curriculum` for `agent`, returning the one it replaces.
    pub fn insert(&mut self, agent: impl Into<String>, curriculum: Curriculum) -> Option<Curriculum> {
        self.curricula.insert(agent.into(), curriculum)
    }

    pub fn get(&self, agent: &str) -> Option<&Curriculum> {
        self.curricula.get(agent)
    }

    /// Reports progress per agent; returns the agents whose lesson advanced.
    ///
    /// Agents without a curriculum are ignored.
    pub fn increment_lessons(&mut self, progress: &BTreeMap<String, f64>) -> Vec<String> {
        let mut advanced = Vec::new();
        for (agent, value) in progress {
            if let Some(curriculum) = self.curricula.get_mut(agent) {
                if curriculum.increment_lesson(*value) {
                    advanced.push(agent.clone());
                }
            }
        }
        advanced
    }

    /// Writes every curriculum's current lesson into `config`, in agent-name
    /// order, so a later agent wins on a shared parameter.
    pub fn apply(&self, config: &mut CourseConfig) {
        for curriculum in self.curricula.values() {
            curriculum.apply(config);
        }
    }

    /// Current lesson of each agent.
    pub fn lesson_numbers(&self) -> BTreeMap<String, usize> {
        self.curricula
            .iter()
            .map(|(agent, c)| (agent.clone(), c.lesson()))
            .collect()
    }

    /// Restores lessons, e.g. from a checkpoint. Unknown agents are ignored.
    pub fn set_lessons(&mut self, lessons: &BTreeMap<String, usize>) {
        for (agent, lesson) in lessons {
            if let Some(curriculum) = self.curricula.get_mut(agent) {
                curriculum.set_lesson(*lesson);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.curricula.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curricula.is_empty()
    }
}
