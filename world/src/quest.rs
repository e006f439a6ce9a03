//! Stage-chart quest machine gating floor features.
//!
//! Each floor owns an ordered chart of stages. Transitions only ever point
//! forward; the single exception to linear progress is the laboratory fork,
//! where two mutually exclusive stages share the choice point. Feature
//! unlocks are latched: once granted they survive anything that happens to
//! the stage afterwards.

use ark_descent_core::{Event, Feature, FloorId, QuestEventId, QuestStage, TriggerId};

/// Forward transition between two chart stages.
#[derive(Clone, Debug)]
struct Transition {
    from: QuestStage,
    on: QuestEventId,
    to: QuestStage,
}

/// Ordered stage chart plus feature gates for one floor.
#[derive(Clone, Debug)]
pub(crate) struct StageChart {
    stages: Vec<QuestStage>,
    transitions: Vec<Transition>,
    gates: Vec<(Feature, QuestStage)>,
}

impl StageChart {
    fn dormitory() -> Self {
        let kaines_log = TriggerId::new("log_kaines_001");
        Self {
            stages: vec![
                QuestStage::Intro,
                QuestStage::Explore,
                QuestStage::Combat,
                QuestStage::Log,
                QuestStage::Elevator,
            ],
            transitions: vec![
                Transition {
                    from: QuestStage::Intro,
                    on: QuestEventId::BriefingComplete,
                    to: QuestStage::Explore,
                },
                Transition {
                    from: QuestStage::Explore,
                    on: QuestEventId::ThreatEngaged,
                    to: QuestStage::Combat,
                },
                Transition {
                    from: QuestStage::Combat,
                    on: QuestEventId::FloorCleared,
                    to: QuestStage::Log,
                },
                Transition {
                    from: QuestStage::Log,
                    on: QuestEventId::LogRead(kaines_log),
                    to: QuestStage::Elevator,
                },
            ],
            gates: vec![(Feature::Elevator, QuestStage::Elevator)],
        }
    }

    fn laboratory() -> Self {
        let experiment_log = TriggerId::new("log_experiment_7g");
        let relay = TriggerId::new("lab_switch");
        let logic_entity = TriggerId::new("logic_error_entity");
        Self {
            stages: vec![
                QuestStage::LabIntro,
                QuestStage::LabPath,
                QuestStage::LabChoice,
                QuestStage::LabBypass,
                QuestStage::LabSwitch,
                QuestStage::LabExit,
            ],
            transitions: vec![
                Transition {
                    from: QuestStage::LabIntro,
                    on: QuestEventId::BriefingComplete,
                    to: QuestStage::LabPath,
                },
                Transition {
                    from: QuestStage::LabPath,
                    on: QuestEventId::LogRead(experiment_log),
                    to: QuestStage::LabChoice,
                },
                Transition {
                    from: QuestStage::LabChoice,
                    on: QuestEventId::NpcResolved(logic_entity),
                    to: QuestStage::LabBypass,
                },
                Transition {
                    from: QuestStage::LabChoice,
                    on: QuestEventId::SwitchActivated(relay),
                    to: QuestStage::LabSwitch,
                },
                Transition {
                    from: QuestStage::LabBypass,
                    on: QuestEventId::FloorCleared,
                    to: QuestStage::LabExit,
                },
                Transition {
                    from: QuestStage::LabSwitch,
                    on: QuestEventId::FloorCleared,
                    to: QuestStage::LabExit,
                },
            ],
            gates: vec![(Feature::Elevator, QuestStage::LabExit)],
        }
    }

    fn passage() -> Self {
        Self {
            stages: vec![QuestStage::Passage],
            transitions: Vec::new(),
            gates: Vec::new(),
        }
    }

    fn rank(&self, stage: QuestStage) -> Option<usize> {
        self.stages.iter().position(|candidate| *candidate == stage)
    }
}

/// Quest state machine for one floor instance.
#[derive(Clone, Debug)]
pub(crate) struct QuestMachine {
    chart: StageChart,
    current: QuestStage,
    unlocked: Vec<Feature>,
}

impl QuestMachine {
    /// Builds the machine for the provided floor, starting at its first stage.
    #[must_use]
    pub(crate) fn for_floor(floor: FloorId) -> Self {
        let chart = match floor.level() {
            50 => StageChart::dormitory(),
            40 => StageChart::laboratory(),
            _ => StageChart::passage(),
        };
        let current = chart.stages.first().copied().unwrap_or(QuestStage::Passage);
        Self {
            chart,
            current,
            unlocked: Vec::new(),
        }
    }

    /// Stage the floor is currently in.
    #[must_use]
    pub(crate) fn stage(&self) -> QuestStage {
        self.current
    }

    /// Stage required before the feature unlocks, if the floor gates it.
    #[must_use]
    pub(crate) fn required_stage_for(&self, feature: Feature) -> Option<QuestStage> {
        self.chart
            .gates
            .iter()
            .find(|(gated, _)| *gated == feature)
            .map(|(_, stage)| *stage)
    }

    /// Reports whether the feature is available.
    ///
    /// Ungated features are always available; gated features compare stage
    /// ranks, and a latched unlock never regresses.
    #[must_use]
    pub(crate) fn is_unlocked(&self, feature: Feature) -> bool {
        if self.unlocked.contains(&feature) {
            return true;
        }
        match self.required_stage_for(feature) {
            None => true,
            Some(required) => match (self.chart.rank(self.current), self.chart.rank(required)) {
                (Some(current), Some(required)) => current >= required,
                _ => false,
            },
        }
    }

    /// Feeds an occurrence into the machine, emitting stage and unlock events.
    pub(crate) fn on_event(&mut self, event: &QuestEventId, out: &mut Vec<Event>) {
        let Some(next) = self
            .chart
            .transitions
            .iter()
            .find(|transition| transition.from == self.current && transition.on == *event)
            .map(|transition| transition.to)
        else {
            return;
        };

        let from = self.current;
        self.current = next;
        out.push(Event::QuestStageChanged { from, to: next });
        self.latch_unlocks(out);
    }

    fn latch_unlocks(&mut self, out: &mut Vec<Event>) {
        let Some(current_rank) = self.chart.rank(self.current) else {
            return;
        };
        for (feature, required) in self.chart.gates.clone() {
            if self.unlocked.contains(&feature) {
                continue;
            }
            if self
                .chart
                .rank(required)
                .is_some_and(|required_rank| current_rank >= required_rank)
            {
                self.unlocked.push(feature);
                out.push(Event::FeatureUnlocked { feature });
            }
        }
    }
}
