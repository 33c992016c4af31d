//! The three deployments and everything each one fixes: schema, marker,
//! prompt, token budget, sampling temperature and estimator kind.

use std::sync::Arc;

use mindcheck_ai::{Classifier, DEPRESSION_LABELS, EMOTION_LABELS, Estimator, LabelTable};
use mindcheck_core::{DeploymentKind, InputSchema, MarkerPattern};
use mindcheck_narrative::{InputStyle, PromptTemplate, Segment, Slot};

/// Immutable per-deployment configuration, shared by every request.
#[derive(Debug, Clone, Copy)]
pub struct Deployment {
    pub kind: DeploymentKind,
    pub marker: MarkerPattern,
    pub template: PromptTemplate,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Label table of the deployment's classifier; `None` when it has none.
    pub labels: Option<LabelTable>,
}

/// Prior reported by deployments without a classifier.
pub const PRIOR_LABEL: &str = "Unassessed";
pub const PRIOR_PROBABILITY: f64 = 0.5;

pub const ACADEMIC: Deployment = Deployment {
    kind: DeploymentKind::Academic,
    marker: MarkerPattern::new("Academic Stress Probability"),
    template: PromptTemplate {
        system: Some("You are a mental health expert."),
        segments: &[
            Segment::Text(
                "You are a mental health expert. Using the academic data below and a machine \
                 learning model's prediction, write a detailed report assessing the user's \
                 mental health with recommendations.\n\nUser Input:\n",
            ),
            Segment::Slot(Slot::Inputs(InputStyle::Plain)),
            Segment::Text("\nMachine Learning Prediction:\n- Depression Risk: "),
            Segment::Slot(Slot::Prediction),
            Segment::Text("\n- Probability of Depression: "),
            Segment::Slot(Slot::ProbabilityPercent),
            Segment::Text(
                "\n\nStructure the analysis with these sections:\n\
                 - **Summary of Academic Stress:** the user's stress levels related to academics.\n\
                 - **Risk Factors:** concerning patterns or behaviors.\n\
                 - **Protective Factors:** positive or adaptive behaviors.\n\
                 - **",
            ),
            Segment::Slot(Slot::MarkerLabel),
            Segment::Text(":** estimate the probability of academic stress (0-100%) and state it as '"),
            Segment::Slot(Slot::MarkerLine),
            Segment::Text(
                "'. Guidance:\n\
                 \x20 - **Low Stress (0-15%)**: balanced workload, good coping, stable emotions.\n\
                 \x20 - **Moderate Stress (30-50%)**: some overwhelm, reduced productivity, mild anxiety.\n\
                 \x20 - **High Stress (80-100%)**: severe overwhelm, burnout, ineffective coping.\n\
                 - **Recommendations:** actionable advice for managing academic stress.\n\n\
                 Include the '",
            ),
            Segment::Slot(Slot::MarkerLine),
            Segment::Text(
                "' line exactly as written, with a number between 0 and 100 followed by '%'. \
                 Keep the tone empathetic, professional and supportive.",
            ),
        ],
    },
    max_tokens: 500,
    temperature: None,
    labels: Some(DEPRESSION_LABELS),
};

pub const ESSAY: Deployment = Deployment {
    kind: DeploymentKind::Essay,
    marker: MarkerPattern::new("Depression Probability"),
    template: PromptTemplate {
        system: None,
        segments: &[
            Segment::Text(
                "You are a mental health analysis model assessing emotional well-being from a \
                 person's written responses. Analyze the responses below in detail and write a \
                 comprehensive report, including a probability estimate of depression.\n\n\
                 ### Instructions:\n\
                 1. **Emotional Analysis:** emotional patterns, signs of sadness, numbness or frustration.\n\
                 2. **Linguistic and Cognitive Patterns:** tone, self-referential language, cognitive distortions.\n\
                 3. **Behavioral and Motivation Indicators:** changed habits, social withdrawal, loss of motivation.\n\
                 4. **Coping Mechanisms:** adaptive versus maladaptive strategies.\n\
                 5. **Overall Assessment:** a report with these sections:\n\
                 \x20  - **Summary of Emotional State**\n\
                 \x20  - **Risk Factors**\n\
                 \x20  - **Protective Factors**\n\
                 \x20  - **",
            ),
            Segment::Slot(Slot::MarkerLabel),
            Segment::Text(":** a score (0-100%) with supporting observations, written as \""),
            Segment::Slot(Slot::MarkerLine),
            Segment::Text(
                "\".\n\
                 \x20  - **Recommendations**\n\
                 6. Be empathetic, professional and supportive.\n\
                 7. Include the '",
            ),
            Segment::Slot(Slot::MarkerLine),
            Segment::Text(
                "' line exactly as written, with a number between 0 and 100 followed by '%'.\n\n\
                 ### Reference points:\n\
                 - **Low (0-15%)**: engaged in daily life, good coping, stable emotions.\n\
                 - **Moderate (30-50%)**: some withdrawal, reduced motivation, mild negative emotions.\n\
                 - **High (80-100%)**: severe withdrawal, emotional numbness, ineffective coping.\n\n\
                 ### User Responses:\n",
            ),
            Segment::Slot(Slot::Inputs(InputStyle::Bold)),
            Segment::Text("\nNow write the full report as a single piece of text.\n"),
        ],
    },
    max_tokens: 1000,
    temperature: None,
    labels: None,
};

pub const MUSIC: Deployment = Deployment {
    kind: DeploymentKind::Music,
    marker: MarkerPattern::new("Low Mood Probability"),
    template: PromptTemplate {
        system: None,
        segments: &[
            Segment::Text(
                "Analyze the averaged audio features of a user's recent listening history and \
                 infer indicators of mood, stress and emotional patterns. Present objective, \
                 point-by-point observations rather than a conversational reply.\n\n\
                 Averaged track features:\n",
            ),
            Segment::Slot(Slot::Inputs(InputStyle::Plain)),
            Segment::Text("\nEmotion model prediction: "),
            Segment::Slot(Slot::Prediction),
            Segment::Text(" ("),
            Segment::Slot(Slot::ProbabilityPercent),
            Segment::Text(
                ")\n\nReport format:\n\
                 - Insight 1: [observation]\n\
                 - Insight 2: [observation]\n\
                 - Insight 3: [observation]\n\n\
                 Finish with a line estimating the probability of low mood (0-100%) written \
                 exactly as '",
            ),
            Segment::Slot(Slot::MarkerLine),
            Segment::Text("'.\n"),
        ],
    },
    max_tokens: 300,
    temperature: Some(0.7),
    labels: Some(EMOTION_LABELS),
};

impl Deployment {
    pub fn for_kind(kind: DeploymentKind) -> &'static Deployment {
        match kind {
            DeploymentKind::Academic => &ACADEMIC,
            DeploymentKind::Essay => &ESSAY,
            DeploymentKind::Music => &MUSIC,
        }
    }

    pub fn schema(&self) -> InputSchema {
        self.kind.schema()
    }

    pub fn needs_classifier(&self) -> bool {
        self.labels.is_some()
    }

    /// Build this deployment's estimator. Deployments with a label table
    /// require a classifier; the others use the fixed prior and ignore one.
    pub fn estimator(&self, classifier: Option<Arc<dyn Classifier>>) -> anyhow::Result<Estimator> {
        match (self.labels, classifier) {
            (Some(labels), Some(classifier)) => {
                if let Some(n) = classifier.n_features() {
                    let expected = self.schema().field_names().len();
                    anyhow::ensure!(
                        n == expected,
                        "{} classifier takes {n} features, deployment provides {expected}",
                        self.kind
                    );
                }
                Ok(Estimator::model(classifier, labels))
            }
            (Some(_), None) => anyhow::bail!("the {} deployment needs a model artifact", self.kind),
            (None, _) => Ok(Estimator::prior(PRIOR_LABEL, PRIOR_PROBABILITY)),
        }
    }
}
