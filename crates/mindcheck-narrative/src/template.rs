//! Prompt templates as pure data.
//!
//! A template is a fixed sequence of literal text and named slots. Rendering
//! fills the slots from the request's feature record, the classifier
//! estimate and the deployment's marker, so the same inputs always produce
//! the same prompt.

use std::fmt::Write;

use mindcheck_core::{EstimatorResult, FeatureRecord, MarkerPattern};

/// How the request's fields are listed in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputStyle {
    /// `- Age: 21`
    Plain,
    /// `- **Q1:** answer`
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// One line per request field, in schema order.
    Inputs(InputStyle),
    /// The classifier's label.
    Prediction,
    /// The classifier's probability as a percentage with two decimals.
    ProbabilityPercent,
    /// The marker label, e.g. `Depression Probability`.
    MarkerLabel,
    /// The marker line the generator must reproduce, e.g. `Depression Probability: X%`.
    MarkerLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Text(&'static str),
    Slot(Slot),
}

/// A fixed prompt with an optional system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: Option<&'static str>,
    pub segments: &'static [Segment],
}

/// Everything a template may refer to.
#[derive(Debug, Clone, Copy)]
pub struct PromptContext<'a> {
    pub record: &'a FeatureRecord,
    pub estimate: &'a EstimatorResult,
    pub marker: MarkerPattern,
}

impl PromptTemplate {
    pub fn render(&self, ctx: &PromptContext<'_>) -> String {
        let mut out = String::new();
        for segment in self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Slot(slot) => render_slot(&mut out, *slot, ctx),
            }
        }
        out
    }

    /// Slots this template uses, in order of appearance.
    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(slot) => Some(*slot),
            Segment::Text(_) => None,
        })
    }
}

fn render_slot(out: &mut String, slot: Slot, ctx: &PromptContext<'_>) {
    // Writing into a String cannot fail.
    let _ = match slot {
        Slot::Inputs(style) => {
            for (name, value) in ctx.record.fields() {
                let _ = match style {
                    InputStyle::Plain => writeln!(out, "- {name}: {value}"),
                    InputStyle::Bold => writeln!(out, "- **{name}:** {value}"),
                };
            }
            Ok(())
        }
        Slot::Prediction => write!(out, "{}", ctx.estimate.label),
        Slot::ProbabilityPercent => write!(out, "{:.2}%", ctx.estimate.percent()),
        Slot::MarkerLabel => write!(out, "{}", ctx.marker.label),
        Slot::MarkerLine => write!(out, "{}", ctx.marker.template_line()),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use mindcheck_core::{DeploymentKind, normalize};
    use serde_json::json;

    const TEMPLATE: PromptTemplate = PromptTemplate {
        system: Some("You are a careful analyst."),
        segments: &[
            Segment::Text("Inputs:\n"),
            Segment::Slot(Slot::Inputs(InputStyle::Plain)),
            Segment::Text("Prediction: "),
            Segment::Slot(Slot::Prediction),
            Segment::Text(" ("),
            Segment::Slot(Slot::ProbabilityPercent),
            Segment::Text(")\nEnd with '"),
            Segment::Slot(Slot::MarkerLine),
            Segment::Text("'."),
        ],
    };

    fn essay_record() -> FeatureRecord {
        let req = json!({"Q1": "Tired lately", "Q2": "Less sleep", "Q3": "Friends help"});
        normalize(&DeploymentKind::Essay.schema(), &req).unwrap()
    }

    #[test]
    fn render_fills_every_slot() {
        let record = essay_record();
        let estimate = EstimatorResult::new("Depression", 0.8734);
        let ctx = PromptContext {
            record: &record,
            estimate: &estimate,
            marker: MarkerPattern::new("Depression Probability"),
        };
        let prompt = TEMPLATE.render(&ctx);
        assert_eq!(
            prompt,
            "Inputs:\n- Q1: Tired lately\n- Q2: Less sleep\n- Q3: Friends help\n\
             Prediction: Depression (87.34%)\nEnd with 'Depression Probability: X%'."
        );
    }

    #[test]
    fn bold_inputs() {
        const BOLD: PromptTemplate = PromptTemplate {
            system: None,
            segments: &[Segment::Slot(Slot::Inputs(InputStyle::Bold))],
        };
        let record = essay_record();
        let estimate = EstimatorResult::new("Unassessed", 0.5);
        let ctx = PromptContext {
            record: &record,
            estimate: &estimate,
            marker: MarkerPattern::new("Depression Probability"),
        };
        assert!(BOLD.render(&ctx).starts_with("- **Q1:** Tired lately\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let record = essay_record();
        let estimate = EstimatorResult::new("Depression", 0.5);
        let ctx = PromptContext {
            record: &record,
            estimate: &estimate,
            marker: MarkerPattern::new("Depression Probability"),
        };
        assert_eq!(TEMPLATE.render(&ctx), TEMPLATE.render(&ctx));
    }

    #[test]
    fn slots_in_order() {
        let slots: Vec<Slot> = TEMPLATE.slots().collect();
        assert_eq!(
            slots,
            vec![
                Slot::Inputs(InputStyle::Plain),
                Slot::Prediction,
                Slot::ProbabilityPercent,
                Slot::MarkerLine
            ]
        );
    }
}
