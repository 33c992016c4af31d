//! Outcome label tables: class index → label, and which probability is reported.

/// Which class probability becomes the estimate's probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbabilityTarget {
    /// A fixed positive class, regardless of the prediction.
    Class(usize),
    /// The probability of whichever class was predicted.
    MostLikely,
}

/// Fixed label table of one deployment's classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelTable {
    labels: &'static [&'static str],
    target: ProbabilityTarget,
}

/// Two-class depression screen: the reported probability is always that of `Depression`.
pub const DEPRESSION_LABELS: LabelTable =
    LabelTable::new(&["No Depression", "Depression"], ProbabilityTarget::Class(1));

/// Three-class emotion model over listening history.
pub const EMOTION_LABELS: LabelTable =
    LabelTable::new(&["Sad", "Neutral", "Happy"], ProbabilityTarget::MostLikely);

impl LabelTable {
    pub const fn new(labels: &'static [&'static str], target: ProbabilityTarget) -> Self {
        Self { labels, target }
    }

    pub fn label(&self, class: usize) -> Option<&'static str> {
        self.labels.get(class).copied()
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Index of the class whose probability is reported for a given prediction.
    pub fn reported_class(&self, predicted: usize) -> usize {
        match self.target {
            ProbabilityTarget::Class(i) => i,
            ProbabilityTarget::MostLikely => predicted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depression_reports_positive_class() {
        assert_eq!(DEPRESSION_LABELS.label(1), Some("Depression"));
        assert_eq!(DEPRESSION_LABELS.reported_class(0), 1);
        assert_eq!(DEPRESSION_LABELS.reported_class(1), 1);
    }

    #[test]
    fn emotion_reports_predicted_class() {
        assert_eq!(EMOTION_LABELS.len(), 3);
        assert_eq!(EMOTION_LABELS.label(2), Some("Happy"));
        assert_eq!(EMOTION_LABELS.reported_class(0), 0);
        assert_eq!(EMOTION_LABELS.reported_class(2), 2);
        assert_eq!(EMOTION_LABELS.label(3), None);
    }
}
