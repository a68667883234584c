use super::domain::{AnswerValue, IndicatorId, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;

/// One selectable answer for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerOption {
    pub value: AnswerValue,
    pub label: String,
}

/// Questionnaire item feeding one or more indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub indicators: BTreeSet<IndicatorId>,
    pub options: Vec<AnswerOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl Question {
    pub fn accepts(&self, value: AnswerValue) -> bool {
        self.options.iter().any(|option| option.value == value)
    }

    pub fn option_label(&self, value: AnswerValue) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == value)
            .map(|option| option.label.as_str())
    }
}

/// Immutable, validated set of questions loaded once at startup.
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// Validate and wrap a list of questions.
    ///
    /// Rejects an empty list, duplicate ids, questions without indicator tags, and
    /// questions without options or with repeated option values.
    pub fn new(questions: Vec<Question>) -> Result<Self, CatalogError> {
        validate(&questions)?;
        Ok(Self { questions })
    }

    /// Built-in municipal questionnaire.
    pub fn standard() -> Self {
        let questions = standard_questions();
        debug_assert!(validate(&questions).is_ok(), "built-in catalog is valid");
        Self { questions }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parse a JSON array of question definitions.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let raw: Vec<RawQuestion> = serde_json::from_reader(reader)?;
        let questions = raw
            .into_iter()
            .map(RawQuestion::into_question)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(questions)
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|question| question.id == id)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions_for(&self, indicator: IndicatorId) -> Vec<&Question> {
        self.questions
            .iter()
            .filter(|question| question.indicators.contains(&indicator))
            .collect()
    }

    /// Indicators referenced by at least one question, in numeric order.
    pub fn covered_indicators(&self) -> BTreeSet<IndicatorId> {
        self.questions
            .iter()
            .flat_map(|question| question.indicators.iter().copied())
            .collect()
    }
}

fn validate(questions: &[Question]) -> Result<(), CatalogError> {
    if questions.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut seen = HashSet::new();
    for question in questions {
        if !seen.insert(question.id) {
            return Err(CatalogError::DuplicateQuestion(question.id));
        }
        if question.indicators.is_empty() {
            return Err(CatalogError::MissingIndicators(question.id));
        }
        if question.options.is_empty() {
            return Err(CatalogError::MissingOptions(question.id));
        }
        let mut values = HashSet::new();
        for option in &question.options {
            if !values.insert(option.value) {
                return Err(CatalogError::DuplicateOption {
                    question: question.id,
                    value: option.value.get(),
                });
            }
        }
    }
    Ok(())
}

/// Failure to build a usable catalog. The engine refuses to run on any of these.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog contains no questions")]
    Empty,
    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),
    #[error("question {0} has no indicator tags")]
    MissingIndicators(QuestionId),
    #[error("question {question} references indicator {value} outside 1..=17")]
    IndicatorOutOfRange { question: QuestionId, value: u8 },
    #[error("question {0} has no answer options")]
    MissingOptions(QuestionId),
    #[error("question {question} has option value {value} outside 0..=4")]
    OptionOutOfRange { question: QuestionId, value: u8 },
    #[error("question {question} lists option value {value} twice")]
    DuplicateOption { question: QuestionId, value: u8 },
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct RawQuestion {
    id: u32,
    text: String,
    #[serde(default)]
    indicators: Vec<u8>,
    #[serde(default)]
    options: Vec<RawOption>,
    #[serde(default)]
    recommendation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawOption {
    value: u8,
    label: String,
}

impl RawQuestion {
    fn into_question(self) -> Result<Question, CatalogError> {
        let id = QuestionId(self.id);

        let indicators = self
            .indicators
            .into_iter()
            .map(|value| {
                IndicatorId::new(value)
                    .ok_or(CatalogError::IndicatorOutOfRange { question: id, value })
            })
            .collect::<Result<BTreeSet<_>, _>>()?;

        let options = self
            .options
            .into_iter()
            .map(|option| {
                AnswerValue::new(option.value)
                    .map(|value| AnswerOption {
                        value,
                        label: option.label,
                    })
                    .ok_or(CatalogError::OptionOutOfRange {
                        question: id,
                        value: option.value,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Question {
            id,
            text: self.text,
            indicators,
            options,
            recommendation: self.recommendation,
        })
    }
}

fn maturity_scale(levels: [&str; 4]) -> Vec<AnswerOption> {
    let mut options = vec![AnswerOption {
        value: AnswerValue::NOT_APPLICABLE,
        label: "Not applicable".to_string(),
    }];
    options.extend((1u8..).zip(levels).filter_map(|(raw, label)| {
        AnswerValue::new(raw).map(|value| AnswerOption {
            value,
            label: label.to_string(),
        })
    }));
    options
}

fn tags(raw: &[u8]) -> BTreeSet<IndicatorId> {
    raw.iter().copied().filter_map(IndicatorId::new).collect()
}

fn question(
    id: u32,
    text: &str,
    indicators: &[u8],
    levels: [&str; 4],
    recommendation: Option<&str>,
) -> Question {
    Question {
        id: QuestionId(id),
        text: text.to_string(),
        indicators: tags(indicators),
        options: maturity_scale(levels),
        recommendation: recommendation.map(str::to_string),
    }
}

const DEFAULT_LEVELS: [&str; 4] = [
    "Nothing in place yet",
    "Isolated initiatives",
    "Structured programme under way",
    "Embedded and monitored",
];

fn standard_questions() -> Vec<Question> {
    vec![
        question(
            1,
            "Has the municipality assessed the energy performance of its schools and public buildings?",
            &[13, 7],
            [
                "No assessment",
                "A few buildings audited",
                "Most buildings audited with a retrofit plan",
                "All buildings audited and retrofits scheduled",
            ],
            Some("Climate action: prioritise thermal insulation of schools (SDG 13)."),
        ),
        question(
            2,
            "Are energy diagnostics carried out before renovating municipal facilities?",
            &[7],
            DEFAULT_LEVELS,
            Some("Energy: speed up energy diagnostics of municipal facilities (SDG 7)."),
        ),
        question(
            3,
            "Does the municipality produce or purchase renewable energy for its own consumption?",
            &[7, 13],
            [
                "No renewable supply",
                "Under 20% renewable",
                "20% to 50% renewable",
                "Over 50% renewable",
            ],
            None,
        ),
        question(
            4,
            "How are leaks on the drinking water network detected?",
            &[6],
            [
                "Only when reported by residents",
                "Occasional inspections",
                "Planned inspection campaigns",
                "Remote metering with automatic alerts",
            ],
            Some("Water: install remote metering to detect network leaks (SDG 6)."),
        ),
        question(
            5,
            "Is wastewater treated to current standards before discharge?",
            &[6, 14],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            6,
            "Does the municipality support access to food aid or local food programmes?",
            &[1, 2],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            7,
            "Are school canteens supplied with local or organic produce?",
            &[2, 12],
            [
                "No local sourcing",
                "Under 20% of supplies",
                "20% to 50% of supplies",
                "Over 50% of supplies",
            ],
            None,
        ),
        question(
            8,
            "How is organic waste handled on the territory?",
            &[12],
            [
                "Landfilled with residual waste",
                "Voluntary drop-off points",
                "Collective composting in some districts",
                "Separate collection or composting everywhere",
            ],
            Some("Waste: roll out collective composting sites (SDG 12)."),
        ),
        question(
            9,
            "Are public health and prevention actions organised for residents?",
            &[3],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            10,
            "Are educational and digital inclusion activities offered to residents of all ages?",
            &[4, 10],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            11,
            "Is there a safe cycling network connecting key facilities?",
            &[11, 3],
            [
                "No dedicated cycling infrastructure",
                "Disconnected sections",
                "Network covering the main routes",
                "Continuous, secured network",
            ],
            Some("Mobility: build secure cycle lanes (SDG 11)."),
        ),
        question(
            12,
            "Does urban planning limit soil sealing and protect natural areas?",
            &[11, 15],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            13,
            "Is biodiversity inventoried and protected on municipal land?",
            &[15],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            14,
            "Are coastal, river or wetland ecosystems managed to prevent pollution?",
            &[14, 6],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            15,
            "Does public procurement include social and environmental clauses?",
            &[12, 8],
            [
                "No clauses",
                "Clauses in a few contracts",
                "Clauses in most contracts",
                "Systematic clauses with follow-up",
            ],
            None,
        ),
        question(
            16,
            "Does the municipality support local employment and the social economy?",
            &[8, 1],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            17,
            "Is broadband or fibre coverage planned for the whole territory?",
            &[9],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            18,
            "Are housing and services accessible to people with reduced mobility or low incomes?",
            &[10, 11],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            19,
            "Are residents involved in municipal decisions (participatory budget, consultations)?",
            &[16],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            20,
            "Does the municipality publish its budgets and decisions in open formats?",
            &[16],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            21,
            "Are gender equality criteria applied in recruitment and appointments?",
            &[5, 10],
            [
                "No criteria",
                "Informal attention to parity",
                "Formal parity objectives",
                "Parity achieved and monitored",
            ],
            Some("Equality: include parity criteria in recruitment (SDG 5)."),
        ),
        question(
            22,
            "Does the municipality take part in partnerships or networks for sustainable development?",
            &[17],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            23,
            "Is there a climate adaptation plan covering floods, heatwaves or droughts?",
            &[13, 11],
            DEFAULT_LEVELS,
            None,
        ),
        question(
            24,
            "Are local businesses supported in reducing their environmental footprint?",
            &[9, 12],
            DEFAULT_LEVELS,
            None,
        ),
    ]
}
