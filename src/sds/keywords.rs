//! SDS keyword scoring
//!
//! Classifies text by counting how many SDS terms it contains. Matching is a
//! case-insensitive substring test; each keyword counts at most once.

/// Document-type synonyms
const DOCUMENT_TERMS: &[&str] = &[
    "SDS",
    "MSDS",
    "Safety Data Sheet",
    "Material Safety Data Sheet",
    "Product Safety Data Sheet",
    "Chemical Safety Data Sheet",
    "Hazard Communication",
    "GHS",
];

/// The sixteen standard section headings
const SECTION_HEADINGS: &[&str] = &[
    "Product Identification",
    "Hazard Identification",
    "Composition",
    "First Aid Measures",
    "Fire Fighting Measures",
    "Accidental Release",
    "Handling and Storage",
    "Exposure Controls",
    "Physical and Chemical Properties",
    "Stability and Reactivity",
    "Toxicological Information",
    "Ecological Information",
    "Disposal Considerations",
    "Transport Information",
    "Regulatory Information",
    "Other Information",
];

/// Regulatory field labels
const FIELD_LABELS: &[&str] = &[
    "UN Number",
    "CAS Number",
    "Dangerous Goods",
    "Hazard Class",
    "Packing Group",
    "Signal Word",
    "Hazard Statement",
    "Precautionary Statement",
];

/// Section numbering
const SECTION_NUMBERS: &[&str] = &["Section 1", "Section 2", "Section 3", "Section 4", "Section 5"];

/// Immutable keyword list, built once at startup
#[derive(Debug, Clone)]
pub struct KeywordSet {
    /// (original, lower-cased)
    keywords: Vec<(String, String)>,
}

impl Default for KeywordSet {
    fn default() -> Self {
        Self::new(
            DOCUMENT_TERMS
                .iter()
                .chain(SECTION_HEADINGS)
                .chain(FIELD_LABELS)
                .chain(SECTION_NUMBERS)
                .copied(),
        )
    }
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| {
                    let k = k.as_ref();
                    (k.to_string(), k.to_lowercase())
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Keywords present in `lowercase_text`, in list order
    pub fn matches<'a>(&'a self, lowercase_text: &str) -> Vec<&'a str> {
        self.keywords
            .iter()
            .filter(|(_, lower)| lowercase_text.contains(lower.as_str()))
            .map(|(original, _)| original.as_str())
            .collect()
    }

    /// Number of keywords present in `text` (any case)
    pub fn score(&self, text: &str) -> usize {
        self.matches(&text.to_lowercase()).len()
    }
}
