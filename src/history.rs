//! Historical venue tables for the tracked conferences (2009-2024).
//!
//! Each conference maps to the source-system keys it used over time, the
//! years it did not convene, the paper-count floor used by health checks,
//! and the short names of the venues it grew out of. The tables are plain
//! statics; nothing mutates them at runtime.

/// First year covered by the tables
pub const FIRST_YEAR: i32 = 2009;

/// Last year covered by the tables
pub const LAST_YEAR: i32 = 2024;

/// Research field a conference belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Field {
    #[serde(rename = "SE")]
    SoftwareEngineering,
    #[serde(rename = "AI_ML")]
    MachineLearning,
    #[serde(rename = "NLP")]
    NaturalLanguage,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::SoftwareEngineering => "SE",
            Field::MachineLearning => "AI_ML",
            Field::NaturalLanguage => "NLP",
        }
    }
}

/// Metadata system that indexes a conference
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// DBLP XML proceedings feeds, keys like `conf/icse`
    Dblp,
    /// ACL Anthology event pages, keys like `venues/acl`
    Anthology,
}

impl SourceKind {
    /// Source key for a bare venue short name, e.g. `wcre` -> `conf/wcre`
    pub fn key_for(self, short: &str) -> String {
        match self {
            SourceKind::Dblp => format!("conf/{}", short),
            SourceKind::Anthology => format!("venues/{}", short),
        }
    }
}

/// One `(start, end, key, short)` entry of a venue history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VenueRange {
    pub start: i32,
    pub end: i32,
    pub key: &'static str,
    pub short: &'static str,
}

impl VenueRange {
    pub const fn new(start: i32, end: i32, key: &'static str, short: &'static str) -> Self {
        Self { start, end, key, short }
    }

    pub fn covers(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Minimum expected paper count over a year range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaperFloor {
    pub start: i32,
    pub end: i32,
    pub minimum: usize,
}

impl PaperFloor {
    pub const fn new(start: i32, end: i32, minimum: usize) -> Self {
        Self { start, end, minimum }
    }
}

/// Everything the catalog knows about one conference
#[derive(Debug, Clone, Copy)]
pub struct ConferenceRecord {
    /// Canonical acronym, e.g. `SANER`
    pub name: &'static str,
    /// Display name written into every fetched paper's venue
    pub full_name: &'static str,
    pub field: Field,
    pub source: SourceKind,
    /// Ascending, non-overlapping
    pub history: &'static [VenueRange],
    pub gap_years: &'static [i32],
    pub floors: &'static [PaperFloor],
    /// Short names of earlier identities, most recent first
    pub predecessors: &'static [&'static str],
}

const fn floors(a: usize, b: usize, c: usize) -> [PaperFloor; 3] {
    [
        PaperFloor::new(2009, 2014, a),
        PaperFloor::new(2015, 2019, b),
        PaperFloor::new(2020, 2024, c),
    ]
}

const NO_GAPS: &[i32] = &[];
const NO_PREDECESSORS: &[&str] = &[];

// === Software Engineering ===

const SANER: ConferenceRecord = ConferenceRecord {
    name: "SANER",
    full_name: "IEEE International Conference on Software Analysis, Evolution and Reengineering",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2015, 2024, "conf/wcre", "saner")],
    gap_years: &[2009, 2010, 2011, 2012, 2013, 2014],
    floors: &floors(20, 30, 40),
    predecessors: &["wcre", "csmr"],
};

const ICSME: ConferenceRecord = ConferenceRecord {
    name: "ICSME",
    full_name: "IEEE International Conference on Software Maintenance and Evolution",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2014, 2024, "conf/icsm", "icsme")],
    gap_years: &[2009, 2010, 2011, 2012, 2013],
    floors: &floors(25, 35, 45),
    predecessors: &["icsm"],
};

const ICPC: ConferenceRecord = ConferenceRecord {
    name: "ICPC",
    full_name: "IEEE International Conference on Program Comprehension",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/iwpc", "icpc")],
    gap_years: NO_GAPS,
    floors: &floors(10, 15, 20),
    predecessors: NO_PREDECESSORS,
};

const ASE: ConferenceRecord = ConferenceRecord {
    name: "ASE",
    full_name: "IEEE/ACM International Conference on Automated Software Engineering",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/kbse", "ase")],
    gap_years: NO_GAPS,
    floors: &floors(40, 60, 80),
    predecessors: NO_PREDECESSORS,
};

const FSE: ConferenceRecord = ConferenceRecord {
    name: "FSE",
    full_name: "ACM SIGSOFT International Symposium on Foundations of Software Engineering",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/sigsoft", "fse")],
    gap_years: NO_GAPS,
    floors: &floors(60, 80, 100),
    predecessors: NO_PREDECESSORS,
};

const ICSE: ConferenceRecord = ConferenceRecord {
    name: "ICSE",
    full_name: "International Conference on Software Engineering",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/icse", "icse")],
    gap_years: NO_GAPS,
    floors: &floors(80, 100, 120),
    predecessors: NO_PREDECESSORS,
};

const ISSTA: ConferenceRecord = ConferenceRecord {
    name: "ISSTA",
    full_name: "International Symposium on Software Testing and Analysis",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/issta", "issta")],
    gap_years: NO_GAPS,
    floors: &floors(15, 20, 25),
    predecessors: NO_PREDECESSORS,
};

const MSR: ConferenceRecord = ConferenceRecord {
    name: "MSR",
    full_name: "International Conference on Mining Software Repositories",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/msr", "msr")],
    gap_years: NO_GAPS,
    floors: &floors(15, 25, 30),
    predecessors: NO_PREDECESSORS,
};

const ICSA: ConferenceRecord = ConferenceRecord {
    name: "ICSA",
    full_name: "International Conference on Software Architecture",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2017, 2024, "conf/icsa", "icsa")],
    gap_years: &[2009, 2010, 2011, 2012, 2013, 2014, 2015, 2016],
    floors: &floors(8, 12, 15),
    predecessors: &["wicsa"],
};

const ECSA: ConferenceRecord = ConferenceRecord {
    name: "ECSA",
    full_name: "European Conference on Software Architecture",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/ecsa", "ecsa")],
    gap_years: NO_GAPS,
    floors: &floors(8, 12, 15),
    predecessors: NO_PREDECESSORS,
};

const OOPSLA: ConferenceRecord = ConferenceRecord {
    name: "OOPSLA",
    full_name: "ACM Conference on Object-Oriented Programming, Systems, Languages, and Applications",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/oopsla", "oopsla")],
    gap_years: NO_GAPS,
    floors: &floors(25, 35, 45),
    predecessors: NO_PREDECESSORS,
};

const RE: ConferenceRecord = ConferenceRecord {
    name: "RE",
    full_name: "IEEE International Requirements Engineering Conference",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/re", "re")],
    gap_years: NO_GAPS,
    floors: &floors(15, 20, 25),
    predecessors: NO_PREDECESSORS,
};

const ISSRE: ConferenceRecord = ConferenceRecord {
    name: "ISSRE",
    full_name: "IEEE International Symposium on Software Reliability Engineering",
    field: Field::SoftwareEngineering,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/issre", "issre")],
    gap_years: NO_GAPS,
    floors: &floors(10, 15, 20),
    predecessors: NO_PREDECESSORS,
};

// === AI / ML ===

const ICML: ConferenceRecord = ConferenceRecord {
    name: "ICML",
    full_name: "International Conference on Machine Learning",
    field: Field::MachineLearning,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/icml", "icml")],
    gap_years: NO_GAPS,
    floors: &floors(200, 400, 800),
    predecessors: NO_PREDECESSORS,
};

// NeurIPS kept the NIPS key in DBLP after the 2018 rename
const NIPS: ConferenceRecord = ConferenceRecord {
    name: "NIPS",
    full_name: "Conference on Neural Information Processing Systems",
    field: Field::MachineLearning,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/nips", "neurips")],
    gap_years: NO_GAPS,
    floors: &floors(300, 600, 1200),
    predecessors: NO_PREDECESSORS,
};

const ICLR: ConferenceRecord = ConferenceRecord {
    name: "ICLR",
    full_name: "International Conference on Learning Representations",
    field: Field::MachineLearning,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2013, 2024, "conf/iclr", "iclr")],
    gap_years: &[2009, 2010, 2011, 2012],
    floors: &[
        PaperFloor::new(2013, 2016, 100),
        PaperFloor::new(2017, 2019, 300),
        PaperFloor::new(2020, 2024, 600),
    ],
    predecessors: NO_PREDECESSORS,
};

const AAAI: ConferenceRecord = ConferenceRecord {
    name: "AAAI",
    full_name: "AAAI Conference on Artificial Intelligence",
    field: Field::MachineLearning,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/aaai", "aaai")],
    gap_years: NO_GAPS,
    floors: &floors(200, 400, 800),
    predecessors: NO_PREDECESSORS,
};

const IJCAI: ConferenceRecord = ConferenceRecord {
    name: "IJCAI",
    full_name: "International Joint Conference on Artificial Intelligence",
    field: Field::MachineLearning,
    source: SourceKind::Dblp,
    history: &[VenueRange::new(2009, 2024, "conf/ijcai", "ijcai")],
    gap_years: NO_GAPS,
    floors: &floors(150, 250, 400),
    predecessors: NO_PREDECESSORS,
};

// === NLP ===

const ACL: ConferenceRecord = ConferenceRecord {
    name: "ACL",
    full_name: "Annual Meeting of the Association for Computational Linguistics",
    field: Field::NaturalLanguage,
    source: SourceKind::Anthology,
    history: &[VenueRange::new(2009, 2024, "venues/acl", "acl")],
    gap_years: NO_GAPS,
    floors: &floors(150, 250, 400),
    predecessors: NO_PREDECESSORS,
};

const EMNLP: ConferenceRecord = ConferenceRecord {
    name: "EMNLP",
    full_name: "Conference on Empirical Methods in Natural Language Processing",
    field: Field::NaturalLanguage,
    source: SourceKind::Anthology,
    history: &[VenueRange::new(2009, 2024, "venues/emnlp", "emnlp")],
    gap_years: NO_GAPS,
    floors: &floors(150, 250, 400),
    predecessors: NO_PREDECESSORS,
};

const NAACL: ConferenceRecord = ConferenceRecord {
    name: "NAACL",
    full_name: "North American Chapter of the Association for Computational Linguistics",
    field: Field::NaturalLanguage,
    source: SourceKind::Anthology,
    history: &[VenueRange::new(2009, 2024, "venues/naacl", "naacl")],
    gap_years: &[2011, 2014, 2017, 2020, 2023],
    floors: &floors(80, 120, 200),
    predecessors: NO_PREDECESSORS,
};

// Biennial, even years only
const COLING: ConferenceRecord = ConferenceRecord {
    name: "COLING",
    full_name: "International Conference on Computational Linguistics",
    field: Field::NaturalLanguage,
    source: SourceKind::Anthology,
    history: &[VenueRange::new(2009, 2024, "venues/coling", "coling")],
    gap_years: &[2009, 2011, 2013, 2015, 2017, 2019, 2021, 2023],
    floors: &floors(150, 200, 300),
    predecessors: NO_PREDECESSORS,
};

/// All tracked conferences, in display order
pub static CONFERENCES: &[ConferenceRecord] = &[
    SANER, ICSME, ICPC, ASE, FSE, ICSE, ISSTA, MSR, ICSA, ECSA, OOPSLA, RE, ISSRE, ICML, NIPS,
    ICLR, AAAI, IJCAI, ACL, EMNLP, NAACL, COLING,
];

/// Alternate spellings accepted on lookup
pub(crate) const ALIASES: &[(&str, &str)] = &[("NEURIPS", "NIPS")];
