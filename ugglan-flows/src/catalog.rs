//! Which fields the wizards can write, and how each wizard asks for them.

use serde::{Deserialize, Serialize};

use crate::guard::Constraints;

/// Filler words the field texts should not lean on.
const FILLER: &[&str] = &["fantastisk", "unik", "magisk", "synergi", "spännande resa"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Purpose,
    AudienceProfile,
    Subtitle,
    TargetGroup,
    PreviousFeedback,
    ProgramNotes,
    PublicDescription,
}

/// Generation instruction and constraints for one field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    pub kind: FieldKind,
    /// Swedish noun phrase used in questions, e.g. "en underrubrik".
    pub label: &'static str,
    pub instruction: &'static str,
    pub required_prefix: Option<&'static str>,
    pub min_words: Option<usize>,
    pub max_words: usize,
    pub temperature: f32,
}

impl FieldKind {
    pub const ALL: [FieldKind; 7] = [
        Self::Purpose,
        Self::AudienceProfile,
        Self::Subtitle,
        Self::TargetGroup,
        Self::PreviousFeedback,
        Self::ProgramNotes,
        Self::PublicDescription,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Purpose => "purpose",
            Self::AudienceProfile => "audience_profile",
            Self::Subtitle => "subtitle",
            Self::TargetGroup => "target_group",
            Self::PreviousFeedback => "previous_feedback",
            Self::ProgramNotes => "program_notes",
            Self::PublicDescription => "public_description",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name.trim())
    }

    pub fn spec(self) -> FieldSpec {
        match self {
            Self::Purpose => FieldSpec {
                kind: self,
                label: "en syftesbeskrivning",
                instruction: "Skapa en syftesbeskrivning som svarar på varför eventet \
                              genomförs. Fokusera på intention och önskad effekt, inte på \
                              aktiviteter. 1–3 meningar.",
                required_prefix: None,
                min_words: Some(8),
                max_words: 50,
                temperature: 0.4,
            },
            Self::AudienceProfile => FieldSpec {
                kind: self,
                label: "en deltagarbeskrivning",
                instruction: "Skapa en deltagarbeskrivning på 2–3 meningar, vardaglig, \
                              positiv och inkluderande. Om en deltagartyp anges, skriv att \
                              profilen kan luta åt den. Annars att gruppen är blandad och \
                              behöver variation.",
                required_prefix: Some("Deltagarna är"),
                min_words: Some(8),
                max_words: 60,
                temperature: 0.4,
            },
            Self::Subtitle => FieldSpec {
                kind: self,
                label: "en underrubrik",
                instruction: "Skapa en kort underrubrik som fångar eventets tema eller fokus.",
                required_prefix: None,
                min_words: None,
                max_words: 8,
                temperature: 0.5,
            },
            Self::TargetGroup => FieldSpec {
                kind: self,
                label: "en målgruppsbeskrivning",
                instruction: "Sammanfatta målgruppen i löpande text utifrån tre nivåer av \
                              deltagare: obligatoriska, gärna och i mån av plats.",
                required_prefix: None,
                min_words: None,
                max_words: 50,
                temperature: 0.3,
            },
            Self::PreviousFeedback => FieldSpec {
                kind: self,
                label: "en sammanfattning av tidigare feedback",
                instruction: "Sammanfatta relevant deltagarfeedback från tidigare event.",
                required_prefix: None,
                min_words: None,
                max_words: 50,
                temperature: 0.3,
            },
            Self::ProgramNotes => FieldSpec {
                kind: self,
                label: "en objektiv eventbeskrivning",
                instruction: "Skapa en objektiv beskrivning av eventet baserat på metadata.",
                required_prefix: None,
                min_words: None,
                max_words: 60,
                temperature: 0.3,
            },
            Self::PublicDescription => FieldSpec {
                kind: self,
                label: "en publik beskrivning",
                instruction: "Skapa en publik beskrivning som lockar deltagare och bygger \
                              på eventets övriga fält.",
                required_prefix: None,
                min_words: Some(20),
                max_words: 80,
                temperature: 0.5,
            },
        }
    }
}

impl FieldSpec {
    /// A filler word the user asked for in a must-include phrase is not banned.
    pub fn constraints<S: AsRef<str>>(&self, must_include: &[S]) -> Constraints {
        let required: Vec<String> = must_include
            .iter()
            .map(|phrase| phrase.as_ref().to_lowercase())
            .collect();
        let filler: Vec<&str> = FILLER
            .iter()
            .copied()
            .filter(|term| !required.iter().any(|phrase| phrase.contains(term)))
            .collect();
        let mut constraints = Constraints::new()
            .must_include(must_include)
            .forbidden_terms(&filler)
            .word_bounds(self.min_words, Some(self.max_words));
        if let Some(prefix) = self.required_prefix {
            constraints = constraints.required_prefix(prefix);
        }
        constraints
    }
}

/// How an answer is folded into the wizard state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Merge {
    /// Stored under the question's key.
    Answer,
    /// Appended to `must_include` as one phrase.
    MustInclude,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Question {
    pub key: &'static str,
    /// Heading the answer gets in the generation request.
    pub label: &'static str,
    /// May contain `{{label}}`, replaced by the field's label.
    pub text: &'static str,
    pub required: bool,
    pub merge: Merge,
    pub options: &'static [&'static str],
}

const PURPOSE_QUESTIONS: &[Question] = &[
    Question {
        key: "why1",
        label: "WHY1",
        text: "Ett tydligt syfte är avgörande för ett lyckat event. Det fungerar som en \
               kompass i viktiga vägval.\n\nSyftet ska svara på **varför** eventet \
               genomförs, gärna både ur arrangörens och deltagarnas perspektiv.\n\n\
               Börja med att kort beskriva varför det här eventet planeras.",
        required: true,
        merge: Merge::Answer,
        options: &[],
    },
    Question {
        key: "why2",
        label: "WHY2",
        text: "Tack! Ofta finns också ett **djupare syfte**.\n\nFundera till exempel på:\n\
               - Varför är det viktigt att ses just nu?\n\
               - Vilken förändring vill ni se som resultat?\n\n\
               Beskriv kort vilka effekter eller nyttor ni hoppas uppnå.",
        required: true,
        merge: Merge::Answer,
        options: &[],
    },
];

const AUDIENCE_QUESTIONS: &[Question] = &[
    Question {
        key: "who",
        label: "WHO + NEEDS",
        text: "Lyckade event bygger på formeln: **varför** och **för vem**.\n\nBörja med \
               att kort beskriva vilka som ska delta och vilka behov, önskemål eller \
               förväntningar de kan ha.",
        required: true,
        merge: Merge::Answer,
        options: &[],
    },
    Question {
        key: "archetype",
        label: "ARCHETYPE",
        text: "En sista fråga.\n\nVi utgår från tre deltagartyper:\n- Analytiker\n\
               - Interaktörer\n- Visionärer\n\nTror du att någon av dessa är vanligare i \
               gruppen?",
        required: true,
        merge: Merge::Answer,
        options: &["Analytiker", "Interaktörer", "Visionärer", "Blandat"],
    },
];

const EVENT_DATA_QUESTIONS: &[Question] = &[Question {
    key: "clarify",
    label: "MÅSTE MED",
    text: "Jag hjälper dig att skapa {{label}}. Finns det ett uttryck som måste vara \
           med exakt så som du skriver det? Skriv det här, eller lämna tomt.",
    required: false,
    merge: Merge::MustInclude,
    options: &[],
}];

/// Context keys offered to the model as event metadata.
pub const EVENT_METADATA: &[(&str, &str)] = &[
    ("event_name", "Eventnamn"),
    ("subtitle", "Underrubrik"),
    ("target_group", "Målgrupp"),
    ("previous_feedback", "Tidigare feedback"),
    ("purpose", "Syfte"),
];

/// The question wizards served by the generic dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WizardKind {
    Purpose,
    Audience,
    EventData,
}

impl WizardKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Purpose => "purpose",
            Self::Audience => "audience",
            Self::EventData => "event_data",
        }
    }

    /// The record the finalize action writes to.
    pub fn entity(self) -> &'static str {
        match self {
            Self::Purpose | Self::Audience => "program",
            Self::EventData => "event",
        }
    }

    /// `None` when the caller names the field per request.
    pub fn fixed_field(self) -> Option<FieldKind> {
        match self {
            Self::Purpose => Some(FieldKind::Purpose),
            Self::Audience => Some(FieldKind::AudienceProfile),
            Self::EventData => None,
        }
    }

    pub fn questions(self) -> &'static [Question] {
        match self {
            Self::Purpose => PURPOSE_QUESTIONS,
            Self::Audience => AUDIENCE_QUESTIONS,
            Self::EventData => EVENT_DATA_QUESTIONS,
        }
    }

    pub fn question_keys(self) -> Vec<&'static str> {
        self.questions().iter().map(|q| q.key).collect()
    }

    /// Suffix of the `has_*` / `existing_*` context keys for the saved value.
    pub fn existing_alias(self) -> Option<&'static str> {
        match self {
            Self::Purpose => Some("purpose"),
            Self::Audience => Some("audience"),
            Self::EventData => None,
        }
    }

    pub fn uses_event_metadata(self) -> bool {
        matches!(self, Self::EventData)
    }
}
