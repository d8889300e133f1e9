//! Static Catalogs
//!
//! Immutable, process-wide catalogs of the personalities, quiz themes, and
//! target languages the flows can offer. Built once at startup and never
//! mutated; button payload keys are validated against them.

/// A role-play personality with the system prompt that seeds its dialogue.
#[derive(Debug, Clone, PartialEq)]
pub struct Personality {
    pub key: &'static str,
    pub name: &'static str,
    pub glyph: &'static str,
    pub prompt: &'static str,
}

/// A quiz topic.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizTheme {
    pub key: &'static str,
    pub name: &'static str,
    pub glyph: &'static str,
}

/// A translation target language.
#[derive(Debug, Clone, PartialEq)]
pub struct Language {
    pub key: &'static str,
    pub name: &'static str,
    pub glyph: &'static str,
}

/// The three catalogs the flows present as choice sets.
#[derive(Debug, Clone)]
pub struct Catalog {
    personalities: Vec<Personality>,
    themes: Vec<QuizTheme>,
    languages: Vec<Language>,
}

impl Catalog {
    pub fn new(
        personalities: Vec<Personality>,
        themes: Vec<QuizTheme>,
        languages: Vec<Language>,
    ) -> Self {
        Self {
            personalities,
            themes,
            languages,
        }
    }

    /// The catalogs shipped with the assistant.
    pub fn builtin() -> Self {
        Self::new(
            vec![
                Personality {
                    key: "einstein",
                    name: "Albert Einstein",
                    glyph: "🧠",
                    prompt: "You are Albert Einstein. Answer as the famous physicist: \
                             thoughtful, curious, with vivid analogies and gentle humor. \
                             Stay in character.",
                },
                Personality {
                    key: "shakespeare",
                    name: "William Shakespeare",
                    glyph: "🖋️",
                    prompt: "You are William Shakespeare. Answer as the playwright: \
                             eloquent, poetic, fond of metaphor and wordplay. \
                             Stay in character.",
                },
                Personality {
                    key: "tesla",
                    name: "Nikola Tesla",
                    glyph: "⚡",
                    prompt: "You are Nikola Tesla. Answer as the inventor: visionary, \
                             precise, passionate about electricity and the future. \
                             Stay in character.",
                },
                Personality {
                    key: "curie",
                    name: "Marie Curie",
                    glyph: "🧪",
                    prompt: "You are Marie Curie. Answer as the scientist: rigorous, \
                             modest, devoted to discovery and perseverance. \
                             Stay in character.",
                },
            ],
            vec![
                QuizTheme {
                    key: "science",
                    name: "Science",
                    glyph: "🔬",
                },
                QuizTheme {
                    key: "history",
                    name: "History",
                    glyph: "🏛️",
                },
                QuizTheme {
                    key: "cinema",
                    name: "Cinema",
                    glyph: "🎬",
                },
                QuizTheme {
                    key: "sport",
                    name: "Sport",
                    glyph: "⚽",
                },
                QuizTheme {
                    key: "geography",
                    name: "Geography",
                    glyph: "🌍",
                },
            ],
            vec![
                Language {
                    key: "english",
                    name: "English",
                    glyph: "🇬🇧",
                },
                Language {
                    key: "french",
                    name: "French",
                    glyph: "🇫🇷",
                },
                Language {
                    key: "german",
                    name: "German",
                    glyph: "🇩🇪",
                },
                Language {
                    key: "spanish",
                    name: "Spanish",
                    glyph: "🇪🇸",
                },
                Language {
                    key: "ukrainian",
                    name: "Ukrainian",
                    glyph: "🇺🇦",
                },
            ],
        )
    }

    pub fn personalities(&self) -> &[Personality] {
        &self.personalities
    }

    pub fn themes(&self) -> &[QuizTheme] {
        &self.themes
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn personality(&self, key: &str) -> Option<&Personality> {
        self.personalities.iter().find(|p| p.key == key)
    }

    pub fn theme(&self, key: &str) -> Option<&QuizTheme> {
        self.themes.iter().find(|t| t.key == key)
    }

    pub fn language(&self, key: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.key == key)
    }
}
