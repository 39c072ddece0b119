//! Comment tokenizer: splitting, length reduction, stopwords, gendered-pronoun
//! placeholders, name scrubbing and optional Snowball stemming.

use std::collections::HashSet;

use clap::ValueEnum;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use whatlang::Lang;

/// Placeholder substituted for a guest's name in their own comments.
pub const NAME_TOKEN: &str = "<name>";
/// Placeholder for every gendered pronoun in [`PronounMode::Simple`].
pub const PRONOUN_TOKEN: &str = "<pronoun>";

/// Punctuation dropped by default. `!` and `?` are kept on purpose.
pub const DEFAULT_STOPWORDS: [&str; 12] = [
    "-", "–", "“", "”", "\"", "'", "’", ".", ",", ";", ":", "`",
];

const SIMPLE_PRONOUNS: [&str; 14] = [
    "he", "she", "he's", "she's", "hes", "shes", "he'd", "she'd", "him", "his", "her", "hers",
    "himself", "herself",
];

/// Input text considered for language detection.
const DETECT_SAMPLE_BYTES: usize = 100_000;

/// How gendered pronouns are rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
pub enum PronounMode {
    /// Leave pronouns as they are.
    Off,
    /// Every gendered pronoun becomes `<pronoun>`.
    #[default]
    Simple,
    /// Keep the grammatical form: `<he/she>`, `<him/his/her/hers>`, ...
    Detailed,
}

/// Languages with a Snowball stemmer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
pub enum StemLang {
    En,
    De,
    Fr,
    Es,
    It,
    Pt,
    Nl,
    Ru,
    Sv,
    Da,
    Fi,
    Hu,
    Tr,
}

impl StemLang {
    fn algorithm(self) -> Algorithm {
        match self {
            StemLang::En => Algorithm::English,
            StemLang::De => Algorithm::German,
            StemLang::Fr => Algorithm::French,
            StemLang::Es => Algorithm::Spanish,
            StemLang::It => Algorithm::Italian,
            StemLang::Pt => Algorithm::Portuguese,
            StemLang::Nl => Algorithm::Dutch,
            StemLang::Ru => Algorithm::Russian,
            StemLang::Sv => Algorithm::Swedish,
            StemLang::Da => Algorithm::Danish,
            StemLang::Fi => Algorithm::Finnish,
            StemLang::Hu => Algorithm::Hungarian,
            StemLang::Tr => Algorithm::Turkish,
        }
    }

    fn from_lang(lang: Lang) -> Option<Self> {
        Some(match lang {
            Lang::Eng => StemLang::En,
            Lang::Deu => StemLang::De,
            Lang::Fra => StemLang::Fr,
            Lang::Spa => StemLang::Es,
            Lang::Ita => StemLang::It,
            Lang::Por => StemLang::Pt,
            Lang::Nld => StemLang::Nl,
            Lang::Rus => StemLang::Ru,
            Lang::Swe => StemLang::Sv,
            Lang::Dan => StemLang::Da,
            Lang::Fin => StemLang::Fi,
            Lang::Hun => StemLang::Hu,
            Lang::Tur => StemLang::Tr,
            _ => return None,
        })
    }
}

/// Stemming policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StemMode {
    #[default]
    Off,
    /// Detect the language of the corpus; skip stemming if that fails.
    Auto,
    Force(StemLang),
}

/// Detect the corpus language and map it to a stemmer, if one exists and
/// detection is reliable.
pub fn detect_stem_lang(text: &str) -> Option<StemLang> {
    let info = whatlang::detect(leading(text, DETECT_SAMPLE_BYTES))?;
    if !info.is_reliable() {
        return None;
    }
    StemLang::from_lang(info.lang())
}

/// At most `max` leading bytes of `text`, cut on a char boundary.
fn leading(text: &str, max: usize) -> &str {
    let mut end = text.len().min(max);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Equal leading shares of every text, joined, so detection sees all groups.
pub fn detection_sample(texts: &[&str]) -> String {
    let share = DETECT_SAMPLE_BYTES / texts.len().max(1);
    texts
        .iter()
        .map(|t| leading(t, share))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turn a [`StemMode`] into the concrete language to stem with, detecting it
/// from `sample` when needed.
pub fn resolve_stem_lang(mode: StemMode, sample: &str) -> Option<StemLang> {
    match mode {
        StemMode::Off => None,
        StemMode::Force(lang) => Some(lang),
        StemMode::Auto => {
            let lang = detect_stem_lang(sample);
            match lang {
                Some(l) => log::info!("Detected stemming language: {l:?}"),
                None => log::warn!("Language detection failed; stemming disabled"),
            }
            lang
        }
    }
}

/// Tokenizer for comment text.
///
/// ```
/// use fighting_words::{CommentTokenizer, PronounMode};
/// let t = CommentTokenizer::new().with_pronouns(PronounMode::Simple);
/// assert_eq!(t.tokenize("She's sooooo funny!!"), vec!["<pronoun>", "sooo", "funny", "!", "!"]);
/// ```
#[derive(Debug, Clone)]
pub struct CommentTokenizer {
    pronouns: PronounMode,
    stopwords: HashSet<String>,
    stem: Option<StemLang>,
    reduce_len: bool,
}

impl Default for CommentTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CommentTokenizer {
    /// Punctuation stopwords, length reduction on, no pronoun rewriting, no stemming.
    pub fn new() -> Self {
        Self {
            pronouns: PronounMode::Off,
            stopwords: DEFAULT_STOPWORDS.iter().map(|s| s.to_string()).collect(),
            stem: None,
            reduce_len: true,
        }
    }

    pub fn with_pronouns(mut self, mode: PronounMode) -> Self {
        self.pronouns = mode;
        self
    }

    /// Replace the stopword list.
    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_stemming(mut self, lang: Option<StemLang>) -> Self {
        self.stem = lang;
        self
    }

    pub fn with_reduce_len(mut self, on: bool) -> Self {
        self.reduce_len = on;
        self
    }

    pub fn stem_lang(&self) -> Option<StemLang> {
        self.stem
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let stemmer = self.stem.map(|l| Stemmer::create(l.algorithm()));
        split_tokens(text)
            .into_iter()
            .filter(|t| !self.stopwords.contains(t))
            .map(|t| {
                let t = if self.reduce_len {
                    reduce_lengthening(&t)
                } else {
                    t
                };
                match replace_pronoun(&t, self.pronouns) {
                    Some(p) => p.to_string(),
                    None => match &stemmer {
                        Some(s) if is_stemmable(&t) => s.stem(&t).into_owned(),
                        _ => t,
                    },
                }
            })
            .collect()
    }
}

fn is_stemmable(token: &str) -> bool {
    token.chars().all(char::is_alphabetic)
}

/// Placeholder rewrite for a gendered pronoun, if `token` is one.
pub fn replace_pronoun(token: &str, mode: PronounMode) -> Option<&'static str> {
    match mode {
        PronounMode::Off => None,
        PronounMode::Simple => SIMPLE_PRONOUNS.contains(&token).then_some(PRONOUN_TOKEN),
        PronounMode::Detailed => match token {
            "he" | "she" => Some("<he/she>"),
            "he's" | "she's" => Some("<he's/she's>"),
            "hes" | "shes" => Some("<hes/shes>"),
            "he'd" | "she'd" => Some("<he'd/she'd>"),
            "him" | "his" | "her" | "hers" => Some("<him/his/her/hers>"),
            "himself" | "herself" => Some("<himself/herself>"),
            _ => None,
        },
    }
}

/// Cut runs of more than three identical characters down to three.
pub fn reduce_lengthening(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut prev = None;
    let mut run = 0;
    for c in token.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= 3 {
            out.push(c);
        }
    }
    out
}

/// Lowercase and split `text` into raw tokens.
///
/// Words keep inner apostrophes (curly ones are normalized to `'`) and a
/// leading `#` or `@`. Placeholders like `<name>` stay whole. Any other
/// non-space character is a token of its own, with emoji modifiers and ZWJ
/// sequences attached to the emoji they belong to.
pub fn split_tokens(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    let n = chars.len();
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut i = 0;

    let flush = |word: &mut String, tokens: &mut Vec<String>| {
        if !word.is_empty() {
            tokens.push(std::mem::take(word));
        }
    };

    while i < n {
        let c = chars[i];
        let next_is_word = chars.get(i + 1).is_some_and(|&c| is_word_char(c));
        let placeholder = if c == '<' {
            placeholder_len(&chars[i..])
        } else {
            None
        };

        if c.is_whitespace() {
            flush(&mut word, &mut tokens);
            i += 1;
        } else if let Some(len) = placeholder {
            flush(&mut word, &mut tokens);
            tokens.push(chars[i..i + len].iter().collect());
            i += len;
        } else if is_word_char(c) || (matches!(c, '#' | '@') && word.is_empty() && next_is_word) {
            word.push(c);
            i += 1;
        } else if matches!(c, '\'' | '’') && !word.is_empty() && next_is_word {
            word.push('\'');
            i += 1;
        } else {
            flush(&mut word, &mut tokens);
            let mut symbol = String::from(c);
            i += 1;
            while i < n && is_emoji_joiner(chars[i]) {
                symbol.push(chars[i]);
                if chars[i] == '\u{200d}' && i + 1 < n {
                    symbol.push(chars[i + 1]);
                    i += 1;
                }
                i += 1;
            }
            tokens.push(symbol);
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_emoji_joiner(c: char) -> bool {
    matches!(c, '\u{200d}' | '\u{fe0e}' | '\u{fe0f}' | '\u{1f3fb}'..='\u{1f3ff}')
}

/// Length of a `<word>` or `<a/b>` placeholder at the start of `chars`.
fn placeholder_len(chars: &[char]) -> Option<usize> {
    let close = chars.iter().take(32).position(|&c| c == '>')?;
    let inner = &chars[1..close];
    let valid = !inner.is_empty()
        && inner
            .iter()
            .all(|&c| c.is_alphabetic() || c == '/' || c == '\'');
    valid.then_some(close + 1)
}

/// Replace a guest's name in `text` with [`NAME_TOKEN`].
///
/// The full name is replaced first, then every name part of two or more
/// characters, all as whole words and case-insensitively. The result is
/// lowercased.
pub fn scrub_names(text: &str, guest_name: &str) -> String {
    let full = guest_name.trim().to_lowercase();
    let mut variants: Vec<String> = full
        .split_whitespace()
        .filter(|p| p.chars().count() >= 2)
        .map(str::to_string)
        .collect();
    variants.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    variants.dedup();
    if !full.is_empty() && !variants.contains(&full) {
        variants.insert(0, full);
    }

    let mut out = text.to_lowercase();
    for v in &variants {
        out = replace_word(&out, v, NAME_TOKEN);
    }
    out
}

fn replace_word(haystack: &str, needle: &str, replacement: &str) -> String {
    let boundary =
        |c: Option<char>| c.is_none_or(|c| !c.is_alphanumeric() && c != '<' && c != '>');
    let mut out = String::with_capacity(haystack.len());
    let mut last = 0;
    for (pos, _) in haystack.match_indices(needle) {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + needle.len()..].chars().next();
        if boundary(before) && boundary(after) {
            out.push_str(&haystack[last..pos]);
            out.push_str(replacement);
            last = pos + needle.len();
        }
    }
    out.push_str(&haystack[last..]);
    out
}
