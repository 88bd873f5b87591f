//! CLI enum types.

use clap::ValueEnum;

use crate::language::Language;

/// Language accepted on the command line, by name or ISO code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LanguageArg {
    #[default]
    #[value(alias = "en")]
    English,
    #[value(alias = "te")]
    Telugu,
    #[value(alias = "hi")]
    Hindi,
    #[value(alias = "ta")]
    Tamil,
    #[value(alias = "kn")]
    Kannada,
    #[value(alias = "es")]
    Spanish,
    #[value(alias = "fr")]
    French,
    #[value(alias = "de")]
    German,
}

impl From<LanguageArg> for Language {
    fn from(l: LanguageArg) -> Self {
        match l {
            LanguageArg::English => Language::English,
            LanguageArg::Telugu => Language::Telugu,
            LanguageArg::Hindi => Language::Hindi,
            LanguageArg::Tamil => Language::Tamil,
            LanguageArg::Kannada => Language::Kannada,
            LanguageArg::Spanish => Language::Spanish,
            LanguageArg::French => Language::French,
            LanguageArg::German => Language::German,
        }
    }
}
