//! Fixed value sets of the CMS select fields.
//!
//! The CMS stores the human-facing label as the value, so each variant maps to
//! exactly one label string and unknown labels are rejected.

use serde::{Deserialize, Serialize};

/// A closed set of CMS select labels.
pub trait SelectValue: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|value| value.as_str() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkCategory {
    #[serde(rename = "保守運用")]
    Maintenance,
    #[serde(rename = "Webシステム構築")]
    WebSystem,
    #[serde(rename = "WordPressサイト構築")]
    WordPressSite,
    #[serde(rename = "LP制作")]
    LandingPage,
    #[serde(rename = "静的サイト構築")]
    StaticSite,
}

impl SelectValue for WorkCategory {
    const ALL: &'static [Self] = &[
        Self::Maintenance,
        Self::WebSystem,
        Self::WordPressSite,
        Self::LandingPage,
        Self::StaticSite,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Maintenance => "保守運用",
            Self::WebSystem => "Webシステム構築",
            Self::WordPressSite => "WordPressサイト構築",
            Self::LandingPage => "LP制作",
            Self::StaticSite => "静的サイト構築",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technology {
    #[serde(rename = "Next.js")]
    NextJs,
    #[serde(rename = "TypeScript")]
    TypeScript,
    #[serde(rename = "microCMS")]
    MicroCms,
    #[serde(rename = "Vercel")]
    Vercel,
    #[serde(rename = "AWS")]
    Aws,
    #[serde(rename = "WordPress")]
    WordPress,
    #[serde(rename = "XServer")]
    XServer,
    #[serde(rename = "Kinsta")]
    Kinsta,
    #[serde(rename = "PHP")]
    Php,
    #[serde(rename = "VanillaJS")]
    VanillaJs,
    #[serde(rename = "Sass")]
    Sass,
}

impl SelectValue for Technology {
    const ALL: &'static [Self] = &[
        Self::NextJs,
        Self::TypeScript,
        Self::MicroCms,
        Self::Vercel,
        Self::Aws,
        Self::WordPress,
        Self::XServer,
        Self::Kinsta,
        Self::Php,
        Self::VanillaJs,
        Self::Sass,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::NextJs => "Next.js",
            Self::TypeScript => "TypeScript",
            Self::MicroCms => "microCMS",
            Self::Vercel => "Vercel",
            Self::Aws => "AWS",
            Self::WordPress => "WordPress",
            Self::XServer => "XServer",
            Self::Kinsta => "Kinsta",
            Self::Php => "PHP",
            Self::VanillaJs => "VanillaJS",
            Self::Sass => "Sass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanyType {
    #[serde(rename = "Web制作会社")]
    WebAgency,
    #[serde(rename = "事業会社")]
    InHouse,
    #[serde(rename = "フリーランス")]
    Freelance,
}

impl SelectValue for CompanyType {
    const ALL: &'static [Self] = &[Self::WebAgency, Self::InHouse, Self::Freelance];

    fn as_str(self) -> &'static str {
        match self {
            Self::WebAgency => "Web制作会社",
            Self::InHouse => "事業会社",
            Self::Freelance => "フリーランス",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillCategory {
    #[serde(rename = "言語")]
    Language,
    #[serde(rename = "OS")]
    OperatingSystem,
    #[serde(rename = "ツール")]
    Tool,
    #[serde(rename = "インフラ")]
    Infrastructure,
}

impl SelectValue for SkillCategory {
    const ALL: &'static [Self] = &[
        Self::Language,
        Self::OperatingSystem,
        Self::Tool,
        Self::Infrastructure,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Language => "言語",
            Self::OperatingSystem => "OS",
            Self::Tool => "ツール",
            Self::Infrastructure => "インフラ",
        }
    }
}
