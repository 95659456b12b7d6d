use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of content types used by single-label classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentType {
    Article,
    BlogPost,
    ProductLaunch,
    PressRelease,
    Tutorial,
    LandingPage,
    CaseStudy,
    Faq,
}

impl ContentType {
    /// Every content type, in the order they are offered to the model.
    pub const ALL: [ContentType; 8] = [
        Self::Article,
        Self::BlogPost,
        Self::ProductLaunch,
        Self::PressRelease,
        Self::Tutorial,
        Self::LandingPage,
        Self::CaseStudy,
        Self::Faq,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::BlogPost => "blog-post",
            Self::ProductLaunch => "product-launch",
            Self::PressRelease => "press-release",
            Self::Tutorial => "tutorial",
            Self::LandingPage => "landing-page",
            Self::CaseStudy => "case-study",
            Self::Faq => "faq",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known content types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.as_str() == s)
            .ok_or_else(|| UnknownContentType(s.to_string()))
    }
}
