//! Heuristics for learning sites: recommended speeds, a default speed and a
//! few keyboard conveniences.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    #[serde(rename = "coursera")]
    Coursera,
    #[serde(rename = "udemy")]
    Udemy,
    #[serde(rename = "khanacademy")]
    KhanAcademy,
    #[serde(rename = "apnacollege")]
    ApnaCollege,
    #[serde(rename = "youtube-edu")]
    YoutubeEdu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    AutoSkipIntro,
    ChapterNavigation,
    NoteTimestamps,
    LectureProgress,
    PracticeMode,
    ConceptReview,
    ProgressTracking,
    CodingMode,
    LectureNotes,
    PracticeProblems,
    PlaylistMode,
}

/// Selectors of the previous/next lecture controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LectureSelectors {
    pub next: &'static str,
    pub previous: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    pub name: &'static str,
    pub recommended_speeds: &'static [f64],
    pub default_speed: f64,
    pub features: &'static [Feature],
    pub skip_intro_selector: &'static str,
    pub max_recommended_speed: f64,
    #[serde(skip)]
    pub lectures: Option<LectureSelectors>,
}

impl PlatformConfig {
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    pub fn recommends(&self, speed: f64) -> bool {
        self.recommended_speeds
            .iter()
            .any(|recommended| (recommended - speed).abs() < f64::EPSILON)
    }
}

static COURSERA: PlatformConfig = PlatformConfig {
    name: "Coursera",
    recommended_speeds: &[1.25, 1.5, 1.75, 2.0],
    default_speed: 1.25,
    features: &[
        Feature::AutoSkipIntro,
        Feature::ChapterNavigation,
        Feature::NoteTimestamps,
    ],
    skip_intro_selector: ".skip-intro-button, .rc-SkipButton",
    max_recommended_speed: 2.5,
    lectures: Some(LectureSelectors {
        next: ".rc-NavigationControls button[data-track-component=\"next_item_button\"]",
        previous: ".rc-NavigationControls button[data-track-component=\"previous_item_button\"]",
    }),
};

static UDEMY: PlatformConfig = PlatformConfig {
    name: "Udemy",
    recommended_speeds: &[1.25, 1.5, 1.75, 2.0, 2.25],
    default_speed: 1.5,
    features: &[
        Feature::AutoSkipIntro,
        Feature::LectureProgress,
        Feature::NoteTimestamps,
    ],
    skip_intro_selector: ".skip-button, .udemy-btn",
    max_recommended_speed: 3.0,
    lectures: Some(LectureSelectors {
        next: ".next-btn, .curriculum-item-link--next",
        previous: ".prev-btn, .curriculum-item-link--previous",
    }),
};

static KHAN_ACADEMY: PlatformConfig = PlatformConfig {
    name: "Khan Academy",
    recommended_speeds: &[1.0, 1.25, 1.5, 1.75],
    default_speed: 1.25,
    features: &[
        Feature::PracticeMode,
        Feature::ConceptReview,
        Feature::ProgressTracking,
    ],
    skip_intro_selector: ".skip-intro",
    max_recommended_speed: 2.0,
    lectures: Some(LectureSelectors {
        next: ".next-button, [data-test-id=\"next-button\"]",
        previous: ".previous-button, [data-test-id=\"previous-button\"]",
    }),
};

static APNA_COLLEGE: PlatformConfig = PlatformConfig {
    name: "Apna College",
    recommended_speeds: &[1.25, 1.5, 1.75, 2.0, 2.25, 2.5],
    default_speed: 1.5,
    features: &[
        Feature::CodingMode,
        Feature::LectureNotes,
        Feature::PracticeProblems,
    ],
    skip_intro_selector: ".skip-intro, .skip-button",
    max_recommended_speed: 3.0,
    lectures: Some(LectureSelectors {
        next: ".next-lecture, .next-video",
        previous: ".prev-lecture, .prev-video",
    }),
};

static YOUTUBE_EDU: PlatformConfig = PlatformConfig {
    name: "YouTube Education",
    recommended_speeds: &[1.25, 1.5, 1.75, 2.0],
    default_speed: 1.25,
    features: &[Feature::PlaylistMode, Feature::ChapterNavigation],
    skip_intro_selector: ".ytp-skip-ad-button",
    max_recommended_speed: 2.5,
    lectures: None,
};

impl Platform {
    /// Detects a learning platform from the page hostname and full URL.
    pub fn detect(hostname: &str, url: &str) -> Option<Self> {
        let hostname = hostname.to_lowercase();
        let url = url.to_lowercase();

        if hostname.contains("coursera.org") {
            Some(Platform::Coursera)
        } else if hostname.contains("udemy.com") {
            Some(Platform::Udemy)
        } else if hostname.contains("khanacademy.org") {
            Some(Platform::KhanAcademy)
        } else if hostname.contains("apnacollege.in") || hostname.contains("apnacollege.com") {
            Some(Platform::ApnaCollege)
        } else if hostname.contains("youtube.com")
            && (url.contains("playlist") || url.contains("educational"))
        {
            Some(Platform::YoutubeEdu)
        } else {
            None
        }
    }

    pub fn config(self) -> &'static PlatformConfig {
        match self {
            Platform::Coursera => &COURSERA,
            Platform::Udemy => &UDEMY,
            Platform::KhanAcademy => &KHAN_ACADEMY,
            Platform::ApnaCollege => &APNA_COLLEGE,
            Platform::YoutubeEdu => &YOUTUBE_EDU,
        }
    }
}

/// Formats a playback position as `m:ss`.
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}
