//! Page composition for `/` and `/about`.

use std::sync::Arc;

use ammonia::Builder as AmmoniaBuilder;
use time::OffsetDateTime;
use tracing::warn;

use crate::application::content::{ContentSource, FetchOutcome};
use crate::application::sanitize::{build_rich_text_sanitizer, sanitize_fragment};
use crate::domain::entities::{
    AboutContent, ExperienceItem, MediaAsset, SiteSettings, SkillItem, WorkItem,
};
use crate::domain::types::{SelectValue, SkillCategory};
use crate::presentation::views::{
    AboutView, BrandView, ExperienceCard, FooterView, HeroView, HomeView, ImageView, LayoutChrome,
    NavigationLinkView, PageMetaView, SkillCard, SkillGroup, WorkCard,
};

pub const DEFAULT_DISPLAY_NAME: &str = "Portfolio Owner";
pub const DEFAULT_INTRODUCTION: &str =
    "ポートフォリオサイトへようこそ。このサイトでは、私の実績・職歴・スキルをご紹介しています。";
pub const DEFAULT_SITE_TITLE: &str = "Portfolio";
pub const DEFAULT_ABOUT_TITLE: &str = "About";

const HOME_TITLE: &str = "Portfolio | Web Developer";
const SITE_DESCRIPTION: &str =
    "Web開発者のポートフォリオサイト。実績、経歴、スキルを紹介しています。";
const ABOUT_DESCRIPTION: &str = "プライベート紹介ページ";
const MAIN_VISUAL_ALT: &str = "メインビジュアル";
const SITE_LANG: &str = "ja";

/// A composed page: shared chrome plus page content.
pub struct SitePage<T> {
    pub chrome: LayoutChrome,
    pub content: T,
    /// At least one CMS read fell back to its empty value.
    pub degraded: bool,
}

#[derive(Clone)]
pub struct SiteService {
    content: Arc<dyn ContentSource>,
    sanitizer: Arc<AmmoniaBuilder<'static>>,
}

impl SiteService {
    pub fn new(content: Arc<dyn ContentSource>) -> Self {
        Self {
            content,
            sanitizer: Arc::new(build_rich_text_sanitizer()),
        }
    }

    /// Top page. The four reads run concurrently and never fail.
    pub async fn home(&self) -> SitePage<HomeView> {
        let (works, career, skills, settings) = tokio::join!(
            self.content.works(),
            self.content.career(),
            self.content.skills(),
            self.content.settings(),
        );

        let degraded = works.is_degraded()
            || career.is_degraded()
            || skills.is_degraded()
            || settings.is_degraded();
        if degraded {
            warn!(
                target = "folio::site",
                page = "/",
                "rendering home page with fallback content"
            );
        }

        let settings = settings.into_value();
        let chrome = layout_chrome(settings.as_ref());
        let view = HomeView {
            hero: self.hero(settings.as_ref()),
            works: works
                .into_value()
                .into_iter()
                .map(|work| self.work_card(work))
                .collect(),
            experiences: career
                .into_value()
                .into_iter()
                .map(|item| self.experience_card(item))
                .collect(),
            skill_groups: self.skill_groups(skills.into_value()),
        };

        SitePage {
            chrome,
            content: view,
            degraded,
        }
    }

    /// About page; `None` when the singleton is absent or has no content.
    pub async fn about(&self) -> SitePage<Option<AboutView>> {
        let (about, settings) = tokio::join!(self.content.about(), self.content.settings());
        let degraded = about.is_degraded() || settings.is_degraded();
        let chrome = layout_chrome(settings.into_value().as_ref())
            .with_title(DEFAULT_ABOUT_TITLE)
            .with_description(ABOUT_DESCRIPTION);

        SitePage {
            chrome,
            content: self.about_view(about),
            degraded,
        }
    }

    /// Chrome for pages without CMS content of their own.
    pub async fn chrome(&self) -> LayoutChrome {
        layout_chrome(self.content.settings().await.into_value().as_ref())
    }

    fn about_view(&self, about: FetchOutcome<Option<AboutContent>>) -> Option<AboutView> {
        let about = about.into_value()?;
        let content = about.content.as_deref().filter(|c| !c.trim().is_empty())?;
        let content_html = sanitize_fragment(&self.sanitizer, content)?;

        Some(AboutView {
            title: about
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ABOUT_TITLE.to_string()),
            content_html,
            main_visual: about
                .mv_image
                .as_ref()
                .map(|image| image_view(image, MAIN_VISUAL_ALT)),
        })
    }

    fn hero(&self, settings: Option<&SiteSettings>) -> HeroView {
        let display_name = settings
            .and_then(|s| non_blank(s.name.as_deref()))
            .unwrap_or(DEFAULT_DISPLAY_NAME)
            .to_string();
        let introduction = settings
            .and_then(|s| non_blank(s.introduction_message.as_deref()))
            .unwrap_or(DEFAULT_INTRODUCTION)
            .to_string();

        HeroView {
            profile_image: settings
                .and_then(|s| s.profile_image.as_ref())
                .map(|image| image_view(image, &display_name)),
            main_visual: settings
                .and_then(|s| s.mv_image.as_ref())
                .map(|image| image_view(image, MAIN_VISUAL_ALT)),
            name_en: settings
                .and_then(|s| non_blank(s.name_en.as_deref()))
                .map(str::to_string),
            detail_html: settings
                .and_then(|s| s.detail_message.as_deref())
                .and_then(|html| self.rich_text(html)),
            display_name,
            introduction,
        }
    }

    fn work_card(&self, work: WorkItem) -> WorkCard {
        WorkCard {
            eyecatch: image_view(&work.eyecatch, &work.title),
            category: work.category.as_str(),
            technologies: work.technologies.iter().map(|t| t.as_str()).collect(),
            details_html: self.rich_text(&work.details),
            id: work.id,
            title: work.title,
            url: work.url,
            introduction_url: work.introduction_url,
            duration: work.duration,
        }
    }

    fn experience_card(&self, item: ExperienceItem) -> ExperienceCard {
        ExperienceCard {
            company_logo: image_view(&item.company_logo, &item.company_name),
            company_type: item.company_type.as_str(),
            details_html: self.rich_text(&item.details),
            id: item.id,
            company_name: item.company_name,
            job_title: item.job_title,
            work_experiences: item.work_experiences,
            duration: item.duration,
            url: item.url,
        }
    }

    /// Skills grouped by category in the fixed category order; empty groups
    /// are omitted.
    fn skill_groups(&self, skills: Vec<SkillItem>) -> Vec<SkillGroup> {
        let mut groups: Vec<SkillGroup> = SkillCategory::ALL
            .iter()
            .map(|category| SkillGroup {
                label: category.as_str(),
                skills: Vec::new(),
            })
            .collect();

        for skill in skills {
            let Some(index) = SkillCategory::ALL.iter().position(|c| *c == skill.category) else {
                continue;
            };
            let card = SkillCard {
                icon: image_view(&skill.icon, &skill.name),
                details_html: self.rich_text(&skill.details),
                id: skill.id,
                name: skill.name,
                years_of_experience: skill.years_of_experience,
            };
            groups[index].skills.push(card);
        }

        groups.retain(|group| !group.skills.is_empty());
        groups
    }

    fn rich_text(&self, html: &str) -> Option<String> {
        sanitize_fragment(&self.sanitizer, html)
    }
}

/// Site title: `"{nameEn}'s Portfolio"` or the default.
pub fn site_title(settings: Option<&SiteSettings>) -> String {
    match settings.and_then(|s| non_blank(s.name_en.as_deref())) {
        Some(name_en) => format!("{name_en}'s Portfolio"),
        None => DEFAULT_SITE_TITLE.to_string(),
    }
}

fn layout_chrome(settings: Option<&SiteSettings>) -> LayoutChrome {
    let title = site_title(settings);
    let year = OffsetDateTime::now_utc().year();

    LayoutChrome {
        brand: BrandView {
            title: title.clone(),
            href: "/".to_string(),
        },
        navigation: vec![
            NavigationLinkView {
                label: "TOP".to_string(),
                href: "/".to_string(),
            },
            NavigationLinkView {
                label: "About".to_string(),
                href: "/about".to_string(),
            },
        ],
        footer: FooterView {
            copy: format!("© {year} {title}. All rights reserved."),
        },
        meta: PageMetaView {
            title: HOME_TITLE.to_string(),
            description: SITE_DESCRIPTION.to_string(),
            site_name: DEFAULT_SITE_TITLE.to_string(),
            lang: SITE_LANG.to_string(),
            favicon: settings
                .and_then(|s| s.favicon.as_ref())
                .map(|favicon| favicon.url.clone()),
        },
    }
}

fn image_view(asset: &MediaAsset, alt: &str) -> ImageView {
    ImageView {
        url: asset.url.clone(),
        width: asset.width,
        height: asset.height,
        alt: alt.to_string(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::application::content::{CmsError, endpoints};
    use crate::domain::types::{CompanyType, Technology, WorkCategory};

    #[derive(Default)]
    struct FakeContent {
        works: Vec<WorkItem>,
        career: Vec<ExperienceItem>,
        skills: Vec<SkillItem>,
        settings: Option<SiteSettings>,
        about: Option<AboutContent>,
        fail_works: bool,
    }

    #[async_trait]
    impl ContentSource for FakeContent {
        async fn works(&self) -> FetchOutcome<Vec<WorkItem>> {
            if self.fail_works {
                return FetchOutcome::degraded(CmsError::Status {
                    endpoint: endpoints::WORKS.to_string(),
                    status: 500,
                });
            }
            FetchOutcome::Loaded(self.works.clone())
        }

        async fn career(&self) -> FetchOutcome<Vec<ExperienceItem>> {
            FetchOutcome::Loaded(self.career.clone())
        }

        async fn skills(&self) -> FetchOutcome<Vec<SkillItem>> {
            FetchOutcome::Loaded(self.skills.clone())
        }

        async fn settings(&self) -> FetchOutcome<Option<SiteSettings>> {
            FetchOutcome::Loaded(self.settings.clone())
        }

        async fn about(&self) -> FetchOutcome<Option<AboutContent>> {
            FetchOutcome::Loaded(self.about.clone())
        }
    }

    fn media(url: &str) -> MediaAsset {
        MediaAsset {
            url: url.to_string(),
            width: 640,
            height: 480,
        }
    }

    fn work(id: &str) -> WorkItem {
        WorkItem {
            id: id.to_string(),
            title: "Corporate site".to_string(),
            url: "https://example.com".to_string(),
            eyecatch: media("https://images.example/eyecatch.png"),
            introduction_url: "https://example.com/intro".to_string(),
            category: WorkCategory::WordPressSite,
            duration: "3 months".to_string(),
            technologies: vec![Technology::WordPress, Technology::Php],
            details: "<p>Built it<script>x()</script></p>".to_string(),
        }
    }

    fn skill(id: &str, name: &str, category: SkillCategory) -> SkillItem {
        SkillItem {
            id: id.to_string(),
            name: name.to_string(),
            icon: media("https://images.example/icon.png"),
            category,
            years_of_experience: "3".to_string(),
            details: String::new(),
        }
    }

    fn service(content: FakeContent) -> SiteService {
        SiteService::new(Arc::new(content))
    }

    #[tokio::test]
    async fn absent_settings_use_defaults() {
        let page = service(FakeContent::default()).home().await;

        assert_eq!(page.content.hero.display_name, DEFAULT_DISPLAY_NAME);
        assert_eq!(page.content.hero.introduction, DEFAULT_INTRODUCTION);
        assert!(page.content.hero.profile_image.is_none());
        assert!(page.content.hero.detail_html.is_none());
        assert_eq!(page.chrome.brand.title, "Portfolio");
        assert_eq!(page.chrome.meta.title, "Portfolio | Web Developer");
        assert!(page.chrome.footer.copy.ends_with("Portfolio. All rights reserved."));
        assert!(!page.degraded);
    }

    #[tokio::test]
    async fn settings_drive_title_and_hero() {
        let settings = SiteSettings {
            name: Some("山田 太郎".to_string()),
            name_en: Some("Taro".to_string()),
            profile_image: Some(media("https://images.example/me.png")),
            detail_message: Some("<p onclick=\"x\">hello</p>".to_string()),
            ..SiteSettings::default()
        };
        let page = service(FakeContent {
            settings: Some(settings),
            ..FakeContent::default()
        })
        .home()
        .await;

        assert_eq!(page.chrome.brand.title, "Taro's Portfolio");
        assert_eq!(page.content.hero.display_name, "山田 太郎");
        assert_eq!(
            page.content.hero.profile_image.map(|image| image.alt),
            Some("山田 太郎".to_string())
        );
        assert_eq!(page.content.hero.detail_html.as_deref(), Some("<p>hello</p>"));
    }

    #[tokio::test]
    async fn degraded_read_renders_remaining_sections() {
        let page = service(FakeContent {
            fail_works: true,
            skills: vec![skill("s1", "Rust", SkillCategory::Language)],
            ..FakeContent::default()
        })
        .home()
        .await;

        assert!(page.degraded);
        assert!(page.content.works.is_empty());
        assert_eq!(page.content.skill_groups.len(), 1);
    }

    #[tokio::test]
    async fn work_cards_carry_labels_and_sanitised_details() {
        let page = service(FakeContent {
            works: vec![work("w1")],
            ..FakeContent::default()
        })
        .home()
        .await;

        let card = &page.content.works[0];
        assert_eq!(card.category, "WordPressサイト構築");
        assert_eq!(card.technologies, vec!["WordPress", "PHP"]);
        assert_eq!(card.details_html.as_deref(), Some("<p>Built it</p>"));
        assert_eq!(card.eyecatch.alt, "Corporate site");
    }

    #[tokio::test]
    async fn skills_are_grouped_in_category_order() {
        let page = service(FakeContent {
            skills: vec![
                skill("s1", "Docker", SkillCategory::Tool),
                skill("s2", "Rust", SkillCategory::Language),
                skill("s3", "Go", SkillCategory::Language),
            ],
            ..FakeContent::default()
        })
        .home()
        .await;

        let labels: Vec<_> = page.content.skill_groups.iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["言語", "ツール"]);
        let names: Vec<_> = page.content.skill_groups[0]
            .skills
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["Rust", "Go"]);
    }

    #[tokio::test]
    async fn experience_cards_keep_entries_in_order() {
        let item = ExperienceItem {
            id: "c1".to_string(),
            company_name: "Acme".to_string(),
            company_logo: media("https://images.example/logo.png"),
            job_title: "Engineer".to_string(),
            work_experiences: vec!["Built APIs".to_string(), "Ran ops".to_string()],
            duration: "2020-2023".to_string(),
            url: "https://acme.example".to_string(),
            company_type: CompanyType::InHouse,
            details: String::new(),
        };
        let page = service(FakeContent {
            career: vec![item],
            ..FakeContent::default()
        })
        .home()
        .await;

        let card = &page.content.experiences[0];
        assert_eq!(card.company_type, "事業会社");
        assert_eq!(card.work_experiences, vec!["Built APIs", "Ran ops"]);
        assert!(card.details_html.is_none());
    }

    #[tokio::test]
    async fn about_without_content_is_absent() {
        let page = service(FakeContent::default()).about().await;
        assert!(page.content.is_none());

        let page = service(FakeContent {
            about: Some(AboutContent {
                title: Some("Me".to_string()),
                content: Some("   ".to_string()),
                ..AboutContent::default()
            }),
            ..FakeContent::default()
        })
        .about()
        .await;
        assert!(page.content.is_none());
    }

    #[tokio::test]
    async fn about_defaults_title() {
        let page = service(FakeContent {
            about: Some(AboutContent {
                content: Some("<p>Hobbies</p>".to_string()),
                mv_image: Some(media("https://images.example/mv.png")),
                ..AboutContent::default()
            }),
            ..FakeContent::default()
        })
        .about()
        .await;

        let view = page.content.expect("about view");
        assert_eq!(view.title, "About");
        assert_eq!(view.content_html, "<p>Hobbies</p>");
        assert_eq!(
            view.main_visual.map(|image| image.alt),
            Some("メインビジュアル".to_string())
        );
        assert_eq!(page.chrome.meta.title, "About | Portfolio");
        assert_eq!(page.chrome.meta.description, "プライベート紹介ページ");
    }
}
