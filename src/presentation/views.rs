use crate::application::error::{ErrorReport, HttpError};
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

pub fn render_not_found_response(chrome: LayoutChrome) -> Response {
    let content = ErrorPageView::not_found();
    let view = LayoutContext::new(chrome.with_title("Not Found"), content);
    let mut response = render_template_response(ErrorTemplate { view }, StatusCode::NOT_FOUND);
    ErrorReport::from_message(
        "presentation::views::render_not_found_response",
        StatusCode::NOT_FOUND,
        "Resource not found",
    )
    .attach(&mut response);
    response
}

#[derive(Clone)]
pub struct NavigationLinkView {
    pub label: String,
    pub href: String,
}

#[derive(Clone)]
pub struct BrandView {
    pub title: String,
    pub href: String,
}

#[derive(Clone)]
pub struct FooterView {
    pub copy: String,
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: String,
    pub site_name: String,
    pub lang: String,
    pub favicon: Option<String>,
}

/// Header, navigation, footer and `<head>` data shared by every page.
#[derive(Clone)]
pub struct LayoutChrome {
    pub brand: BrandView,
    pub navigation: Vec<NavigationLinkView>,
    pub footer: FooterView,
    pub meta: PageMetaView,
}

impl LayoutChrome {
    /// Apply the `"%s | Portfolio"` title template.
    pub fn with_title(self, page_title: &str) -> Self {
        let title = format!("{page_title} | {}", self.meta.site_name);
        Self {
            meta: PageMetaView { title, ..self.meta },
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            meta: PageMetaView {
                description: description.into(),
                ..self.meta
            },
            ..self
        }
    }
}

#[derive(Clone)]
pub struct LayoutContext<T> {
    pub brand: BrandView,
    pub navigation: Vec<NavigationLinkView>,
    pub footer: FooterView,
    pub meta: PageMetaView,
    pub content: T,
}

impl<T> LayoutContext<T> {
    pub fn new(chrome: LayoutChrome, content: T) -> Self {
        Self {
            brand: chrome.brand,
            navigation: chrome.navigation,
            footer: chrome.footer,
            meta: chrome.meta,
            content,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeroView {
    pub display_name: String,
    pub name_en: Option<String>,
    pub introduction: String,
    pub profile_image: Option<ImageView>,
    pub main_visual: Option<ImageView>,
    /// Sanitised HTML.
    pub detail_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkCard {
    pub id: String,
    pub title: String,
    pub url: String,
    pub introduction_url: String,
    pub eyecatch: ImageView,
    pub category: &'static str,
    pub duration: String,
    pub technologies: Vec<&'static str>,
    pub details_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExperienceCard {
    pub id: String,
    pub company_name: String,
    pub company_logo: ImageView,
    pub job_title: String,
    pub work_experiences: Vec<String>,
    pub duration: String,
    pub url: String,
    pub company_type: &'static str,
    pub details_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillCard {
    pub id: String,
    pub name: String,
    pub icon: ImageView,
    pub years_of_experience: String,
    pub details_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillGroup {
    pub label: &'static str,
    pub skills: Vec<SkillCard>,
}

pub struct HomeView {
    pub hero: HeroView,
    pub works: Vec<WorkCard>,
    pub experiences: Vec<ExperienceCard>,
    pub skill_groups: Vec<SkillGroup>,
}

pub struct AboutView {
    pub title: String,
    pub content_html: String,
    pub main_visual: Option<ImageView>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub view: LayoutContext<HomeView>,
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    pub view: LayoutContext<AboutView>,
}

pub struct ErrorPageView {
    pub title: String,
    pub message: String,
    pub primary_action: Option<ErrorAction>,
}

impl ErrorPageView {
    pub fn not_found() -> Self {
        Self {
            title: "Page Not Found".to_string(),
            message: "The page you requested does not exist.".to_string(),
            primary_action: Some(ErrorAction::home()),
        }
    }
}

pub struct ErrorAction {
    pub href: String,
    pub label: String,
}

impl ErrorAction {
    pub fn home() -> Self {
        Self {
            href: "/".to_string(),
            label: "Back to home".to_string(),
        }
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub view: LayoutContext<ErrorPageView>,
}
