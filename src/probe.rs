//! Contact-page detection.
//!
//! [`ContactProbe`] is the seam between the batch scanner and the scanning
//! capability: given a URL it classifies the site's contact situation and
//! never fails — network trouble comes back as an `error` outcome, not an
//! `Err`. [`HttpContactProbe`] is the production implementation; tests swap
//! in scripted fakes.

use std::future::Future;
use std::sync::Arc;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::models::ScanOutcome;

/// The scanning capability the batch scanner fans targets out through.
pub trait ContactProbe: Send + Sync {
    /// Classifies one URL. Must not fail for ordinary network problems;
    /// those are reported through the outcome's `error` status.
    fn scan(&self, url: &str) -> impl Future<Output = ScanOutcome> + Send;
}

// CSS selector strings
const ANCHOR_SELECTOR_STR: &str = "a[href]";
const FORM_SELECTOR_STR: &str = "form";
const TEXTAREA_SELECTOR_STR: &str = "textarea";
const INPUT_SELECTOR_STR: &str = "input";

// Hrefs and anchor texts that usually lead to a contact/submission page.
const CONTACT_LINK_PATTERN: &str =
    r"(?i)\b(contact|kontakt|impressum|support|feedback|enquir|inquir|get.?in.?touch|reach.?us)";

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(ANCHOR_SELECTOR_STR).expect("Failed to parse anchor selector - this is a bug")
});

static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(FORM_SELECTOR_STR).expect("Failed to parse form selector - this is a bug")
});

static TEXTAREA_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(TEXTAREA_SELECTOR_STR)
        .expect("Failed to parse textarea selector - this is a bug")
});

static INPUT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(INPUT_SELECTOR_STR).expect("Failed to parse input selector - this is a bug")
});

static CONTACT_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(CONTACT_LINK_PATTERN).expect("Failed to compile contact link pattern - this is a bug")
});

/// What one fetched page tells us, extracted eagerly so no parsed document
/// (`scraper::Html` is not `Send`) lives across an await point.
#[derive(Debug, Clone, Default)]
pub struct PageFacts {
    /// The page carries a form with a usable message/email/text field.
    pub has_form: bool,
    /// Hrefs of anchors that look like contact-page links, in document order.
    pub contact_links: Vec<String>,
}

/// Extracts contact-relevant facts from an HTML body.
pub fn classify_page(body: &str) -> PageFacts {
    let document = Html::parse_document(body);

    let has_form = document
        .select(&FORM_SELECTOR)
        .any(|form| form_is_submittable(&form));

    let contact_links = document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if href.starts_with("mailto:") || href.starts_with("javascript:") {
                return None;
            }
            let text = anchor.text().collect::<String>();
            if CONTACT_LINK_RE.is_match(href) || CONTACT_LINK_RE.is_match(&text) {
                Some(href.to_string())
            } else {
                None
            }
        })
        .collect();

    PageFacts {
        has_form,
        contact_links,
    }
}

/// A form is submittable if it has a textarea or a text/email input.
/// Hidden-only forms (search tokens, CSRF shells) don't count.
fn form_is_submittable(form: &scraper::ElementRef<'_>) -> bool {
    if form.select(&TEXTAREA_SELECTOR).next().is_some() {
        return true;
    }
    form.select(&INPUT_SELECTOR).any(|input| {
        matches!(
            input.value().attr("type").unwrap_or("text"),
            "text" | "email"
        )
    })
}

/// HTTP-backed probe: fetches the landing page, follows the most plausible
/// contact link, and classifies what it finds.
#[derive(Clone)]
pub struct HttpContactProbe {
    client: Arc<reqwest::Client>,
}

impl HttpContactProbe {
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self { client }
    }

    /// Fetches a page and returns its (possibly truncated) body together
    /// with the final URL after redirects.
    async fn fetch_page(&self, url: &str) -> Result<(String, Url), reqwest::Error> {
        let response = self.client.get(url).send().await?;
        let final_url = response.url().clone();
        let response = response.error_for_status()?;
        let mut bytes = response.bytes().await?;
        if bytes.len() > MAX_RESPONSE_BODY_SIZE {
            bytes = bytes.slice(..MAX_RESPONSE_BODY_SIZE);
        }
        Ok((String::from_utf8_lossy(&bytes).into_owned(), final_url))
    }
}

impl ContactProbe for HttpContactProbe {
    async fn scan(&self, url: &str) -> ScanOutcome {
        let (body, landing_url) = match self.fetch_page(url).await {
            Ok(page) => page,
            Err(e) => return ScanOutcome::error(format!("failed to fetch {url}: {e}")),
        };

        let landing = classify_page(&body);

        // Resolve the first contact-looking link against the post-redirect URL.
        let candidate = landing
            .contact_links
            .iter()
            .find_map(|href| landing_url.join(href).ok());

        if let Some(contact_url) = candidate {
            match self.fetch_page(contact_url.as_str()).await {
                Ok((contact_body, final_contact_url)) => {
                    if classify_page(&contact_body).has_form {
                        return ScanOutcome::found(
                            final_contact_url.to_string(),
                            "contact page with form",
                        );
                    }
                    if landing.has_form {
                        return ScanOutcome::found(
                            landing_url.to_string(),
                            "form on landing page; linked contact page has none",
                        );
                    }
                    return ScanOutcome::no_form(format!(
                        "contact page {final_contact_url} has no submittable form"
                    ));
                }
                Err(e) => {
                    if landing.has_form {
                        return ScanOutcome::found(
                            landing_url.to_string(),
                            "form on landing page; contact link unreachable",
                        );
                    }
                    return ScanOutcome::error(format!(
                        "failed to fetch contact page {contact_url}: {e}"
                    ));
                }
            }
        }

        if landing.has_form {
            return ScanOutcome::found(landing_url.to_string(), "form on landing page");
        }

        ScanOutcome::not_found("no contact link or form found")
    }
}
