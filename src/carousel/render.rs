//! Carousel and hero banner markup.

use super::state::CarouselState;
use maud::{Markup, html};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One hero banner slide, as stored on the `hero_banner` content type.
///
/// Every field is optional; unknown fields are ignored so banners keep
/// rendering when editors add fields to the content type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeroBanner {
    pub banner_title: Option<String>,
    pub banner_description: Option<String>,
    pub bg_color: Option<String>,
    pub text_color: Option<String>,
    pub banner_image: Option<BannerImage>,
    pub call_to_action: Option<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BannerImage {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Link {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub href: String,
}

/// Editors clear fields to `null` rather than removing them; treat that as
/// absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl HeroBanner {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        HeroBanner::deserialize(value)
    }
}

/// A carousel block on a page: a heading plus the resolved banner entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CarouselBlock {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub carousel: Vec<HeroBanner>,
}

impl CarouselBlock {
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        CarouselBlock::deserialize(value)
    }
}

fn style(property: &str, value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| format!("{property}: {v}"))
}

/// Render a single hero banner.
pub fn render_hero_banner(banner: &HeroBanner) -> Markup {
    let cta = banner
        .call_to_action
        .as_ref()
        .filter(|link| !link.title.is_empty() && !link.href.is_empty());
    html! {
        div.hero-banner style=[style("background", banner.bg_color.as_deref())] {
            div.home-content style=[style("color", banner.text_color.as_deref())] {
                @if let Some(title) = &banner.banner_title {
                    h1.hero-title { (title) }
                }
                @if let Some(description) = &banner.banner_description {
                    p.hero-description { (description) }
                }
                @if let Some(link) = cta {
                    a.btn.tertiary-btn href=(link.href) { (link.title) }
                }
            }
            @if let Some(image) = &banner.banner_image {
                img.banner-image alt=(image.filename) src=(image.url);
            }
        }
    }
}

/// Render the carousel at its current position.
///
/// The track is translated by `-index × 100%`; one dot is rendered per
/// banner with the current one marked active. Navigation buttons are disabled
/// when there are no banners.
pub fn render_carousel(title: &str, banners: &[HeroBanner], state: &CarouselState) -> Markup {
    let current = state.current_index();
    let empty = banners.is_empty();
    html! {
        section.hero-carousel data-autoplay=(if state.is_auto_playing() { "true" } else { "false" }) {
            h1.carousel-title { (title) }
            div.carousel-viewport {
                div.carousel-track style=(format!("transform: translateX(-{}%)", state.offset_percent())) {
                    @for (index, banner) in banners.iter().enumerate() {
                        div.carousel-slide aria-hidden=(if index == current { "false" } else { "true" }) {
                            (render_hero_banner(banner))
                        }
                    }
                }
            }
            button.carousel-prev type="button" aria-label="Previous slide" data-action="previous" disabled[empty] {
                "‹"
            }
            button.carousel-next type="button" aria-label="Next slide" data-action="next" disabled[empty] {
                "›"
            }
            div.carousel-dots {
                @for index in 0..banners.len() {
                    button.carousel-dot.active[index == current]
                        type="button"
                        aria-label=(format!("Go to slide {}", index + 1))
                        data-slide=(index) {}
                }
            }
        }
    }
}
