//! Server-rendered counter page.
//!
//! The doubled value is computed by the Datastar runtime in the browser; the
//! server only seeds the `count` signal.

use askama::Template;
use serde::Deserialize;

use crate::core::config::Configurable;
use crate::core::error::Result;

pub const DATASTAR_CDN: &str =
    "https://cdn.jsdelivr.net/gh/starfederation/datastar@1.0.0-beta.11/bundles/datastar.js";

/// `[view]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub title: String,
    /// URL of the Datastar module bundle
    pub datastar_src: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            title: "Count".to_string(),
            datastar_src: DATASTAR_CDN.to_string(),
        }
    }
}

impl Configurable for ViewConfig {
    const PREFIX: &'static str = "view";
}

#[derive(Template)]
#[template(path = "count.html")]
struct CountPage<'a> {
    title: &'a str,
    datastar_src: &'a str,
    count: i64,
}

/// Render the page; an absent count starts the client at zero.
pub fn render(count: Option<i64>, config: &ViewConfig) -> Result<String> {
    let page = CountPage {
        title: &config.title,
        datastar_src: &config.datastar_src,
        count: count.unwrap_or(0),
    };
    Ok(page.render()?)
}
