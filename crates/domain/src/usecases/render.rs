//! Rendering use case - transforms a catalog item into a channel announcement

use crate::markup::{excerpt, strip_markup, truncate_utf16};
use crate::model::{ActionLink, CatalogItem, Numeric, RenderedAnnouncement, non_blank};

/// Telegram's caption limit, used for both photo captions and text posts
pub const DEFAULT_CAPTION_LIMIT: usize = 1024;

/// Configuration for the renderer
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Maximum UTF-16 code units in the final announcement text
    pub caption_limit: usize,
    /// Maximum characters for a description cleaned from markup
    pub description_limit: usize,
    /// Prefix for numeric prices
    pub currency_symbol: String,
    /// Banner line at the top; omitted when empty
    pub header: String,
    /// Line shown above the link; omitted when empty
    pub call_to_action: String,
    /// Label of the inline enrollment button
    pub button_text: String,
    /// Marker shown for free deals
    pub free_label: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            caption_limit: DEFAULT_CAPTION_LIMIT,
            description_limit: 200,
            currency_symbol: "$".to_string(),
            header: "🎓 New Course Deal".to_string(),
            call_to_action: "👉 Enroll before the coupon expires!".to_string(),
            button_text: "Enroll Now".to_string(),
            free_label: "FREE".to_string(),
        }
    }
}

/// Renderer for catalog announcements
#[derive(Debug, Clone)]
pub struct Renderer {
    config: RenderConfig,
}

impl Renderer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Render an item. Never fails: missing or malformed fields drop their line.
    pub fn render(&self, item: &CatalogItem) -> RenderedAnnouncement {
        let lines = [
            non_blank(Some(self.config.header.as_str())).map(String::from),
            Some(self.format_title(item)),
            self.format_description(item),
            non_blank(item.instructor.as_deref()).map(|i| format!("👤 Instructor: {}", i)),
            non_blank(item.language.as_deref()).map(|l| format!("🌐 Language: {}", l)),
            self.format_category(item),
            non_blank(item.platform.as_deref()).map(|p| format!("🛒 Platform: {}", p)),
            self.format_engagement(item),
            Some(format!("💰 {}", self.format_price_line(item))),
            non_blank(Some(self.config.call_to_action.as_str())).map(String::from),
            non_blank(item.url.as_deref()).map(|u| format!("🔗 {}", u)),
        ];

        let text = lines.into_iter().flatten().collect::<Vec<_>>().join("\n");

        RenderedAnnouncement {
            text: truncate_utf16(&text, self.config.caption_limit),
            media: non_blank(item.image.as_deref()).map(String::from),
            action: non_blank(item.url.as_deref()).map(|url| ActionLink {
                label: self.config.button_text.clone(),
                url: url.to_string(),
            }),
        }
    }

    fn format_title(&self, item: &CatalogItem) -> String {
        let title = non_blank(item.title.as_deref()).unwrap_or("Untitled course");
        format!("📚 {}", title)
    }

    /// Short description if present, otherwise a cleaned excerpt of the long one
    fn format_description(&self, item: &CatalogItem) -> Option<String> {
        if let Some(short) = non_blank(item.short_description.as_deref()) {
            return Some(short.to_string());
        }

        let long = non_blank(item.description.as_deref())
            .or_else(|| non_blank(item.content.as_deref()))?;
        let plain = strip_markup(long);
        if plain.is_empty() {
            return None;
        }
        Some(excerpt(&plain, self.config.description_limit))
    }

    /// Category as a hashtag, joined with the subcategory when present
    fn format_category(&self, item: &CatalogItem) -> Option<String> {
        let tags: Vec<String> = [item.category.as_deref(), item.subcategory.as_deref()]
            .into_iter()
            .filter_map(non_blank)
            .map(hashtag)
            .filter(|t| t.len() > 1)
            .collect();

        if tags.is_empty() {
            return None;
        }
        Some(format!("🏷 {}", tags.join(" | ")))
    }

    fn format_engagement(&self, item: &CatalogItem) -> Option<String> {
        let mut parts = Vec::new();

        if let Some(lectures) = item.lectures.as_ref().and_then(format_count) {
            parts.push(format!("📖 {} lectures", lectures));
        }
        if let Some(views) = item.views.as_ref().and_then(format_count) {
            parts.push(format!("👀 {} views", views));
        }
        if let Some(rating) = item.rating.as_ref().and_then(Numeric::as_f64) {
            if rating > 0.0 {
                parts.push(format!("⭐ {:.1}", rating));
            }
        }

        if parts.is_empty() {
            return None;
        }
        Some(parts.join(" | "))
    }

    /// Price line: struck original and free marker for free deals,
    /// "original → discounted" for discounts, plain price otherwise.
    fn format_price_line(&self, item: &CatalogItem) -> String {
        let free = self.config.free_label.clone();
        let original = item.price.as_ref().map(|p| self.format_price(p));

        match (&item.sale_price, original) {
            (Some(sale), original) if sale.is_zero() => match original {
                Some(original) => format!("{} → {}", strikethrough(&original), free),
                None => free,
            },
            (Some(sale), Some(original)) => {
                let discounted = self.format_price(sale);
                if discounted != original {
                    format!("{} → {}", strikethrough(&original), discounted)
                } else {
                    original
                }
            }
            (None, Some(original)) => original,
            (Some(sale), None) => self.format_price(sale),
            (None, None) => free,
        }
    }

    /// Two-decimal currency string for numbers, literal text otherwise
    pub fn format_price(&self, price: &Numeric) -> String {
        match price.as_f64() {
            Some(value) => format!("{}{:.2}", self.config.currency_symbol, value),
            None => price.literal(),
        }
    }
}

/// Render text with a combining long stroke over every character
pub fn strikethrough(text: &str) -> String {
    text.chars().flat_map(|c| [c, '\u{0336}']).collect()
}

fn hashtag(value: &str) -> String {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    format!("#{}", compact.trim_start_matches('#'))
}

fn format_count(value: &Numeric) -> Option<String> {
    match value.as_f64() {
        Some(n) if n < 0.0 => None,
        Some(n) if n.fract() == 0.0 => Some(format!("{:.0}", n)),
        Some(n) => Some(n.to_string()),
        None => {
            let literal = value.literal();
            (!literal.is_empty()).then_some(literal)
        }
    }
}
