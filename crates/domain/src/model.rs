//! Domain models and value objects

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

/// A loosely typed numeric field from the catalog (price, rating, counts).
///
/// The crawler copies whatever the deals API returns, so the same field may
/// arrive as `49.99`, `"49.99"` or `"N/A"`. Numbers are kept as numbers and
/// anything else is kept as its literal text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    /// Numeric value, parsing textual numbers. Non-finite values yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Literal textual form, as found in the catalog
    pub fn literal(&self) -> String {
        match self {
            Numeric::Number(n) => n.to_string(),
            Numeric::Text(s) => s.trim().to_string(),
        }
    }

    /// True only for a value that parses to exactly zero
    pub fn is_zero(&self) -> bool {
        self.as_f64() == Some(0.0)
    }
}

/// One discovered deal, as materialized by the catalog crawler.
///
/// Every field is optional: the dispatcher never rejects an item for missing
/// or oddly typed data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,

    /// Course title (`name` in the crawler output)
    #[serde(
        default,
        rename = "name",
        alias = "title",
        deserialize_with = "lenient_text"
    )]
    pub title: Option<String>,

    /// Long-form description, may contain HTML
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,

    /// Alternative long-form body some sources use instead of `description`
    #[serde(default, deserialize_with = "lenient_text")]
    pub content: Option<String>,

    /// Plain short description; the crawler writes it as `shoer_description`
    #[serde(
        default,
        alias = "shoer_description",
        deserialize_with = "lenient_text"
    )]
    pub short_description: Option<String>,

    #[serde(default, deserialize_with = "lenient_numeric")]
    pub price: Option<Numeric>,

    /// Discounted price; zero means the coupon makes the course free
    #[serde(default, deserialize_with = "lenient_numeric")]
    pub sale_price: Option<Numeric>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub sale_start: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub sale_end: Option<String>,

    #[serde(default, deserialize_with = "lenient_numeric")]
    pub lectures: Option<Numeric>,

    #[serde(default, deserialize_with = "lenient_numeric")]
    pub views: Option<Numeric>,

    #[serde(default, deserialize_with = "lenient_numeric")]
    pub rating: Option<Numeric>,

    /// Image URL used as the announcement photo
    #[serde(default, deserialize_with = "lenient_text")]
    pub image: Option<String>,

    /// Canonical enrollment URL (coupon applied)
    #[serde(default, deserialize_with = "lenient_text")]
    pub url: Option<String>,

    /// Source platform, e.g. "Udemy"
    #[serde(
        default,
        rename = "store",
        alias = "platform",
        deserialize_with = "lenient_text"
    )]
    pub platform: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub subcategory: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub language: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub instructor: Option<String>,

    #[serde(default, rename = "type", deserialize_with = "lenient_text")]
    pub item_type: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub slug: Option<String>,
}

impl CatalogItem {
    /// Stable identity used by the head-watch cursor: action URL, then id, then slug
    pub fn identity(&self) -> Option<&str> {
        [&self.url, &self.id, &self.slug]
            .into_iter()
            .filter_map(|field| non_blank(field.as_deref()))
            .next()
    }

    /// Short label for logs
    pub fn label(&self) -> &str {
        non_blank(self.title.as_deref())
            .or_else(|| self.identity())
            .unwrap_or("<untitled>")
    }
}

/// Returns the trimmed value if it is not empty
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_numeric<'de, D>(deserializer: D) -> Result<Option<Numeric>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => match n.as_f64() {
            Some(f) => Some(Numeric::Number(f)),
            None => Some(Numeric::Text(n.to_string())),
        },
        Some(Value::String(s)) if s.trim().is_empty() => None,
        Some(Value::String(s)) => Some(Numeric::Text(s)),
        Some(other) => Some(Numeric::Text(other.to_string())),
    })
}

/// How dispatch progress is identified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorScheme {
    /// Count of items already announced; walks the whole backlog in order
    #[default]
    Position,
    /// Identity of the last announced item; only ever looks at the catalog head
    HeadWatch,
}

impl CursorScheme {
    /// The "nothing posted yet" cursor for this scheme
    pub fn zero(self) -> Cursor {
        match self {
            CursorScheme::Position => Cursor::Position(0),
            CursorScheme::HeadWatch => Cursor::LastSent(None),
        }
    }

    /// Parse a persisted cursor record. `None` means the record is corrupt.
    pub fn parse(self, raw: &str) -> Option<Cursor> {
        let raw = raw.trim();
        match self {
            CursorScheme::Position => raw.parse::<usize>().ok().map(Cursor::Position),
            CursorScheme::HeadWatch if raw.is_empty() => Some(Cursor::LastSent(None)),
            CursorScheme::HeadWatch if raw.contains(['\n', '\r']) => None,
            CursorScheme::HeadWatch => Some(Cursor::LastSent(Some(raw.to_string()))),
        }
    }
}

/// Persisted dispatch progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", content = "value", rename_all = "snake_case")]
pub enum Cursor {
    /// Number of catalog items already announced
    Position(usize),
    /// Identity of the last announced item, if any
    LastSent(Option<String>),
}

impl Cursor {
    pub fn scheme(&self) -> CursorScheme {
        match self {
            Cursor::Position(_) => CursorScheme::Position,
            Cursor::LastSent(_) => CursorScheme::HeadWatch,
        }
    }

    /// Scalar written to the cursor record
    pub fn to_record(&self) -> String {
        match self {
            Cursor::Position(n) => n.to_string(),
            Cursor::LastSent(id) => id.clone().unwrap_or_default(),
        }
    }

    /// True if moving from `previous` to `self` would move the cursor backwards
    pub fn regresses_from(&self, previous: &Cursor) -> bool {
        match (previous, self) {
            (Cursor::Position(before), Cursor::Position(after)) => after < before,
            (Cursor::LastSent(Some(_)), Cursor::LastSent(None)) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cursor::Position(n) => write!(f, "{}", n),
            Cursor::LastSent(Some(id)) => write!(f, "{}", id),
            Cursor::LastSent(None) => write!(f, "<none>"),
        }
    }
}

/// Inline call-to-action attached to an announcement
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionLink {
    pub label: String,
    pub url: String,
}

/// Rendered content ready for delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedAnnouncement {
    /// Caption or message text, already within the provider limit
    pub text: String,
    /// Photo to attach, if the item has one
    pub media: Option<String>,
    /// Enrollment link for an inline button
    pub action: Option<ActionLink>,
}

/// Which delivery operation carried an announcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryVariant {
    Media,
    Text,
}

/// Confirmation returned by a delivery port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReceipt {
    /// Provider message id
    pub message_id: String,
    /// Link to the delivered message, when the provider exposes one
    pub url: Option<String>,
}

/// Stage at which a cycle stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleStage {
    Start,
    Select,
    Deliver,
    Advance,
}

/// Why a cycle finished without delivering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// No destination channel configured
    NoDestination,
    /// The catalog has no items
    EmptyCatalog,
    /// Every catalog item is already covered by the cursor
    CaughtUp { cursor: String },
    /// Head-watch: the head item has no identity to compare against
    UnidentifiedHead,
    /// Dry run: the item was rendered but not delivered
    DryRun { position: usize, text: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoDestination => write!(f, "destination not set"),
            SkipReason::EmptyCatalog => write!(f, "catalog is empty"),
            SkipReason::CaughtUp { cursor } => write!(f, "no new items (cursor {})", cursor),
            SkipReason::UnidentifiedHead => write!(f, "catalog head has no identity"),
            SkipReason::DryRun { position, .. } => {
                write!(f, "dry run, item {} not delivered", position)
            }
        }
    }
}

/// Result of one dispatch cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CycleOutcome {
    /// The item was delivered and the cursor advanced
    Sent {
        position: usize,
        item_id: Option<String>,
        title: String,
        variant: DeliveryVariant,
        receipt: DeliveryReceipt,
        cursor: String,
    },
    /// Nothing was delivered and nothing went wrong
    Skipped {
        #[serde(flatten)]
        reason: SkipReason,
    },
    /// A stage failed; the cursor was not advanced
    Failed { stage: CycleStage, error: String },
}

/// Report for one dispatch cycle
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    pub destination: Option<String>,
    pub outcome: CycleOutcome,
}
