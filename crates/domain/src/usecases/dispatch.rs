//! Dispatch cycle use case - announces the next catalog item and advances the cursor
//!
//! One call to [`DispatchCycle::run_once`] is one invocation of the job:
//! load the cursor, pick the next item, render it, deliver it, and persist
//! the new cursor only after the delivery port confirms success. A crash
//! between delivery and the cursor write re-sends the same item on the next
//! run (at-least-once).

use std::sync::Arc;

use crate::{
    model::{
        CatalogItem, Cursor, CycleOutcome, CycleReport, CycleStage, DeliveryReceipt,
        DeliveryVariant, RenderedAnnouncement, SkipReason,
    },
    ports::{CatalogSource, Clock, CursorStore, DeliveryError, DeliveryPort},
    usecases::render::{RenderConfig, Renderer},
};

/// Configuration for a dispatch cycle
#[derive(Debug, Clone, Default)]
pub struct DispatchConfig {
    /// Channel handle or numeric chat id; `None` turns the cycle into a no-op
    pub destination: Option<String>,
    /// Render and log the next item without delivering or advancing
    pub dry_run: bool,
    /// Render config
    pub render_config: RenderConfig,
}

/// The item chosen for this cycle
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<'a> {
    /// Deliver `item`, found at `position` in the catalog
    Candidate {
        position: usize,
        item: &'a CatalogItem,
    },
    /// The catalog has no items
    Empty,
    /// The cursor already covers the catalog
    CaughtUp,
    /// Head-watch only: the head item cannot be identified
    UnidentifiedHead,
}

/// Pick the next item for `cursor`. Never indexes past the end of the catalog.
pub fn select_next<'a>(catalog: &'a [CatalogItem], cursor: &Cursor) -> Selection<'a> {
    if catalog.is_empty() {
        return Selection::Empty;
    }

    match cursor {
        Cursor::Position(position) => match catalog.get(*position) {
            Some(item) => Selection::Candidate {
                position: *position,
                item,
            },
            None => Selection::CaughtUp,
        },
        Cursor::LastSent(last) => {
            let head = &catalog[0];
            match head.identity() {
                None => Selection::UnidentifiedHead,
                Some(identity) if last.as_deref() == Some(identity) => Selection::CaughtUp,
                Some(_) => Selection::Candidate {
                    position: 0,
                    item: head,
                },
            }
        }
    }
}

/// Cursor value to persist once the item at `position` has been delivered
pub fn advance(cursor: &Cursor, position: usize, item: &CatalogItem) -> Cursor {
    match cursor {
        Cursor::Position(_) => Cursor::Position(position + 1),
        Cursor::LastSent(_) => Cursor::LastSent(item.identity().map(String::from)),
    }
}

/// How many items remain to be announced for `cursor`
pub fn pending(catalog: &[CatalogItem], cursor: &Cursor) -> usize {
    match cursor {
        Cursor::Position(position) => catalog.len().saturating_sub(*position),
        Cursor::LastSent(_) => match select_next(catalog, cursor) {
            Selection::Candidate { .. } => 1,
            _ => 0,
        },
    }
}

/// Dispatch cycle orchestrator
pub struct DispatchCycle<C, S, D, Cl>
where
    C: CatalogSource + ?Sized,
    S: CursorStore + ?Sized,
    D: DeliveryPort + ?Sized,
    Cl: Clock + ?Sized,
{
    catalog: Arc<C>,
    cursor_store: Arc<S>,
    delivery: Arc<D>,
    clock: Arc<Cl>,
    renderer: Renderer,
    config: DispatchConfig,
}

impl<C, S, D, Cl> DispatchCycle<C, S, D, Cl>
where
    C: CatalogSource + ?Sized,
    S: CursorStore + ?Sized,
    D: DeliveryPort + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        catalog: Arc<C>,
        cursor_store: Arc<S>,
        delivery: Arc<D>,
        clock: Arc<Cl>,
        config: DispatchConfig,
    ) -> Self {
        let renderer = Renderer::new(config.render_config.clone());
        Self {
            catalog,
            cursor_store,
            delivery,
            clock,
            renderer,
            config,
        }
    }

    /// Run one cycle. Every failure is folded into the returned report.
    pub async fn run_once(&self) -> CycleReport {
        let started_at = self.clock.now();
        let destination = self
            .config
            .destination
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);

        let outcome = match destination.as_deref() {
            Some(destination) => self.dispatch(destination).await,
            None => CycleOutcome::Skipped {
                reason: SkipReason::NoDestination,
            },
        };

        log_outcome(&outcome, destination.as_deref(), self.delivery.name());

        CycleReport {
            started_at,
            destination,
            outcome,
        }
    }

    async fn dispatch(&self, destination: &str) -> CycleOutcome {
        // START
        let cursor = match self.cursor_store.load_cursor().await {
            Ok(cursor) => cursor,
            Err(e) => return failed(CycleStage::Start, e),
        };

        // SELECT
        let catalog = match self.catalog.load_catalog().await {
            Ok(catalog) => catalog,
            Err(e) => return failed(CycleStage::Select, e),
        };

        tracing::debug!(
            cursor = %cursor,
            catalog_len = catalog.len(),
            "Loaded cursor and catalog"
        );

        let (position, item) = match select_next(&catalog, &cursor) {
            Selection::Candidate { position, item } => (position, item),
            Selection::Empty => {
                return CycleOutcome::Skipped {
                    reason: SkipReason::EmptyCatalog,
                };
            }
            Selection::CaughtUp => {
                return CycleOutcome::Skipped {
                    reason: SkipReason::CaughtUp {
                        cursor: cursor.to_string(),
                    },
                };
            }
            Selection::UnidentifiedHead => {
                return CycleOutcome::Skipped {
                    reason: SkipReason::UnidentifiedHead,
                };
            }
        };

        // RENDER
        let announcement = self.renderer.render(item);

        if self.config.dry_run {
            tracing::info!(
                position = position,
                title = %item.label(),
                media = ?announcement.media,
                rendered_text = %announcement.text,
                "[DRY RUN] Would announce"
            );
            return CycleOutcome::Skipped {
                reason: SkipReason::DryRun {
                    position,
                    text: announcement.text,
                },
            };
        }

        // DELIVER
        let (variant, receipt) = match self.deliver(destination, &announcement).await {
            (variant, Ok(receipt)) => (variant, receipt),
            (_, Err(e)) => return failed(CycleStage::Deliver, e),
        };

        // ADVANCE
        let next = advance(&cursor, position, item);
        if let Err(e) = self.cursor_store.save_cursor(&next).await {
            tracing::error!(
                position = position,
                message_id = %receipt.message_id,
                "Delivered but cursor not saved; the item will be sent again next run"
            );
            return failed(CycleStage::Advance, e);
        }

        CycleOutcome::Sent {
            position,
            item_id: item.id.clone(),
            title: item.label().to_string(),
            variant,
            receipt,
            cursor: next.to_string(),
        }
    }

    /// Exactly one delivery attempt, photo when the item has one
    async fn deliver(
        &self,
        destination: &str,
        announcement: &RenderedAnnouncement,
    ) -> (DeliveryVariant, Result<DeliveryReceipt, DeliveryError>) {
        let action = announcement.action.as_ref();
        match announcement.media.as_deref() {
            Some(media) => (
                DeliveryVariant::Media,
                self.delivery
                    .send_media(destination, media, &announcement.text, action)
                    .await,
            ),
            None => (
                DeliveryVariant::Text,
                self.delivery
                    .send_text(destination, &announcement.text, action)
                    .await,
            ),
        }
    }
}

fn failed(stage: CycleStage, error: impl std::fmt::Display) -> CycleOutcome {
    CycleOutcome::Failed {
        stage,
        error: error.to_string(),
    }
}

fn log_outcome(outcome: &CycleOutcome, destination: Option<&str>, adapter: &str) {
    match outcome {
        CycleOutcome::Sent {
            position,
            title,
            variant,
            receipt,
            cursor,
            ..
        } => {
            tracing::info!(
                destination = ?destination,
                adapter = adapter,
                position = position,
                title = %title,
                variant = ?variant,
                message_id = %receipt.message_id,
                cursor = %cursor,
                "Sent"
            );
        }
        CycleOutcome::Skipped { reason } => {
            tracing::info!(destination = ?destination, reason = %reason, "Skipped");
        }
        CycleOutcome::Failed { stage, error } => {
            tracing::error!(
                destination = ?destination,
                adapter = adapter,
                stage = ?stage,
                error = %error,
                "Failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionLink, CursorScheme, Numeric};
    use crate::ports::{CatalogError, StateError};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;

    // Fake implementations for testing
    struct FakeCatalog {
        items: Vec<CatalogItem>,
        broken: bool,
    }

    impl FakeCatalog {
        fn with_items(items: Vec<CatalogItem>) -> Arc<Self> {
            Arc::new(Self {
                items,
                broken: false,
            })
        }
    }

    #[async_trait]
    impl CatalogSource for FakeCatalog {
        async fn load_catalog(&self) -> Result<Vec<CatalogItem>, CatalogError> {
            if self.broken {
                return Err(CatalogError::Parse {
                    file: "coupons.json".to_string(),
                    message: "expected value".to_string(),
                });
            }
            Ok(self.items.clone())
        }
    }

    struct FakeCursorStore {
        scheme: CursorScheme,
        cursor: Mutex<Option<Cursor>>,
        saves: Mutex<Vec<Cursor>>,
        fail_save: bool,
    }

    impl FakeCursorStore {
        fn at(cursor: Cursor) -> Arc<Self> {
            Arc::new(Self {
                scheme: cursor.scheme(),
                cursor: Mutex::new(Some(cursor)),
                saves: Mutex::new(vec![]),
                fail_save: false,
            })
        }

        fn current(&self) -> Cursor {
            self.cursor
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| self.scheme.zero())
        }
    }

    #[async_trait]
    impl CursorStore for FakeCursorStore {
        fn scheme(&self) -> CursorScheme {
            self.scheme
        }

        async fn load_cursor(&self) -> Result<Cursor, StateError> {
            Ok(self.current())
        }

        async fn save_cursor(&self, cursor: &Cursor) -> Result<(), StateError> {
            if self.fail_save {
                return Err(StateError::Database("disk full".to_string()));
            }
            self.saves.lock().unwrap().push(cursor.clone());
            *self.cursor.lock().unwrap() = Some(cursor.clone());
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Media { media: String, caption: String },
        Text { text: String },
    }

    struct FakeDelivery {
        calls: Mutex<Vec<Call>>,
        fail: Mutex<bool>,
    }

    impl FakeDelivery {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(vec![]),
                fail: Mutex::new(false),
            })
        }

        fn failing() -> Arc<Self> {
            let delivery = Self::new();
            *delivery.fail.lock().unwrap() = true;
            delivery
        }

        fn set_failing(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn result(&self) -> Result<DeliveryReceipt, DeliveryError> {
            if *self.fail.lock().unwrap() {
                return Err(DeliveryError::Network("connection reset".to_string()));
            }
            Ok(DeliveryReceipt {
                message_id: format!("msg_{}", self.calls.lock().unwrap().len()),
                url: None,
            })
        }
    }

    #[async_trait]
    impl DeliveryPort for FakeDelivery {
        async fn send_media(
            &self,
            _destination: &str,
            media: &str,
            caption: &str,
            _action: Option<&ActionLink>,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.calls.lock().unwrap().push(Call::Media {
                media: media.to_string(),
                caption: caption.to_string(),
            });
            self.result()
        }

        async fn send_text(
            &self,
            _destination: &str,
            text: &str,
            _action: Option<&ActionLink>,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.calls.lock().unwrap().push(Call::Text {
                text: text.to_string(),
            });
            self.result()
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    struct FakeClock {
        time: OffsetDateTime,
    }

    impl Clock for FakeClock {
        fn now(&self) -> OffsetDateTime {
            self.time
        }
    }

    fn item(n: usize) -> CatalogItem {
        CatalogItem {
            id: Some(n.to_string()),
            title: Some(format!("Course {}", n)),
            url: Some(format!("https://example.com/course/{}", n)),
            ..Default::default()
        }
    }

    fn catalog(len: usize) -> Vec<CatalogItem> {
        (0..len).map(item).collect()
    }

    fn config() -> DispatchConfig {
        DispatchConfig {
            destination: Some("@deals".to_string()),
            ..Default::default()
        }
    }

    fn cycle<C: CatalogSource, S: CursorStore, D: DeliveryPort>(
        catalog: Arc<C>,
        store: Arc<S>,
        delivery: Arc<D>,
        config: DispatchConfig,
    ) -> DispatchCycle<C, S, D, FakeClock> {
        let clock = Arc::new(FakeClock {
            time: OffsetDateTime::UNIX_EPOCH,
        });
        DispatchCycle::new(catalog, store, delivery, clock, config)
    }

    #[test]
    fn test_select_next_by_position() {
        let items = catalog(3);
        assert!(matches!(
            select_next(&items, &Cursor::Position(1)),
            Selection::Candidate { position: 1, .. }
        ));
        assert_eq!(
            select_next(&items, &Cursor::Position(3)),
            Selection::CaughtUp
        );
        assert_eq!(
            select_next(&items, &Cursor::Position(5)),
            Selection::CaughtUp
        );
        assert_eq!(select_next(&[], &Cursor::Position(0)), Selection::Empty);
    }

    #[test]
    fn test_pending_counts() {
        let items = catalog(4);
        assert_eq!(pending(&items, &Cursor::Position(1)), 3);
        assert_eq!(pending(&items, &Cursor::Position(9)), 0);
        assert_eq!(pending(&items, &Cursor::LastSent(None)), 1);

        let head = items[0].identity().map(String::from);
        assert_eq!(pending(&items, &Cursor::LastSent(head)), 0);
    }

    #[test]
    fn test_select_next_head_watch() {
        let items = catalog(3);
        let head = items[0].identity().unwrap().to_string();

        assert!(matches!(
            select_next(&items, &Cursor::LastSent(None)),
            Selection::Candidate { position: 0, .. }
        ));
        assert_eq!(
            select_next(&items, &Cursor::LastSent(Some(head))),
            Selection::CaughtUp
        );
        assert!(matches!(
            select_next(
                &items,
                &Cursor::LastSent(Some("https://example.com/course/2".to_string()))
            ),
            Selection::Candidate { position: 0, .. }
        ));

        let anonymous = vec![CatalogItem::default()];
        assert_eq!(
            select_next(&anonymous, &Cursor::LastSent(None)),
            Selection::UnidentifiedHead
        );
    }

    #[tokio::test]
    async fn test_free_course_scenario_sends_and_advances() {
        let mut items = catalog(3);
        items[0] = CatalogItem {
            title: Some("X".to_string()),
            price: Some(Numeric::Number(49.99)),
            sale_price: Some(Numeric::Number(0.0)),
            category: Some("Dev".to_string()),
            rating: Some(Numeric::Number(4.5)),
            lectures: Some(Numeric::Number(10.0)),
            ..Default::default()
        };
        let store = FakeCursorStore::at(Cursor::Position(0));
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(items),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        )
        .run_once()
        .await;

        assert!(matches!(
            report.outcome,
            CycleOutcome::Sent {
                position: 0,
                variant: DeliveryVariant::Text,
                ..
            }
        ));
        let calls = delivery.calls();
        assert_eq!(calls.len(), 1);
        let Call::Text { text } = &calls[0] else {
            panic!("expected text delivery");
        };
        let struck = crate::usecases::render::strikethrough("$49.99");
        assert!(text.contains(&format!("{} → FREE", struck)));
        assert_eq!(store.current(), Cursor::Position(1));
    }

    #[tokio::test]
    async fn test_item_with_image_uses_media_variant() {
        let mut items = catalog(1);
        items[0].image = Some("https://img.example/0.jpg".to_string());
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(items),
            FakeCursorStore::at(Cursor::Position(0)),
            Arc::clone(&delivery),
            config(),
        )
        .run_once()
        .await;

        assert!(matches!(
            report.outcome,
            CycleOutcome::Sent {
                variant: DeliveryVariant::Media,
                ..
            }
        ));
        assert!(matches!(
            &delivery.calls()[0],
            Call::Media { media, caption }
                if media == "https://img.example/0.jpg" && caption.contains("Course 0")
        ));
    }

    #[tokio::test]
    async fn test_empty_catalog_is_noop() {
        let store = FakeCursorStore::at(Cursor::Position(0));
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(vec![]),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        )
        .run_once()
        .await;

        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped {
                reason: SkipReason::EmptyCatalog
            }
        );
        assert!(delivery.calls().is_empty());
        assert!(store.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cursor_beyond_catalog_is_noop() {
        let store = FakeCursorStore::at(Cursor::Position(5));
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(catalog(3)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        )
        .run_once()
        .await;

        assert!(matches!(
            report.outcome,
            CycleOutcome::Skipped {
                reason: SkipReason::CaughtUp { .. }
            }
        ));
        assert!(delivery.calls().is_empty());
        assert_eq!(store.current(), Cursor::Position(5));
    }

    #[tokio::test]
    async fn test_missing_destination_skips_before_loading() {
        let store = FakeCursorStore::at(Cursor::Position(0));
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(catalog(3)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            DispatchConfig {
                destination: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .run_once()
        .await;

        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped {
                reason: SkipReason::NoDestination
            }
        );
        assert!(report.destination.is_none());
        assert!(delivery.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_keeps_cursor_and_retries_same_item() {
        let store = FakeCursorStore::at(Cursor::Position(1));
        let delivery = FakeDelivery::failing();
        let dispatcher = cycle(
            FakeCatalog::with_items(catalog(3)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        );

        let first = dispatcher.run_once().await;
        assert!(matches!(
            first.outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Deliver,
                ..
            }
        ));
        assert_eq!(store.current(), Cursor::Position(1));

        delivery.set_failing(false);
        let second = dispatcher.run_once().await;
        assert!(matches!(
            second.outcome,
            CycleOutcome::Sent { position: 1, .. }
        ));

        let calls = delivery.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], calls[1]);
        assert_eq!(store.current(), Cursor::Position(2));
    }

    #[tokio::test]
    async fn test_progress_walks_backlog_in_order() {
        let store = FakeCursorStore::at(Cursor::Position(0));
        let delivery = FakeDelivery::new();
        let dispatcher = cycle(
            FakeCatalog::with_items(catalog(3)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        );

        for expected in 0..3 {
            let report = dispatcher.run_once().await;
            assert!(matches!(
                report.outcome,
                CycleOutcome::Sent { position, .. } if position == expected
            ));
        }

        let last = dispatcher.run_once().await;
        assert!(matches!(
            last.outcome,
            CycleOutcome::Skipped {
                reason: SkipReason::CaughtUp { .. }
            }
        ));
        assert_eq!(
            *store.saves.lock().unwrap(),
            vec![
                Cursor::Position(1),
                Cursor::Position(2),
                Cursor::Position(3)
            ]
        );
    }

    #[tokio::test]
    async fn test_cursor_never_decreases_across_mixed_cycles() {
        let store = FakeCursorStore::at(Cursor::Position(0));
        let delivery = FakeDelivery::new();
        let dispatcher = cycle(
            FakeCatalog::with_items(catalog(4)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        );

        let mut observed = vec![store.current()];
        for fail in [false, true, false, true, true, false, false, false] {
            delivery.set_failing(fail);
            dispatcher.run_once().await;
            observed.push(store.current());
        }

        for pair in observed.windows(2) {
            assert!(!pair[1].regresses_from(&pair[0]), "{:?}", pair);
        }
        assert_eq!(store.current(), Cursor::Position(4));
    }

    #[tokio::test]
    async fn test_save_failure_reports_advance_stage() {
        let store = Arc::new(FakeCursorStore {
            scheme: CursorScheme::Position,
            cursor: Mutex::new(Some(Cursor::Position(0))),
            saves: Mutex::new(vec![]),
            fail_save: true,
        });
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(catalog(2)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        )
        .run_once()
        .await;

        assert!(matches!(
            report.outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Advance,
                ..
            }
        ));
        assert_eq!(delivery.calls().len(), 1);
        assert_eq!(store.current(), Cursor::Position(0));
    }

    #[tokio::test]
    async fn test_broken_catalog_fails_select_without_delivery() {
        let delivery = FakeDelivery::new();
        let report = cycle(
            Arc::new(FakeCatalog {
                items: vec![],
                broken: true,
            }),
            FakeCursorStore::at(Cursor::Position(0)),
            Arc::clone(&delivery),
            config(),
        )
        .run_once()
        .await;

        assert!(matches!(
            report.outcome,
            CycleOutcome::Failed {
                stage: CycleStage::Select,
                ..
            }
        ));
        assert!(delivery.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dry_run_renders_without_side_effects() {
        let store = FakeCursorStore::at(Cursor::Position(2));
        let delivery = FakeDelivery::new();

        let report = cycle(
            FakeCatalog::with_items(catalog(3)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            DispatchConfig {
                dry_run: true,
                ..config()
            },
        )
        .run_once()
        .await;

        match report.outcome {
            CycleOutcome::Skipped {
                reason: SkipReason::DryRun { position, text },
            } => {
                assert_eq!(position, 2);
                assert!(text.contains("Course 2"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(delivery.calls().is_empty());
        assert!(store.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_head_watch_announces_new_head_once() {
        let store = FakeCursorStore::at(Cursor::LastSent(None));
        let delivery = FakeDelivery::new();
        let dispatcher = cycle(
            FakeCatalog::with_items(catalog(3)),
            Arc::clone(&store),
            Arc::clone(&delivery),
            config(),
        );

        let first = dispatcher.run_once().await;
        assert!(matches!(
            first.outcome,
            CycleOutcome::Sent { position: 0, .. }
        ));
        assert_eq!(
            store.current(),
            Cursor::LastSent(Some("https://example.com/course/0".to_string()))
        );

        let second = dispatcher.run_once().await;
        assert!(matches!(
            second.outcome,
            CycleOutcome::Skipped {
                reason: SkipReason::CaughtUp { .. }
            }
        ));
        assert_eq!(delivery.calls().len(), 1);
    }
}
