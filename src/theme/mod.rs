//! Color theme resolution.
//!
//! A record's base color comes from, highest priority first:
//! 1. the record's own color text
//! 2. the entity metadata color of the record's option code, when the record
//!    has one and `records.color_option_field` is set
//! 3. otherwise the entity metadata default color
//! 4. [`ColorsConfig::default_entity`] when the one lookup finds nothing
//!
//! The base color is expanded into a tonal palette whose shades 2..=5 fill
//! the four bundle slots. Configured custom colors replace individual slots,
//! and the task kind finally forces the background.

pub mod color;
pub mod palette;

pub use color::{Hsv, Rgb};

use crate::config::{ColorsConfig, Config};
use crate::error::LookupFailure;
use crate::logging::NotificationChannel;
use crate::store::{ColorOption, RecordStore};
use crate::types::{StylingBundle, TaskKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-record inputs to color resolution.
#[derive(Debug, Clone, Copy)]
pub struct ThemeRequest<'a> {
    pub entity_type: &'a str,
    pub color_override: Option<&'a str>,
    pub option_code: Option<&'a str>,
    pub kind: TaskKind,
}

impl ThemeRequest<'_> {
    /// Requests without record-level signals share one bundle per entity type.
    fn is_shared(&self) -> bool {
        self.color_override.is_none() && self.option_code.is_none()
    }
}

/// Entity-level bundles resolved during one generation pass.
///
/// Holds bundles before the kind override, so leaves and projects of the same
/// entity type share an entry. Dropped at the end of the pass.
#[derive(Debug, Default)]
pub struct ThemeCache {
    by_entity: HashMap<String, StylingBundle>,
}

impl ThemeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}

/// Resolves styling bundles against the record store's metadata.
pub struct ColorThemeResolver {
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn NotificationChannel>,
    colors: ColorsConfig,
    option_field: Option<String>,
    default_base: Rgb,
}

impl ColorThemeResolver {
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn NotificationChannel>,
        config: &Config,
    ) -> Self {
        let default_base = Rgb::parse(&config.colors.default_entity).unwrap_or_else(|| {
            warn!(
                color = %config.colors.default_entity,
                "Unparsable default entity color; using {}",
                crate::config::DEFAULT_ENTITY_COLOR
            );
            Rgb::new(0x29, 0x75, 0xb2)
        });

        Self {
            store,
            notifier,
            colors: config.colors.clone(),
            option_field: config.records.color_option_field.clone(),
            default_base,
        }
    }

    /// Resolve the bundle for one record, consulting `cache` when the record
    /// carries no color override or option code.
    pub async fn resolve(&self, cache: &mut ThemeCache, request: ThemeRequest<'_>) -> StylingBundle {
        let bundle = if request.is_shared() {
            match cache.by_entity.get(request.entity_type) {
                Some(bundle) => bundle.clone(),
                None => {
                    let bundle = self.ramp(self.base_color(&request).await);
                    cache
                        .by_entity
                        .insert(request.entity_type.to_string(), bundle.clone());
                    bundle
                }
            }
        } else {
            self.ramp(self.base_color(&request).await)
        };

        self.apply_kind(bundle, request.kind)
    }

    /// Pick the base color by precedence.
    pub async fn base_color(&self, request: &ThemeRequest<'_>) -> Rgb {
        if let Some(text) = request.color_override {
            return match Rgb::parse(text) {
                Some(rgb) => rgb,
                None => {
                    warn!(color = %text, entity_type = %request.entity_type, "Unparsable color override");
                    self.default_base
                }
            };
        }

        let option = match (request.option_code, self.option_field.as_deref()) {
            (Some(code), Some(field)) => Some(ColorOption::new(field, code)),
            _ => None,
        };

        // At most one fetch per record: an option lookup does not fall back to
        // the entity color.
        match self.lookup(request.entity_type, option.as_ref()).await {
            Some(rgb) => rgb,
            None => {
                if let Some(option) = &option {
                    debug!(entity_type = %request.entity_type, option = %option.value, "No option color; using default");
                }
                self.default_base
            }
        }
    }

    /// One metadata fetch. Failures are reported and yield `None`.
    async fn lookup(&self, entity_type: &str, option: Option<&ColorOption>) -> Option<Rgb> {
        match self.store.fetch_entity_color(entity_type, option).await {
            Ok(Some(text)) => {
                let parsed = Rgb::parse(&text);
                if parsed.is_none() {
                    warn!(entity_type = %entity_type, color = %text, "Unparsable metadata color");
                }
                parsed
            }
            Ok(None) => None,
            Err(e) => {
                self.notifier
                    .report_error(&LookupFailure::metadata(entity_type, e));
                None
            }
        }
    }

    /// Palette shades 2..=5 with custom colors applied.
    pub fn ramp(&self, base: Rgb) -> StylingBundle {
        let shades = palette::generate(base);
        let custom = &self.colors.custom;
        let pick = |custom: &Option<String>, shade: Rgb| {
            custom
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| shade.to_hex())
        };

        StylingBundle {
            background_color: pick(&custom.background, shades[2]),
            background_selected_color: pick(&custom.background_selected, shades[3]),
            progress_color: pick(&custom.progress, shades[4]),
            progress_selected_color: pick(&custom.progress_selected, shades[5]),
        }
    }

    /// Force the background by task kind; progress colors are untouched.
    pub fn apply_kind(&self, mut bundle: StylingBundle, kind: TaskKind) -> StylingBundle {
        bundle.background_color = match kind {
            TaskKind::Project => self.colors.project_background.clone(),
            TaskKind::Leaf => self.colors.task_background.clone(),
        };
        bundle
    }
}
