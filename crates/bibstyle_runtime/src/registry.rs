//! The registry of compiled styles.
//!
//! A style is the default data model, optionally followed by a named
//! overlay template, with the configured directives applied on top.
//! Compiled styles are cached and shared as `Arc<Style>`. The active style
//! is published by swapping the `Arc`, so readers never see a style that is
//! still being built.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

use bibstyle_directives::{DirectiveInterpreter, StyleConfig};
use bibstyle_foundation::{Diagnostics, Error, LintSelection, Outcome, Result};
use bibstyle_language::Template;
use bibstyle_schema::{CompileOptions, ProtoStyle, Style};
use bibstyle_stdlib::{DEFAULT_STYLE_NAME, default_template};
use tracing::{debug, info};

/// Compiles, caches and publishes styles.
#[derive(Debug)]
pub struct StyleRegistry {
    default_template: Arc<Template>,
    overlays: BTreeMap<String, Arc<Template>>,
    config: StyleConfig,
    options: CompileOptions,
    interpreter: DirectiveInterpreter,
    cache: RwLock<BTreeMap<String, (Arc<Style>, Diagnostics)>>,
    active: RwLock<Arc<Style>>,
}

impl StyleRegistry {
    /// Creates a registry over `default_template` with the default style active.
    #[must_use]
    pub fn new(default_template: Template) -> Outcome<Self> {
        let default_template = Arc::new(default_template);
        let options = CompileOptions::default();
        let proto = ProtoStyle::aggregate([default_template.as_ref()]);
        let (style, diagnostics) = Style::compile(DEFAULT_STYLE_NAME, &proto, &options).into_parts();
        let style = Arc::new(style);

        let mut cache = BTreeMap::new();
        cache.insert(DEFAULT_STYLE_NAME.to_string(), (Arc::clone(&style), diagnostics.clone()));

        let registry = Self {
            default_template,
            overlays: BTreeMap::new(),
            config: StyleConfig::new(),
            options,
            interpreter: DirectiveInterpreter::new(),
            cache: RwLock::new(cache),
            active: RwLock::new(style),
        };
        Outcome::new(registry, diagnostics)
    }

    /// Creates a registry over the built-in default data model.
    #[must_use]
    pub fn with_builtin_default() -> Outcome<Self> {
        let mut diagnostics = Diagnostics::new();
        let template = default_template().collect_into(&mut diagnostics);
        let registry = Self::new(template).collect_into(&mut diagnostics);
        Outcome::new(registry, diagnostics)
    }

    /// Replaces the compiler settings.
    #[must_use]
    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self.invalidate();
        self
    }

    /// Replaces the directive interpreter settings.
    #[must_use]
    pub fn with_interpreter(mut self, interpreter: DirectiveInterpreter) -> Self {
        self.interpreter = interpreter;
        self.invalidate();
        self
    }

    /// Registers an overlay template under `name`, replacing any earlier one.
    pub fn add_overlay(&mut self, name: impl Into<String>, template: Template) {
        let name = name.into();
        self.cache_mut().remove(&name);
        debug!(style = %name, "registered overlay");
        self.overlays.insert(name, Arc::new(template));
    }

    /// Installs user configuration. Every cached style is dropped.
    pub fn set_config(&mut self, config: StyleConfig) {
        self.config = config;
        self.invalidate();
    }

    /// The installed configuration.
    #[must_use]
    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Every style name the registry can compile.
    #[must_use]
    pub fn style_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::from([DEFAULT_STYLE_NAME.to_string()]);
        names.extend(self.overlays.keys().cloned());
        names.extend(self.config.style_names().map(str::to_string));
        names
    }

    /// Returns true if `name` is the default style, has an overlay, or has configuration.
    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        name == DEFAULT_STYLE_NAME || self.overlays.contains_key(name) || self.config.style(name).is_some()
    }

    /// The lint selection configured for `name`.
    #[must_use]
    pub fn lints_for(&self, name: &str) -> LintSelection {
        self.config.lints_for(name)
    }

    /// Compiles a style from scratch, bypassing the cache.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStyle` if the registry does not know `name`.
    pub fn compile(&self, name: &str) -> Result<Outcome<Style>> {
        if !self.knows(name) {
            return Err(Error::unknown_style(name));
        }
        let mut templates = vec![self.default_template.as_ref()];
        if let Some(overlay) = self.overlays.get(name) {
            templates.push(overlay.as_ref());
        }
        let mut proto = ProtoStyle::aggregate(templates);
        let mut diagnostics = self.interpreter.apply_all(&mut proto, self.config.directives_for(name));
        let style = Style::compile(name, &proto, &self.options).collect_into(&mut diagnostics);
        debug!(style = name, diagnostics = diagnostics.len(), "compiled style");
        Ok(Outcome::new(style, diagnostics))
    }

    /// Returns the compiled style for `name`, compiling it on first use.
    ///
    /// The diagnostics are those of the original compilation.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStyle` if the registry does not know `name`.
    pub fn style(&self, name: &str) -> Result<Outcome<Arc<Style>>> {
        if let Some((style, diagnostics)) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return Ok(Outcome::new(Arc::clone(style), diagnostics.clone()));
        }

        let (style, diagnostics) = self.compile(name)?.into_parts();
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have compiled it meanwhile; keep the first.
        let (style, diagnostics) = cache
            .entry(name.to_string())
            .or_insert_with(|| (Arc::new(style), diagnostics));
        Ok(Outcome::new(Arc::clone(style), diagnostics.clone()))
    }

    /// Makes `name` the active style and returns it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownStyle` if the registry does not know `name`; the
    /// active style is then left unchanged.
    pub fn activate(&self, name: &str) -> Result<Outcome<Arc<Style>>> {
        let outcome = self.style(name)?;
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Arc::clone(&outcome.value);
        info!(style = name, "activated style");
        Ok(outcome)
    }

    /// The currently active style.
    #[must_use]
    pub fn active(&self) -> Arc<Style> {
        Arc::clone(&*self.active.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn cache_mut(&mut self) -> &mut BTreeMap<String, (Arc<Style>, Diagnostics)> {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops every cached style. The active style stays published until the
    /// next `activate`.
    fn invalidate(&mut self) {
        self.cache_mut().clear();
    }
}
