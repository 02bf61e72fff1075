//! # Application
//!
//! [`App`] owns everything that lives as long as the process: the
//! configuration, the collaborators, the DI container, the callbacks and the
//! registries. It is built once and shared by reference; registration methods
//! take `&self`, so an `App` behind an `Arc` can still be extended.
//!
//! # Example
//!
//! ```rust,ignore
//! let app = App::builder()
//!     .config(Config { debug: true, ..Config::default() })
//!     .build()?;
//!
//! app.register_class("Sample", &json!(null))?;
//! app.register_directory("src/ajax", &json!({"functions": {"*": {"__before": "check"}}}))?;
//!
//! let output = app.handle(&request)?;
//! ```

use crate::{
    callbacks::CallbackManager,
    catalog::ClassCatalog,
    config::Config,
    container::Container,
    decoder::{ArgumentDecoder, Transcoder},
    export::ClientExport,
    handler::{HandleError, HandlerOutput, RequestHandler},
    plugin::{
        CLASS_PRIORITY, ClassPlugin, FUNCTION_PRIORITY, FunctionPlugin, FunctionRegistry,
        PluginRegistry, RequestPlugin, UploadPlugin,
    },
    registry::CallableRegistry,
    services::{EnglishTranslator, TracingLogger},
};
use domwire_core::{
    Args, Callable, ConfigError, Context, Error, IntoCallResult, Logger, NullSession, NullView,
    Request, Services, SessionStore, SetupError, Translator, UploadManager, ViewRenderer,
};
use serde_json::Value;
use std::{path::PathBuf, sync::Arc};
use tracing::info;

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`App`].
#[derive(Default)]
pub struct AppBuilder {
    config: Config,
    logger: Option<Arc<dyn Logger>>,
    view: Option<Arc<dyn ViewRenderer>>,
    session: Option<Arc<dyn SessionStore>>,
    translator: Option<Arc<dyn Translator>>,
    upload_manager: Option<Arc<dyn UploadManager>>,
    transcoders: Vec<Arc<dyn Transcoder>>,
    catalog: Option<ClassCatalog>,
}

impl std::fmt::Debug for AppBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppBuilder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set the log sink. Defaults to [`TracingLogger`].
    pub fn logger(mut self, logger: impl Logger + 'static) -> Self {
        self.logger = Some(Arc::new(logger));
        self
    }

    /// Set the template renderer.
    pub fn view(mut self, view: impl ViewRenderer + 'static) -> Self {
        self.view = Some(Arc::new(view));
        self
    }

    /// Set the session store.
    pub fn session(mut self, session: impl SessionStore + 'static) -> Self {
        self.session = Some(Arc::new(session));
        self
    }

    /// Set the translator. Defaults to [`EnglishTranslator`].
    pub fn translator(mut self, translator: impl Translator + 'static) -> Self {
        self.translator = Some(Arc::new(translator));
        self
    }

    /// Set the upload manager, required when uploads are enabled.
    pub fn upload_manager(mut self, manager: impl UploadManager + 'static) -> Self {
        self.upload_manager = Some(Arc::new(manager));
        self
    }

    /// Add a transcoder, tried before the built-in ones.
    ///
    /// Transcoders added later are tried first.
    pub fn transcoder(mut self, transcoder: impl Transcoder + 'static) -> Self {
        self.transcoders.push(Arc::new(transcoder));
        self
    }

    /// Use `catalog` instead of the classes collected with `inventory`.
    pub fn catalog(mut self, catalog: ClassCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Build the application.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, if uploads are enabled without
    /// an upload manager, or if re-encoding is enabled for an encoding no
    /// transcoder supports.
    pub fn build(self) -> Result<App, Error> {
        let config = self.config;
        config.validate()?;

        let upload = match (config.upload_enabled, self.upload_manager) {
            (true, Some(manager)) => Some(UploadPlugin::new(manager)),
            (true, None) => return Err(ConfigError::MissingUploadManager.into()),
            (false, _) => None,
        };

        let mut decoder = ArgumentDecoder::from_config(&config);
        for transcoder in self.transcoders {
            decoder = decoder.with_transcoder(transcoder);
        }
        if decoder.decodes_utf8() {
            decoder.transcoder()?;
        }

        let services = Services {
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            view: self.view.unwrap_or_else(|| Arc::new(NullView)),
            session: self.session.unwrap_or_else(|| Arc::new(NullSession)),
            translator: self
                .translator
                .unwrap_or_else(|| Arc::new(EnglishTranslator::new())),
        };

        let registry = Arc::new(CallableRegistry::new(
            self.catalog.unwrap_or_else(ClassCatalog::collected),
        ));
        registry.set_separator(config.separator);
        let functions = Arc::new(FunctionRegistry::new());

        let plugins = PluginRegistry::new();
        plugins.register(
            "function",
            FUNCTION_PRIORITY,
            FunctionPlugin::new(functions.clone()),
        )?;
        plugins.register("class", CLASS_PRIORITY, ClassPlugin::new(registry.clone()))?;

        info!(
            debug = config.debug,
            uploads = upload.is_some(),
            classes = registry.catalog().len(),
            "app built"
        );
        Ok(App {
            config,
            services,
            decoder,
            container: Container::new(),
            callbacks: CallbackManager::new(),
            plugins,
            upload,
            registry,
            functions,
        })
    }
}

// ============================================================================
// App
// ============================================================================

/// A configured application.
#[derive(Debug)]
pub struct App {
    config: Config,
    services: Services,
    decoder: ArgumentDecoder,
    container: Container,
    callbacks: CallbackManager,
    plugins: PluginRegistry,
    upload: Option<UploadPlugin>,
    registry: Arc<CallableRegistry>,
    functions: Arc<FunctionRegistry>,
}

impl App {
    /// Start building an application.
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// The configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The collaborators.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// The argument decoder.
    pub fn decoder(&self) -> &ArgumentDecoder {
        &self.decoder
    }

    /// The DI container.
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// The lifecycle callbacks.
    pub fn callbacks(&self) -> &CallbackManager {
        &self.callbacks
    }

    /// The request plugins.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// The upload plugin, when uploads are enabled.
    pub fn upload(&self) -> Option<&UploadPlugin> {
        self.upload.as_ref()
    }

    /// The callable class registry.
    pub fn registry(&self) -> &CallableRegistry {
        &self.registry
    }

    /// The registered functions.
    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a class by canonical name (`App::Admin::Users`).
    pub fn register_class(&self, name: &str, options: &Value) -> Result<(), SetupError> {
        self.registry.register_class(name, options)
    }

    /// Add `T` to the catalog and register it under its class name.
    pub fn add_class<T: Callable>(&self, options: &Value) -> Result<(), SetupError> {
        self.registry.catalog().add::<T>();
        self.registry.register_class(T::class_name(), options)
    }

    /// Register every class under `namespace`, optionally backed by a directory.
    pub fn register_namespace(
        &self,
        namespace: &str,
        directory: Option<impl Into<PathBuf>>,
        options: &Value,
    ) -> Result<(), SetupError> {
        self.registry
            .register_namespace(namespace, directory.map(Into::into), options)
    }

    /// Register a directory of classes without namespace.
    pub fn register_directory(
        &self,
        directory: impl Into<PathBuf>,
        options: &Value,
    ) -> Result<(), SetupError> {
        self.registry.register_directory(directory, options)
    }

    /// Register a function.
    pub fn register_function<F, R>(&self, name: &str, function: F, options: &Value) -> Result<(), SetupError>
    where
        F: Fn(&Context, Args) -> R + Send + Sync + 'static,
        R: IntoCallResult,
    {
        self.functions.register(name, function, options)
    }

    /// Register a request plugin.
    pub fn register_plugin<P>(&self, name: &str, priority: i32, plugin: P) -> Result<(), SetupError>
    where
        P: RequestPlugin + 'static,
    {
        self.plugins.register(name, priority, plugin)
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Returns `true` if `request` is a call some plugin claims.
    pub fn can_process_request(&self, request: &Request) -> bool {
        self.decoder
            .decode(request)
            .is_ok_and(|call| self.plugins.find(&call).is_some())
    }

    /// Handle `request`.
    ///
    /// A failure no callback handled is returned together with the response
    /// built so far.
    pub fn handle(&self, request: &Request) -> Result<HandlerOutput, HandleError> {
        RequestHandler::new(self).handle(request)
    }

    /// Describe the functions and classes exposed to the client.
    pub fn export(&self) -> Result<ClientExport, SetupError> {
        ClientExport::collect(&self.registry, &self.functions)
    }
}
