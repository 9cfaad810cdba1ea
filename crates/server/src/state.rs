//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use lettre::transport::smtp::Error as SmtpError;
use moka::future::Cache;
use sqlx::PgPool;

use udyog_core::DomainId;

use crate::claude::{ClaudeClient, ClaudeError};
use crate::config::ServerConfig;
use crate::db::{DomainRepository, RepositoryError};
use crate::identity::ClerkClient;
use crate::models::WidgetConfig;
use crate::realtime::RealtimeHub;
use crate::services::{AssistantService, ConversationService, EmailService, PortalLinks};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Claude client: {0}")]
    Claude(#[from] ClaudeError),
    #[error("SMTP transport: {0}")]
    Smtp(#[from] SmtpError),
}

/// The assistant wired to its production collaborators.
pub type Assistant<'a> =
    AssistantService<'a, PgPool, ClaudeClient, RealtimeHub, EmailService, ClerkClient>;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    pool: PgPool,
    claude: ClaudeClient,
    clerk: ClerkClient,
    email: EmailService,
    realtime: RealtimeHub,
    links: PortalLinks,
    /// Widget configuration per domain; `None` caches a missing domain.
    widget_cache: Cache<DomainId, Option<Arc<WidgetConfig>>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the Claude client or SMTP transport cannot be
    /// built from the configuration.
    pub fn new(config: ServerConfig, pool: PgPool) -> Result<Self, StateError> {
        let claude = ClaudeClient::new(&config.claude)?;
        let clerk = ClerkClient::new(&config.clerk);
        let origin = config.app_origin();
        let email = EmailService::new(&config.email, format!("{origin}/dashboard"))?;
        let links = PortalLinks::new(origin);

        let widget_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                claude,
                clerk,
                email,
                realtime: RealtimeHub::new(),
                links,
                widget_cache,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn clerk(&self) -> &ClerkClient {
        &self.inner.clerk
    }

    #[must_use]
    pub fn realtime(&self) -> &RealtimeHub {
        &self.inner.realtime
    }

    /// The sales assistant for one widget message.
    #[must_use]
    pub fn assistant(&self) -> Assistant<'_> {
        AssistantService::new(
            &self.inner.pool,
            &self.inner.claude,
            &self.inner.realtime,
            &self.inner.email,
            &self.inner.clerk,
            &self.inner.links,
        )
    }

    /// Conversation access scoped to one operator.
    #[must_use]
    pub fn conversations<'a>(&'a self, operator_id: &'a str) -> ConversationService<'a> {
        ConversationService::new(&self.inner.pool, &self.inner.realtime, operator_id)
    }

    /// Widget configuration for a domain, cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the lookup fails; failures are
    /// not cached.
    pub async fn widget_config(
        &self,
        domain_id: DomainId,
    ) -> Result<Option<Arc<WidgetConfig>>, RepositoryError> {
        if let Some(cached) = self.inner.widget_cache.get(&domain_id).await {
            return Ok(cached);
        }

        let config = DomainRepository::new(&self.inner.pool)
            .widget_config(domain_id)
            .await?
            .map(Arc::new);
        self.inner
            .widget_cache
            .insert(domain_id, config.clone())
            .await;
        Ok(config)
    }
}
